//! Loopback allow-list for CLI callback URLs.

use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

/// Report whether `raw_callback_url` is an allowed local HTTP callback URL.
///
/// The CLI's loopback receiver is unauthenticated; accepting an arbitrary
/// host here would let a forged initiation request redirect a freshly
/// minted exchange code to a remote endpoint. Only `http` URLs pointing at
/// `localhost`, `127.0.0.1`, or `::1` are accepted, and anything that fails
/// to parse is rejected.
pub fn is_allowed_cli_callback(raw_callback_url: &str) -> bool {
    let Ok(parsed) = Url::parse(raw_callback_url) else {
        return false;
    };

    if parsed.scheme() != "http" {
        return false;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr == Ipv4Addr::LOCALHOST,
        Some(Host::Ipv6(addr)) => addr == Ipv6Addr::LOCALHOST,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_loopback_hosts() {
        assert!(is_allowed_cli_callback("http://localhost/cb"));
        assert!(is_allowed_cli_callback("http://localhost:3000/cb"));
        assert!(is_allowed_cli_callback("http://127.0.0.1:9999/cb"));
        assert!(is_allowed_cli_callback("http://[::1]:8080/oauth/google/callback"));
    }

    #[test]
    fn hostname_match_is_case_insensitive() {
        assert!(is_allowed_cli_callback("http://LOCALHOST:8000/cb"));
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(!is_allowed_cli_callback("https://localhost/cb"));
        assert!(!is_allowed_cli_callback("ftp://localhost/cb"));
        assert!(!is_allowed_cli_callback("file:///etc/passwd"));
    }

    #[test]
    fn rejects_non_loopback_hosts() {
        assert!(!is_allowed_cli_callback("http://example.com/cb"));
        assert!(!is_allowed_cli_callback("http://127.0.0.2/cb"));
        assert!(!is_allowed_cli_callback("http://192.168.1.10:8080/cb"));
        assert!(!is_allowed_cli_callback("http://[::2]/cb"));
        assert!(!is_allowed_cli_callback("http://localhost.evil.com/cb"));
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(!is_allowed_cli_callback(""));
        assert!(!is_allowed_cli_callback("not a url"));
        assert!(!is_allowed_cli_callback("http://"));
    }
}

//! Cookie-carried CLI authorization context.
//!
//! The provider redirect leaves our origin and comes back later, so the
//! CLI's callback URL and state have to survive that round trip somewhere
//! the browser will carry them. Two short-lived HttpOnly cookies do the
//! job: written at initiation, read exactly once at provider-callback
//! completion, and expired on every terminal path after that.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;

use super::guard::is_allowed_cli_callback;

/// Cookie holding the URL-escaped CLI callback URL.
pub const CLI_CALLBACK_COOKIE: &str = "envlink_cli_callback";

/// Cookie holding the CLI state token.
pub const CLI_STATE_COOKIE: &str = "envlink_cli_state";

/// Cookie holding the provider CSRF state across the external redirect.
pub const PROVIDER_STATE_COOKIE: &str = "envlink_oauth_state";

/// Lifetime of the context cookies. Long enough for a human to finish a
/// provider consent screen, short enough not to linger.
const CONTEXT_COOKIE_TTL: Duration = Duration::seconds(300);

fn context_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .max_age(max_age)
        .build()
}

/// Persist the CLI callback URL and state across the provider redirect.
///
/// The callback value is URL-escaped before being stored.
pub fn write_cli_auth_context(jar: CookieJar, callback_url: &str, state: &str) -> CookieJar {
    jar.add(context_cookie(
        CLI_CALLBACK_COOKIE,
        urlencoding::encode(callback_url).into_owned(),
        CONTEXT_COOKIE_TTL,
    ))
    .add(context_cookie(
        CLI_STATE_COOKIE,
        state.to_string(),
        CONTEXT_COOKIE_TTL,
    ))
}

/// Recover the CLI callback URL and state from the request cookies.
///
/// Returns `None` when either cookie is missing or the decoded callback no
/// longer passes the loopback allow-list; the caller then treats the flow
/// as a plain browser login.
pub fn read_cli_auth_context(jar: &CookieJar) -> Option<(String, String)> {
    let callback_cookie = jar.get(CLI_CALLBACK_COOKIE)?;
    let state = jar.get(CLI_STATE_COOKIE)?.value().to_string();

    let decoded = urlencoding::decode(callback_cookie.value()).ok()?.into_owned();
    if !is_allowed_cli_callback(&decoded) {
        return None;
    }

    Some((decoded, state))
}

/// Expire the CLI context cookies.
pub fn clear_cli_auth_context(jar: CookieJar) -> CookieJar {
    jar.add(context_cookie(CLI_CALLBACK_COOKIE, String::new(), Duration::ZERO))
        .add(context_cookie(CLI_STATE_COOKIE, String::new(), Duration::ZERO))
}

/// Persist the provider CSRF state across the external redirect.
pub fn write_provider_state(jar: CookieJar, state: &str) -> CookieJar {
    jar.add(context_cookie(
        PROVIDER_STATE_COOKIE,
        state.to_string(),
        CONTEXT_COOKIE_TTL,
    ))
}

/// Read the provider CSRF state from the request cookies.
pub fn read_provider_state(jar: &CookieJar) -> Option<String> {
    jar.get(PROVIDER_STATE_COOKIE).map(|c| c.value().to_string())
}

/// Expire the provider CSRF state cookie.
pub fn clear_provider_state(jar: CookieJar) -> CookieJar {
    jar.add(context_cookie(PROVIDER_STATE_COOKIE, String::new(), Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_round_trips_through_the_jar() {
        let callback = "http://127.0.0.1:54001/oauth/google/callback?x=1";
        let jar = write_cli_auth_context(CookieJar::new(), callback, "state-1");

        let (read_callback, read_state) = read_cli_auth_context(&jar).unwrap();
        assert_eq!(read_callback, callback);
        assert_eq!(read_state, "state-1");
    }

    #[test]
    fn callback_cookie_value_is_escaped() {
        let jar = write_cli_auth_context(
            CookieJar::new(),
            "http://localhost:9/cb?a=b&c=d",
            "s",
        );

        let raw = jar.get(CLI_CALLBACK_COOKIE).unwrap().value().to_string();
        assert!(!raw.contains('&'));
        assert!(!raw.contains('?'));
    }

    #[test]
    fn missing_cookie_yields_no_context() {
        assert!(read_cli_auth_context(&CookieJar::new()).is_none());

        let only_state =
            CookieJar::new().add(context_cookie(CLI_STATE_COOKIE, "s".into(), Duration::seconds(300)));
        assert!(read_cli_auth_context(&only_state).is_none());
    }

    #[test]
    fn non_loopback_callback_yields_no_context() {
        let jar = write_cli_auth_context(CookieJar::new(), "https://evil.example/cb", "s");
        assert!(read_cli_auth_context(&jar).is_none());
    }

    #[test]
    fn clear_expires_both_cookies() {
        let jar = write_cli_auth_context(CookieJar::new(), "http://localhost/cb", "s");
        let jar = clear_cli_auth_context(jar);

        for name in [CLI_CALLBACK_COOKIE, CLI_STATE_COOKIE] {
            let cookie = jar.get(name).unwrap();
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert!(cookie.value().is_empty());
        }
    }

    #[test]
    fn cookies_are_http_only_and_site_wide() {
        let jar = write_cli_auth_context(CookieJar::new(), "http://localhost/cb", "s");
        let cookie = jar.get(CLI_CALLBACK_COOKIE).unwrap();

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(300)));
    }

    #[test]
    fn provider_state_round_trips() {
        let jar = write_provider_state(CookieJar::new(), "csrf-1");
        assert_eq!(read_provider_state(&jar).as_deref(), Some("csrf-1"));

        let jar = clear_provider_state(jar);
        assert!(jar.get(PROVIDER_STATE_COOKIE).unwrap().value().is_empty());
    }
}

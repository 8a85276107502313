//! Server configuration.

use serde::{Deserialize, Serialize};

/// Server configuration.
///
/// Loaded from the environment; a `.env` file in the working directory is
/// honored when present (loaded by the binary before this runs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public domain the server is reachable under, if deployed behind one.
    /// Empty means local development and an http callback URL.
    #[serde(default)]
    pub public_domain: Option<String>,

    /// Google OAuth client id.
    pub google_client_id: String,

    /// Google OAuth client secret.
    pub google_client_secret: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl ServerConfig {
    /// Load the configuration from environment variables.
    ///
    /// `GOOGLE_CLIENT_ID` and `GOOGLE_CLIENT_SECRET` are required; `PORT`
    /// and `PUBLIC_DOMAIN` are optional.
    pub fn from_env() -> anyhow::Result<Self> {
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("GOOGLE_CLIENT_ID was not provided"))?;
        let google_client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("GOOGLE_CLIENT_SECRET was not provided"))?;

        let listen_addr = match std::env::var("PORT") {
            Ok(port) => format!("0.0.0.0:{port}"),
            Err(_) => default_listen_addr(),
        };

        let public_domain = std::env::var("PUBLIC_DOMAIN").ok().filter(|d| !d.is_empty());

        Ok(Self {
            listen_addr,
            public_domain,
            google_client_id,
            google_client_secret,
        })
    }

    /// Port component of the listen address.
    pub fn port(&self) -> u16 {
        self.listen_addr
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080)
    }

    /// Base URL browsers reach this server under.
    ///
    /// Behind a public domain the provider redirect must be https; locally
    /// it is plain http on the configured port.
    pub fn external_base_url(&self) -> String {
        match &self.public_domain {
            Some(domain) => format!("https://{domain}"),
            None => format!("http://localhost:{}", self.port()),
        }
    }

    /// Redirect URL registered with the identity provider for `provider`.
    pub fn provider_callback_url(&self, provider: &str) -> String {
        format!(
            "{}{}/auth/{provider}/callback",
            self.external_base_url(),
            envlink_common::protocol::API_BASE_PATH
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            public_domain: None,
            google_client_id: "id".to_string(),
            google_client_secret: "secret".to_string(),
        }
    }

    #[test]
    fn local_callback_url_uses_http_and_port() {
        let config = test_config();
        assert_eq!(
            config.provider_callback_url("google"),
            "http://localhost:8080/api/v1/auth/google/callback"
        );
    }

    #[test]
    fn public_callback_url_uses_https_domain() {
        let config = ServerConfig {
            public_domain: Some("envlink.example.com".to_string()),
            ..test_config()
        };
        assert_eq!(
            config.provider_callback_url("google"),
            "https://envlink.example.com/api/v1/auth/google/callback"
        );
    }
}

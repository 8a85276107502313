//! Identity provider integration.
//!
//! The provider protocol itself is delegated to the `oauth2` crate; this
//! module only owns the seam the handlers talk to: build an authorize URL
//! for the browser redirect, and turn a returned authorization code into
//! an access token plus a minimal identity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const USERINFO_TIMEOUT: Duration = Duration::from_secs(15);

/// What a completed provider handshake yields.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    /// Opaque access token; handed to the CLI through exactly one exchange.
    pub access_token: String,
    /// Display name, if the provider shared one.
    pub name: String,
    /// Email address, if the provider shared one.
    pub email: String,
}

/// One registered identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Name the provider is routed under (e.g. "google").
    fn name(&self) -> &'static str;

    /// Authorize URL the browser is redirected to, carrying `state` as the
    /// provider-side CSRF token.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange the returned authorization code and fetch the identity.
    async fn complete_auth(&self, code: &str) -> AppResult<ProviderIdentity>;
}

/// Providers by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn AuthProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn AuthProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthProvider>> {
        self.providers.get(name).cloned()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Google OAuth provider.
pub struct GoogleProvider {
    oauth: BasicClient,
    http: reqwest::Client,
}

impl GoogleProvider {
    /// Build the provider from server configuration.
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let oauth = BasicClient::new(
            ClientId::new(config.google_client_id.clone()),
            Some(ClientSecret::new(config.google_client_secret.clone())),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                .map_err(|e| AppError::Internal(e.to_string()))?,
            Some(
                TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
                    .map_err(|e| AppError::Internal(e.to_string()))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.provider_callback_url("google"))
                .map_err(|e| AppError::Internal(e.to_string()))?,
        );

        let http = reqwest::Client::builder()
            .timeout(USERINFO_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self { oauth, http })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

#[async_trait]
impl AuthProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _csrf) = self
            .oauth
            .authorize_url(|| CsrfToken::new(state))
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        url.to_string()
    }

    async fn complete_auth(&self, code: &str) -> AppResult<ProviderIdentity> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AppError::Provider(format!("code exchange failed: {e}")))?;

        let access_token = token.access_token().secret().clone();

        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("userinfo request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Provider(format!("userinfo request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("userinfo response malformed: {e}")))?;

        Ok(ProviderIdentity {
            access_token,
            name: info.name,
            email: info.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> GoogleProvider {
        let config = ServerConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            public_domain: None,
            google_client_id: "client-id".to_string(),
            google_client_secret: "client-secret".to_string(),
        };
        GoogleProvider::from_config(&config).unwrap()
    }

    #[test]
    fn authorize_url_carries_state_and_redirect() {
        let provider = test_provider();
        let url = url::Url::parse(&provider.authorize_url("csrf-token")).unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("state").map(AsRef::as_ref), Some("csrf-token"));
        assert_eq!(
            params.get("redirect_uri").map(AsRef::as_ref),
            Some("http://localhost:8080/api/v1/auth/google/callback")
        );
        assert_eq!(params.get("response_type").map(AsRef::as_ref), Some("code"));
    }

    #[test]
    fn registry_routes_by_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(test_provider()));

        assert!(registry.get("google").is_some());
        assert!(registry.get("github").is_none());
    }
}

//! Provider login and the CLI token handoff.
//!
//! A CLI that cannot host a stable redirect URI initiates the login here,
//! parking its loopback callback URL and state in short-lived cookies.
//! When the provider redirect comes back, the access token is parked in
//! the one-time exchange store and the browser is bounced to the CLI's
//! loopback receiver, which redeems the code through the exchange
//! endpoint.

pub mod context;
pub mod exchange;
pub mod guard;
mod handlers;
pub mod provider;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub use exchange::{EXCHANGE_TTL, PendingExchangeStore, new_exchange_code};
pub use guard::is_allowed_cli_callback;
pub use provider::{AuthProvider, GoogleProvider, ProviderIdentity, ProviderRegistry};

/// Create the auth routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/{provider}", get(handlers::get_auth_provider))
        .route("/auth/{provider}/callback", get(handlers::get_auth_callback))
        .route("/auth/{provider}/logout", get(handlers::get_logout_provider))
        .route("/auth/cli/exchange", post(handlers::post_cli_exchange))
}

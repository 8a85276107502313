//! Browser login flow for the envlink CLI.
//!
//! The CLI cannot host a stable redirect URI, so the browser-facing half
//! of the provider login lives on the envlink server. This crate drives
//! the client half of that handoff: it binds a loopback listener, sends
//! the browser to the server's initiation endpoint with the listener's
//! callback URL and a fresh state token, waits for the server to bounce
//! the browser back with a one-time exchange code, and redeems the code
//! for the provider token.
//!
//! Every attempt is one-shot: a timeout, a state mismatch, or a rejected
//! exchange all end the attempt, and a new one starts from fresh state.

mod browser;
pub mod error;
mod exchange;
mod server;

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::debug;
use url::Url;

use envlink_common::protocol::{CLI_CALLBACK_PARAM, CLI_STATE_PARAM};
use envlink_common::token::{TOKEN_BYTES, secure_hex_token};

pub use error::LoginError;
pub use server::CallbackResult;

/// How long the initiator waits for the browser callback.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Options for one login attempt.
#[derive(Debug, Clone)]
pub struct LoginOptions {
    /// Base URL of the envlink server, e.g. "http://localhost:8080".
    pub server_url: String,
    /// Provider to authenticate against, e.g. "google".
    pub provider: String,
    /// How long to wait for the browser callback.
    pub timeout: Duration,
}

impl LoginOptions {
    /// Options with the default callback timeout.
    pub fn new(server_url: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            provider: provider.into(),
            timeout: LOGIN_TIMEOUT,
        }
    }
}

/// Outcome of a completed login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// Access token obtained from the identity provider via the server.
    pub token: String,
}

/// Generate the random state identifying one login attempt.
pub fn new_session_state() -> String {
    secure_hex_token(TOKEN_BYTES)
}

/// Build the server initiation URL carrying the loopback callback and state.
pub fn build_initiation_url(
    server_url: &str,
    provider: &str,
    callback_url: &str,
    state: &str,
) -> Result<String, LoginError> {
    let base = format!(
        "{}/api/v1/auth/{provider}",
        server_url.trim_end_matches('/')
    );
    let mut url = Url::parse(&base)?;

    url.query_pairs_mut()
        .append_pair(CLI_CALLBACK_PARAM, callback_url)
        .append_pair(CLI_STATE_PARAM, state);

    Ok(url.to_string())
}

/// Run one complete login attempt.
///
/// Binds a loopback listener on an ephemeral port, opens the browser at
/// the server's initiation endpoint, waits for exactly one callback (or
/// the timeout), then redeems the delivered exchange code. The listener
/// is torn down on every exit path; an in-flight browser interaction is
/// left orphaned on timeout, which is the best we can do.
pub async fn run_login_flow(opts: LoginOptions) -> Result<LoginResult, LoginError> {
    let state = new_session_state();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let callback_path = format!("/oauth/{}/callback", opts.provider);
    let callback_url = format!("http://127.0.0.1:{port}{callback_path}");

    let initiation_url =
        build_initiation_url(&opts.server_url, &opts.provider, &callback_url, &state)?;

    let (result_tx, result_rx) = oneshot::channel();
    let app = server::callback_router(&callback_path, state.clone(), result_tx);

    let server_task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            debug!(error = %err, "loopback callback server exited");
        }
    });

    debug!(port, provider = %opts.provider, "loopback callback receiver started");

    if let Err(err) = browser::open_in_browser(&initiation_url) {
        server_task.abort();
        eprintln!("Could not open a browser automatically.");
        eprintln!("Open this URL manually, then re-run the command:");
        eprintln!("\n  {initiation_url}\n");
        return Err(err);
    }

    eprintln!("Opening your browser to complete the login...");
    eprintln!("Waiting for authentication...");

    let callback = match wait_for_callback(result_rx, opts.timeout).await {
        Ok(callback) => callback,
        Err(err) => {
            server_task.abort();
            return Err(err);
        }
    };
    server_task.abort();

    debug!("callback received, redeeming exchange code");
    let token =
        exchange::exchange_server_code(&opts.server_url, &callback.exchange_code, &callback.state)
            .await?;

    Ok(LoginResult { token })
}

/// Race the receiver's single-slot channel against the timeout.
///
/// Whichever fires first wins; the loser is discarded without side
/// effects.
async fn wait_for_callback(
    result_rx: oneshot::Receiver<Result<CallbackResult, LoginError>>,
    timeout: Duration,
) -> Result<CallbackResult, LoginError> {
    tokio::select! {
        result = result_rx => match result {
            Ok(Ok(callback)) => Ok(callback),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(LoginError::ReceiverClosed),
        },
        _ = tokio::time::sleep(timeout) => Err(LoginError::Timeout(timeout.as_secs())),
    }
}

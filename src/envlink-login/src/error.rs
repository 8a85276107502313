//! Errors that can occur during the CLI login flow.

use thiserror::Error;

/// Errors surfaced by one login attempt.
///
/// None of these are retried in place; every failure requires a fresh
/// session with fresh state.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The identity provider reported an error on the loopback callback.
    #[error("oauth error: {0}")]
    Provider(String),

    /// The loopback callback carried a missing or mismatched state.
    #[error("invalid oauth callback state")]
    StateMismatch,

    /// No browser callback arrived within the window.
    #[error("login timed out after {0} seconds")]
    Timeout(u64),

    /// The server refused the exchange code.
    #[error("server exchange failed with status {status}: {body}")]
    ExchangeRejected {
        /// HTTP status returned by the exchange endpoint.
        status: u16,
        /// Response body, for the user's eyes.
        body: String,
    },

    /// The exchange endpoint returned a blank token.
    #[error("empty token response")]
    EmptyToken,

    /// CLI-to-server network failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The system browser could not be launched.
    #[error("failed to open browser: {0}")]
    Browser(String),

    /// A URL could not be parsed or built.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Loopback listener setup failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The receiver task went away without delivering a result.
    #[error("callback receiver closed before delivering a result")]
    ReceiverClosed,
}

//! Loopback HTTP receiver for the browser callback.
//!
//! One fixed route, one result. The handler validates the redirect the
//! server sent the browser to, answers with a small status page, and
//! delivers the outcome through a single-slot channel; once the slot is
//! taken, later requests get a page but change nothing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use tokio::sync::{Mutex, oneshot};

use crate::error::LoginError;

const SUCCESS_PAGE: &str =
    "<h1>Authentication complete</h1><p>You can close this window and return to the CLI.</p>";
const AUTH_FAILED_PAGE: &str =
    "<h1>Authentication failed</h1><p>Return to your CLI and try again.</p>";
const INVALID_CALLBACK_PAGE: &str = "<h1>Invalid callback</h1><p>State validation failed.</p>";

/// What a valid browser callback delivers back to the initiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    /// One-time code to redeem at the server's exchange endpoint.
    pub exchange_code: String,
    /// State token echoed back by the server.
    pub state: String,
}

/// Build the single-route router owned by one login attempt.
///
/// `result_tx` is consumed by the first terminal callback; the state the
/// redirect must echo is fixed at construction.
pub(crate) fn callback_router(
    callback_path: &str,
    expected_state: String,
    result_tx: oneshot::Sender<Result<CallbackResult, LoginError>>,
) -> Router {
    let expected_state = Arc::new(expected_state);
    let result_tx = Arc::new(Mutex::new(Some(result_tx)));

    Router::new().route(
        callback_path,
        get(move |Query(params): Query<HashMap<String, String>>| {
            let expected_state = Arc::clone(&expected_state);
            let result_tx = Arc::clone(&result_tx);

            async move {
                let (status, page, result) = handle_callback(&params, &expected_state);

                if let Some(sender) = result_tx.lock().await.take() {
                    let _ = sender.send(result);
                }

                (status, Html(page))
            }
        }),
    )
}

fn handle_callback(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> (StatusCode, &'static str, Result<CallbackResult, LoginError>) {
    if let Some(oauth_error) = params
        .get("error")
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
    {
        return (
            StatusCode::BAD_REQUEST,
            AUTH_FAILED_PAGE,
            Err(LoginError::Provider(oauth_error.to_string())),
        );
    }

    let returned_state = params.get("state").map(|s| s.trim()).unwrap_or("");
    let exchange_code = params.get("exchange_code").map(|s| s.trim()).unwrap_or("");

    if returned_state.is_empty() || exchange_code.is_empty() || returned_state != expected_state {
        return (
            StatusCode::BAD_REQUEST,
            INVALID_CALLBACK_PAGE,
            Err(LoginError::StateMismatch),
        );
    }

    (
        StatusCode::OK,
        SUCCESS_PAGE,
        Ok(CallbackResult {
            exchange_code: exchange_code.to_string(),
            state: returned_state.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const CALLBACK_PATH: &str = "/oauth/google/callback";

    fn receiver() -> (
        Router,
        oneshot::Receiver<Result<CallbackResult, LoginError>>,
    ) {
        let (tx, rx) = oneshot::channel();
        let router = callback_router(CALLBACK_PATH, "expected-state".to_string(), tx);
        (router, rx)
    }

    async fn send(router: Router, uri: &str) -> StatusCode {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn provider_error_is_surfaced_to_the_cli() {
        let (router, rx) = receiver();

        let status = send(router, "/oauth/google/callback?error=access_denied").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let result = rx.await.unwrap();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("oauth error"));
        assert!(err.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn mismatched_state_is_rejected() {
        let (router, rx) = receiver();

        let status = send(
            router,
            "/oauth/google/callback?exchange_code=abc&state=wrong-state",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "invalid oauth callback state");
    }

    #[tokio::test]
    async fn missing_exchange_code_is_rejected() {
        let (router, rx) = receiver();

        let status = send(router, "/oauth/google/callback?state=expected-state").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(matches!(
            rx.await.unwrap(),
            Err(LoginError::StateMismatch)
        ));
    }

    #[tokio::test]
    async fn valid_callback_delivers_code_and_state() {
        let (router, rx) = receiver();

        let status = send(
            router,
            "/oauth/google/callback?exchange_code=code-1&state=expected-state",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let callback = rx.await.unwrap().unwrap();
        assert_eq!(
            callback,
            CallbackResult {
                exchange_code: "code-1".to_string(),
                state: "expected-state".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn second_request_after_delivery_is_a_no_op() {
        let (router, rx) = receiver();

        let status = send(
            router.clone(),
            "/oauth/google/callback?exchange_code=code-1&state=expected-state",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.await.unwrap().is_ok());

        // The slot is empty now; a replay still gets an HTTP answer but
        // nothing is delivered anywhere.
        let status = send(
            router,
            "/oauth/google/callback?exchange_code=code-2&state=expected-state",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

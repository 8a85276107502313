//! Client for the server's exchange endpoint.

use std::time::Duration;

use envlink_common::protocol::{API_BASE_PATH, TokenExchangeRequest, TokenExchangeResponse};

use crate::error::LoginError;

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Redeem `exchange_code` at the server, returning the provider token.
///
/// The code may already have been consumed or expired on the server; the
/// rejection is final and the whole login has to start over.
pub(crate) async fn exchange_server_code(
    server_url: &str,
    exchange_code: &str,
    state: &str,
) -> Result<String, LoginError> {
    let client = reqwest::Client::builder()
        .timeout(EXCHANGE_TIMEOUT)
        .build()?;

    let url = format!(
        "{}{}/auth/cli/exchange",
        server_url.trim_end_matches('/'),
        API_BASE_PATH
    );

    let response = client
        .post(&url)
        .json(&TokenExchangeRequest {
            exchange_code: exchange_code.to_string(),
            state: state.to_string(),
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LoginError::ExchangeRejected {
            status: status.as_u16(),
            body,
        });
    }

    let body: TokenExchangeResponse = response.json().await?;
    if body.token.trim().is_empty() {
        return Err(LoginError::EmptyToken);
    }

    Ok(body.token)
}

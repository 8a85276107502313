//! Wire types and names shared between the server and the CLI.

use serde::{Deserialize, Serialize};

/// Base path of the versioned HTTP API.
pub const API_BASE_PATH: &str = "/api/v1";

/// Query parameter carrying the CLI's loopback callback URL on initiation.
pub const CLI_CALLBACK_PARAM: &str = "cli_callback";

/// Query parameter carrying the CLI's state token on initiation.
pub const CLI_STATE_PARAM: &str = "cli_state";

/// Query parameter carrying the one-time exchange code on the loopback redirect.
pub const EXCHANGE_CODE_PARAM: &str = "exchange_code";

/// Query parameter carrying the state token on the loopback redirect.
pub const STATE_PARAM: &str = "state";

/// Body of `POST /api/v1/auth/cli/exchange`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchangeRequest {
    /// One-time code minted by the server at provider-callback completion.
    pub exchange_code: String,
    /// State token generated by the CLI at the start of the attempt.
    pub state: String,
}

/// Successful response of the exchange endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchangeResponse {
    /// Access token obtained from the identity provider.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_request_uses_snake_case_fields() {
        let body = TokenExchangeRequest {
            exchange_code: "c1".to_string(),
            state: "s1".to_string(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["exchange_code"], "c1");
        assert_eq!(json["state"], "s1");
    }
}

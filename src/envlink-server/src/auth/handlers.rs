//! HTTP handlers for provider login and the CLI token handoff.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};
use url::Url;

use envlink_common::protocol::{
    CLI_CALLBACK_PARAM, CLI_STATE_PARAM, EXCHANGE_CODE_PARAM, STATE_PARAM, TokenExchangeRequest,
    TokenExchangeResponse,
};
use envlink_common::token::{TOKEN_BYTES, secure_hex_token};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::context::{
    clear_cli_auth_context, clear_provider_state, read_cli_auth_context, read_provider_state,
    write_cli_auth_context, write_provider_state,
};
use super::exchange::{EXCHANGE_TTL, new_exchange_code};
use super::guard::is_allowed_cli_callback;
use super::provider::{AuthProvider, ProviderIdentity};

const AUTH_FAILED_PAGE: &str =
    "<h1>Authentication failed</h1><p>Please return to your CLI and try again.</p>";

/// `GET /auth/{provider}` — begin a provider login.
///
/// A request carrying `cli_callback` and `cli_state` binds a CLI context
/// before the redirect; the two parameters are required together and the
/// callback must pass the loopback allow-list. Without them this is an
/// ordinary browser login.
pub async fn get_auth_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> AppResult<Response> {
    let provider = state
        .providers
        .get(&provider_name)
        .ok_or_else(|| AppError::NotFound(format!("unknown provider: {provider_name}")))?;

    let cli_callback = params
        .get(CLI_CALLBACK_PARAM)
        .map(|s| s.trim())
        .unwrap_or("");
    let cli_state = params.get(CLI_STATE_PARAM).map(|s| s.trim()).unwrap_or("");

    let mut jar = jar;
    if !cli_callback.is_empty() || !cli_state.is_empty() {
        if cli_callback.is_empty() || cli_state.is_empty() {
            return Err(AppError::BadRequest(
                "cli_callback and cli_state are required together".to_string(),
            ));
        }

        if !is_allowed_cli_callback(cli_callback) {
            return Err(AppError::BadRequest("invalid cli_callback".to_string()));
        }

        jar = write_cli_auth_context(jar, cli_callback, cli_state);
        debug!(provider = %provider_name, "bound CLI context for login flow");
    }

    let provider_state = secure_hex_token(TOKEN_BYTES);
    let jar = write_provider_state(jar, &provider_state);
    let authorize_url = provider.authorize_url(&provider_state);

    Ok((jar, Redirect::temporary(&authorize_url)).into_response())
}

/// `GET /auth/{provider}/callback` — provider redirect target.
///
/// Completes the handshake, then either hands the browser back to the
/// CLI's loopback receiver with a one-time exchange code, or renders the
/// authenticated identity for a plain browser login. Context cookies are
/// cleared on every terminal path.
pub async fn get_auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Response {
    let Some(provider) = state.providers.get(&provider_name) else {
        return AppError::NotFound(format!("unknown provider: {provider_name}")).into_response();
    };

    let expected_state = read_provider_state(&jar);
    let jar = clear_provider_state(jar);

    let identity = match complete_provider_auth(provider.as_ref(), &params, expected_state).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!(provider = %provider_name, error = %err, "provider authentication failed");
            let jar = clear_cli_auth_context(jar);
            return (jar, (StatusCode::BAD_REQUEST, Html(AUTH_FAILED_PAGE))).into_response();
        }
    };

    if let Some((callback_url, cli_state)) = read_cli_auth_context(&jar) {
        let exchange_code = new_exchange_code();
        state
            .pending_exchanges
            .save(&exchange_code, &cli_state, &identity.access_token, EXCHANGE_TTL)
            .await;

        match build_cli_redirect_url(&callback_url, &exchange_code, &cli_state) {
            Ok(redirect_url) => {
                debug!(provider = %provider_name, "handing browser back to CLI loopback receiver");
                let jar = clear_cli_auth_context(jar);
                return found_redirect(jar, redirect_url);
            }
            Err(err) => {
                warn!(error = %err, "failed to build CLI redirect URL");
                // fall through to the plain browser login page
            }
        }
    }

    let jar = clear_cli_auth_context(jar);
    (jar, Html(identity_page(&identity, &provider_name))).into_response()
}

/// `POST /auth/cli/exchange` — redeem an exchange code for the token.
pub async fn post_cli_exchange(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TokenExchangeRequest>,
) -> AppResult<Json<TokenExchangeResponse>> {
    let exchange_code = body.exchange_code.trim();
    let cli_state = body.state.trim();

    if exchange_code.is_empty() || cli_state.is_empty() {
        return Err(AppError::BadRequest(
            "exchange_code and state are required".to_string(),
        ));
    }

    let token = state
        .pending_exchanges
        .consume(exchange_code, cli_state)
        .await
        .ok_or_else(|| AppError::Authentication("invalid or expired exchange_code".to_string()))?;

    Ok(Json(TokenExchangeResponse { token }))
}

/// `GET /auth/{provider}/logout` — end the provider session.
pub async fn get_logout_provider(
    Path(_provider_name): Path<String>,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = clear_provider_state(clear_cli_auth_context(jar));
    (jar, Redirect::temporary("/"))
}

/// Validate the callback query and finish the provider handshake.
async fn complete_provider_auth(
    provider: &dyn AuthProvider,
    params: &HashMap<String, String>,
    expected_state: Option<String>,
) -> AppResult<ProviderIdentity> {
    if let Some(error) = params.get("error").map(|e| e.trim()).filter(|e| !e.is_empty()) {
        return Err(AppError::Provider(format!("provider returned error: {error}")));
    }

    let returned_state = params.get(STATE_PARAM).map(String::as_str).unwrap_or("");
    match expected_state {
        Some(expected) if !expected.is_empty() && expected == returned_state => {}
        _ => return Err(AppError::Provider("oauth state mismatch".to_string())),
    }

    let code = params.get("code").map(String::as_str).unwrap_or("");
    if code.is_empty() {
        return Err(AppError::Provider("missing authorization code".to_string()));
    }

    provider.complete_auth(code).await
}

/// Build the loopback redirect URL from the CLI's callback.
///
/// Pre-existing query parameters are preserved; `exchange_code` and
/// `state` are set, overwriting earlier values of the same names.
fn build_cli_redirect_url(
    callback_url: &str,
    exchange_code: &str,
    state: &str,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(callback_url)?;

    let existing: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != EXCHANGE_CODE_PARAM && key != STATE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &existing {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(EXCHANGE_CODE_PARAM, exchange_code);
        pairs.append_pair(STATE_PARAM, state);
    }

    Ok(url.to_string())
}

/// 302 redirect carrying the response cookies.
fn found_redirect(jar: CookieJar, location: String) -> Response {
    (jar, (StatusCode::FOUND, [(header::LOCATION, location)], ())).into_response()
}

fn identity_page(identity: &ProviderIdentity, provider_name: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Auth successful</title></head>
<body>
    <h1>Authentication successful</h1>
    <p><strong>Name:</strong> {}</p>
    <p><strong>Email:</strong> {}</p>
    <p><strong>Provider:</strong> {}</p>
    <p>You can close this window and return to the CLI.</p>
</body>
</html>
"#,
        escape_html(&identity.name),
        escape_html(&identity.email),
        escape_html(provider_name),
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

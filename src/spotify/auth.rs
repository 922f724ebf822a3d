use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::{Client, StatusCode};

use crate::{
    config::Credentials,
    error::ExtractError,
    types::{ClientCredentialsResponse, Token},
};

/// Requests an application access token using the client credentials grant.
///
/// Sends `grant_type=client_credentials` to the token endpoint with the
/// client id and secret as HTTP Basic authorization. The resulting token can
/// read public playlists but carries no user scope.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `credentials` - Client id and secret
/// * `token_url` - Token endpoint, usually `https://accounts.spotify.com/api/token`
/// * `timeout` - Per-request timeout
///
/// # Errors
///
/// - [`ExtractError::Authorization`] when the endpoint rejects the client
///   (`400 invalid_client`, `401`, `403`)
/// - [`ExtractError::RateLimited`] / [`ExtractError::TransientNetwork`] for
///   throttling, `5xx` and connection failures
/// - [`ExtractError::MalformedResponse`] when the body is not a token
pub async fn request_token(
    client: &Client,
    credentials: &Credentials,
    token_url: &str,
    timeout: Duration,
) -> Result<Token, ExtractError> {
    let response = client
        .post(token_url)
        .header(
            "Authorization",
            format!("Basic {}", basic_auth(credentials)),
        )
        .form(&[("grant_type", "client_credentials")])
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let reason = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error text".to_string());
        return Err(match status {
            StatusCode::BAD_REQUEST => {
                ExtractError::Authorization(format!("token request rejected: {}", reason))
            }
            _ => ExtractError::from_status(status, None, "token request"),
        });
    }

    let body = response.json::<ClientCredentialsResponse>().await?;

    Ok(Token {
        access_token: body.access_token,
        token_type: body.token_type,
        expires_in: body.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    })
}

fn basic_auth(credentials: &Credentials) -> String {
    STANDARD.encode(format!(
        "{}:{}",
        credentials.client_id, credentials.client_secret
    ))
}

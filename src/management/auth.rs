use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::{config::Credentials, error::ExtractError, spotify, types::Token};

// refresh this many seconds before the token actually expires
const EXPIRY_BUFFER_SECS: u64 = 240;

pub struct TokenManager {
    credentials: Credentials,
    token_url: String,
    token: Option<Token>,
}

impl TokenManager {
    pub fn new(credentials: Credentials, token_url: String) -> Self {
        TokenManager {
            credentials,
            token_url,
            token: None,
        }
    }

    /// Returns an access token, requesting a fresh one when none is held
    /// or the current one is about to expire.
    pub async fn get_valid_token(
        &mut self,
        client: &Client,
        timeout: Duration,
    ) -> Result<String, ExtractError> {
        let now = Utc::now().timestamp() as u64;
        let needs_new = match &self.token {
            Some(token) => is_expired(token, now),
            None => true,
        };

        if needs_new {
            let token =
                spotify::auth::request_token(client, &self.credentials, &self.token_url, timeout)
                    .await?;
            self.token = Some(token);
        }

        self.token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| ExtractError::Authorization("no access token".to_string()))
    }

    /// Drops the held token so the next call requests a new one.
    pub fn invalidate(&mut self) {
        self.token = None;
    }
}

fn is_expired(token: &Token, now: u64) -> bool {
    now + EXPIRY_BUFFER_SECS >= token.obtained_at + token.expires_in
}

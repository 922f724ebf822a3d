//! Configuration management for the playlist track id collector.
//!
//! This module handles loading configuration values from environment
//! variables and `.env` files. Credentials are read once by the caller and
//! handed to the session explicitly; the extractor itself never touches the
//! environment.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use crate::error::ExtractError;

pub const APP_DIR: &str = "playlist-ids";

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_MAX_RETRY_WAIT_SECS: u64 = 120;

/// Returns `<data_local_dir>/playlist-ids`, falling back to the working
/// directory when the platform has no data directory.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives at:
/// - Linux: `~/.local/share/playlist-ids/.env`
/// - macOS: `~/Library/Application Support/playlist-ids/.env`
/// - Windows: `%LOCALAPPDATA%/playlist-ids/.env`
///
/// A missing file is not an error, variables may come from the process
/// environment alone.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file exists
/// but cannot be parsed.
pub async fn load_env() -> Result<(), ExtractError> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::Config(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ExtractError::Config(e.to_string()))?;
    }
    Ok(())
}

/// Client credentials for the Spotify Web API.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Default playlist owner for references that don't name one.
    pub username: Option<String>,
}

impl Credentials {
    /// Reads `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` and the optional
    /// `SPOTIFY_USERNAME`.
    pub fn from_env() -> Result<Self, ExtractError> {
        Ok(Self {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            username: optional("SPOTIFY_USERNAME"),
        })
    }
}

// keep the secret out of debug output
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("username", &self.username)
            .finish()
    }
}

/// Endpoint and resilience settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub token_url: String,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub concurrency: usize,
    /// Ceiling for waits requested through `Retry-After`.
    pub max_retry_wait: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            concurrency: DEFAULT_CONCURRENCY,
            max_retry_wait: Duration::from_secs(DEFAULT_MAX_RETRY_WAIT_SECS),
        }
    }
}

impl Settings {
    /// Reads the optional overrides:
    ///
    /// - `SPOTIFY_API_URL` (default `https://api.spotify.com/v1`)
    /// - `SPOTIFY_API_TOKEN_URL` (default `https://accounts.spotify.com/api/token`)
    /// - `PLAYLIST_IDS_TIMEOUT_SECS` (default 10)
    /// - `PLAYLIST_IDS_MAX_ATTEMPTS` (default 3)
    /// - `PLAYLIST_IDS_CONCURRENCY` (default 4)
    /// - `PLAYLIST_IDS_MAX_RETRY_WAIT_SECS` (default 120)
    pub fn from_env() -> Result<Self, ExtractError> {
        let defaults = Self::default();
        Ok(Self {
            api_url: optional("SPOTIFY_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            token_url: optional("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.token_url),
            request_timeout: parsed::<u64>("PLAYLIST_IDS_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_attempts: parsed::<u32>("PLAYLIST_IDS_MAX_ATTEMPTS")?
                .unwrap_or(defaults.max_attempts)
                .max(1),
            concurrency: parsed::<usize>("PLAYLIST_IDS_CONCURRENCY")?
                .unwrap_or(defaults.concurrency)
                .max(1),
            max_retry_wait: parsed::<u64>("PLAYLIST_IDS_MAX_RETRY_WAIT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_retry_wait),
        })
    }
}

fn required(name: &str) -> Result<String, ExtractError> {
    optional(name).ok_or_else(|| ExtractError::Config(format!("{} must be set", name)))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ExtractError> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ExtractError::Config(format!("{} is not a valid number: {}", name, raw))),
        None => Ok(None),
    }
}

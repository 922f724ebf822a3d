//! # Spotify Integration Module
//!
//! This module is the boundary between the extractor and the Spotify Web API.
//! It defines the [`PlaylistSource`] seam the extractor walks pages through
//! and provides the HTTP-backed [`SpotifySession`] implementing it.
//!
//! ## Architecture
//!
//! ```text
//! CLI (playlist catalog, output)
//!          ↓
//! Extractor (pagination, retries, null-track skipping)
//!          ↓
//! PlaylistSource
//!     └── SpotifySession
//!           ├── Authentication (client credentials grant)
//!           └── Playlist track pages
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Authentication Strategy
//!
//! The session uses the OAuth 2.0 client credentials grant. No user
//! interaction is involved, which is enough to read public and curated
//! playlists. Tokens are held in memory by a
//! [`TokenManager`](crate::management::TokenManager) and re-requested
//! shortly before they expire, so callers never see an expired token.
//!
//! ## Error Mapping
//!
//! Responses are classified once, at the boundary:
//! - `404` becomes [`ExtractError::NotFound`]
//! - `401`/`403` become [`ExtractError::Authorization`]
//! - `429` becomes [`ExtractError::RateLimited`] carrying `Retry-After`
//! - `5xx` and transport failures become [`ExtractError::TransientNetwork`]
//! - undecodable bodies become [`ExtractError::MalformedResponse`]
//!
//! Retrying is not done here; the extractor owns the retry policy.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - Client credentials token request
//! - `GET /users/{user_id}/playlists/{playlist_id}/tracks` - Playlist track listing
//!
//! ## Thread Safety
//!
//! [`SpotifySession`] is `Send + Sync`. The HTTP client is shared and the
//! token sits behind an async mutex, so one session can serve concurrent
//! extractions.

pub mod auth;
mod session;

use async_trait::async_trait;

pub use session::SpotifySession;

use crate::{
    error::ExtractError,
    types::{PlaylistReference, PlaylistTracksPage},
};

/// Something that can hand out pages of a playlist's track listing.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Fetches up to `limit` listing entries starting at `offset`.
    async fn fetch_page(
        &self,
        reference: &PlaylistReference,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistTracksPage, ExtractError>;
}

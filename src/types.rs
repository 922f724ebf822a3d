use serde::{Deserialize, Deserializer, Serialize};
use tabled::Tabled;

use crate::error::ExtractError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentialsResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Identifies a playlist to fetch. Both parts are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistReference {
    owner: String,
    playlist_id: String,
}

impl PlaylistReference {
    pub fn new(owner: impl Into<String>, playlist_id: impl Into<String>) -> Result<Self, ExtractError> {
        let owner = owner.into().trim().to_string();
        let playlist_id = playlist_id.into().trim().to_string();

        if owner.is_empty() {
            return Err(ExtractError::InvalidReference("owner is empty".to_string()));
        }
        if playlist_id.is_empty() {
            return Err(ExtractError::InvalidReference(
                "playlist id is empty".to_string(),
            ));
        }

        Ok(Self { owner, playlist_id })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }
}

impl std::fmt::Display for PlaylistReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.playlist_id)
    }
}

/// Track ids of one playlist in listing order, duplicates preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackIdSequence {
    pub track_ids: Vec<String>,
    /// Entries whose track was removed, delisted or is a local file.
    pub skipped: usize,
    pub pages: usize,
}

impl TrackIdSequence {
    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }
}

/// One page of `GET /users/{owner}/playlists/{id}/tracks`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistItem>,
    // must be present in the body even when null
    #[serde(deserialize_with = "required_nullable")]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,
    /// Local files added by the playlist owner, they have no catalog id.
    #[serde(default)]
    pub is_local: bool,
}

fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Error body of the Web API, e.g.
/// `{"error": {"status": 400, "message": "Invalid base62 id"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub status: u16,
    pub message: String,
}

/// A playlist the caller wants to visit, addressed by a human name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPlaylist {
    pub name: String,
    pub playlist_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub playlist_id: String,
    pub owner: String,
}

#[derive(Tabled)]
pub struct ExtractionTableRow {
    pub name: String,
    pub tracks: usize,
    pub skipped: usize,
    pub pages: usize,
    pub status: String,
}

use std::path::{Path, PathBuf};

use crate::{
    config,
    error::ExtractError,
    types::{NamedPlaylist, PlaylistReference},
};

const CATALOG_FILE: &str = "playlists.json";
const CURATOR: &str = "spotify";

// The "All Out" decade lists curated by Spotify.
const BUILTIN: [(&str, &str); 7] = [
    ("all-out-50s", "37i9dQZF1DWSV3Tk4GO2fq"),
    ("all-out-60s", "37i9dQZF1DXaKIA8E7WcJj"),
    ("all-out-70s", "37i9dQZF1DWTJ7xPn4vNaz"),
    ("all-out-80s", "37i9dQZF1DX4UtSsGT1Sbe"),
    ("all-out-90s", "37i9dQZF1DXbTxeAdrVG2l"),
    ("all-out-00s", "37i9dQZF1DX4o1oenSJRJd"),
    ("all-out-10s", "37i9dQZF1DX5Ejj0EkURtP"),
];

/// The named playlists a run visits.
///
/// Read from `<data_local_dir>/playlist-ids/playlists.json` when present:
///
/// ```json
/// [
///   { "name": "all-out-80s", "playlist_id": "37i9dQZF1DX4UtSsGT1Sbe", "owner": "spotify" },
///   { "name": "road-trip", "playlist_id": "5Xb..." }
/// ]
/// ```
///
/// Entries without an owner use the configured username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistCatalog {
    playlists: Vec<NamedPlaylist>,
}

impl PlaylistCatalog {
    pub fn new(playlists: Vec<NamedPlaylist>) -> Result<Self, ExtractError> {
        for (i, playlist) in playlists.iter().enumerate() {
            if playlist.name.trim().is_empty() {
                return Err(ExtractError::Config(format!(
                    "playlist entry {} has an empty name",
                    i
                )));
            }
            if playlists[..i]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&playlist.name))
            {
                return Err(ExtractError::Config(format!(
                    "playlist name {} is listed twice",
                    playlist.name
                )));
            }
        }
        Ok(Self { playlists })
    }

    pub fn builtin() -> Self {
        Self {
            playlists: BUILTIN
                .iter()
                .map(|(name, id)| NamedPlaylist {
                    name: name.to_string(),
                    playlist_id: id.to_string(),
                    owner: Some(CURATOR.to_string()),
                })
                .collect(),
        }
    }

    /// Loads the catalog file, or the built-in set when there is none.
    pub async fn load() -> Result<Self, ExtractError> {
        let path = Self::catalog_path();
        if !path.is_file() {
            return Ok(Self::builtin());
        }
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self, ExtractError> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|e| ExtractError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ExtractError> {
        let playlists: Vec<NamedPlaylist> = serde_json::from_str(content)
            .map_err(|e| ExtractError::Config(format!("invalid playlist catalog: {}", e)))?;
        Self::new(playlists)
    }

    pub fn all(&self) -> &[NamedPlaylist] {
        &self.playlists
    }

    pub fn find(&self, name: &str) -> Option<&NamedPlaylist> {
        self.playlists
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Picks playlists by name, keeping the order given. An empty selection
    /// means the whole catalog.
    pub fn select(&self, names: &[String]) -> Result<Vec<NamedPlaylist>, ExtractError> {
        if names.is_empty() {
            return Ok(self.playlists.clone());
        }

        names
            .iter()
            .map(|name| {
                self.find(name).cloned().ok_or_else(|| {
                    ExtractError::InvalidReference(format!("no playlist named {}", name))
                })
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.playlists.len()
    }

    pub fn catalog_path() -> PathBuf {
        config::data_dir().join(CATALOG_FILE)
    }
}

/// Turns a catalog entry into a reference, filling in `default_owner` for
/// entries that don't name one.
pub fn resolve(
    playlist: &NamedPlaylist,
    default_owner: Option<&str>,
) -> Result<PlaylistReference, ExtractError> {
    let owner = playlist
        .owner
        .as_deref()
        .or(default_owner)
        .ok_or_else(|| {
            ExtractError::Config(format!(
                "playlist {} has no owner and SPOTIFY_USERNAME is not set",
                playlist.name
            ))
        })?;
    PlaylistReference::new(owner, playlist.playlist_id.clone())
}

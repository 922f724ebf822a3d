use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::{Credentials, Settings},
    error, extractor, info,
    management::{self, PlaylistCatalog},
    spotify::SpotifySession,
    success,
    types::{ExtractionTableRow, NamedPlaylist, PlaylistReference},
    warning,
};

/// Extracts track ids for the selected playlists and prints them.
///
/// With `playlist` set a single ad-hoc playlist is fetched, otherwise the
/// catalog entries named in `names` (all of them when empty). Ids are
/// printed one per line below a header per playlist, followed by a summary
/// table. Exits with status 1 when any playlist failed.
pub async fn extract(
    names: Vec<String>,
    playlist: Option<String>,
    owner: Option<String>,
    concurrency: Option<usize>,
) {
    let credentials = match Credentials::from_env() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => error!("{}", e),
    };

    let default_owner = owner.or_else(|| credentials.username.clone());
    let selected = match select_playlists(names, playlist).await {
        Ok(selected) => selected,
        Err(e) => error!("{}", e),
    };

    let references = match selected
        .iter()
        .map(|p| management::resolve(p, default_owner.as_deref()))
        .collect::<Result<Vec<PlaylistReference>, _>>()
    {
        Ok(references) => references,
        Err(e) => error!("{}", e),
    };

    let policy = extractor::RetryPolicy::from_settings(&settings);
    let concurrency = concurrency.unwrap_or(settings.concurrency).max(1);
    let session = match SpotifySession::new(credentials, settings) {
        Ok(s) => s,
        Err(e) => error!("Cannot create Spotify session: {}", e),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Fetching {} playlists...", references.len()));
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let results = extractor::extract_many(&session, &references, &policy, concurrency).await;
    pb.finish_and_clear();

    let mut rows = Vec::with_capacity(results.len());
    let mut failed = 0;

    for (playlist, result) in selected.iter().zip(results) {
        match result {
            Ok(sequence) => {
                info!("{} ({} tracks)", playlist.name, sequence.len());
                if sequence.skipped > 0 {
                    warning!(
                        "{}: skipped {} unavailable tracks",
                        playlist.name,
                        sequence.skipped
                    );
                }
                for id in &sequence.track_ids {
                    println!("{}", id);
                }

                rows.push(ExtractionTableRow {
                    name: playlist.name.clone(),
                    tracks: sequence.len(),
                    skipped: sequence.skipped,
                    pages: sequence.pages,
                    status: "ok".to_string(),
                });
            }
            Err(e) => {
                failed += 1;
                warning!("{}: {}", playlist.name, e);
                rows.push(ExtractionTableRow {
                    name: playlist.name.clone(),
                    tracks: 0,
                    skipped: 0,
                    pages: 0,
                    status: e.to_string(),
                });
            }
        }
    }

    println!("{}", Table::new(rows));

    if failed > 0 {
        error!("{} of {} playlists failed", failed, selected.len());
    }
    success!("Extracted {} playlists", selected.len());
}

async fn select_playlists(
    names: Vec<String>,
    playlist: Option<String>,
) -> Result<Vec<NamedPlaylist>, crate::ExtractError> {
    if let Some(playlist_id) = playlist {
        return Ok(vec![NamedPlaylist {
            name: playlist_id.clone(),
            playlist_id,
            owner: None,
        }]);
    }

    let catalog = PlaylistCatalog::load().await?;
    catalog.select(&names)
}

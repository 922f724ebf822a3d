use tabled::Table;

use crate::{info, management::PlaylistCatalog, types::PlaylistTableRow, warning};

/// Lists the playlists known to the catalog.
pub async fn playlists() {
    let catalog = match PlaylistCatalog::load().await {
        Ok(catalog) => catalog,
        Err(e) => {
            warning!("Failed to load playlist catalog, using built-in list. Err: {}", e);
            PlaylistCatalog::builtin()
        }
    };

    let path = PlaylistCatalog::catalog_path();
    if path.is_file() {
        info!("Playlists from {}", path.display());
    } else {
        info!(
            "Built-in playlists (create {} to use your own)",
            path.display()
        );
    }

    let rows: Vec<PlaylistTableRow> = catalog
        .all()
        .iter()
        .map(|p| PlaylistTableRow {
            name: p.name.clone(),
            playlist_id: p.playlist_id.clone(),
            owner: p.owner.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!("{}", Table::new(rows));
}

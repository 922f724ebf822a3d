mod auth;
mod playlists;

pub use auth::TokenManager;
pub use playlists::PlaylistCatalog;
pub use playlists::resolve;

//! Playlist Track Id Collector Library
//!
//! This library collects the track ids of curated Spotify playlists so they
//! can be fed into later processing such as audio-feature enrichment. It
//! includes modules for authenticating against the Spotify Web API, walking
//! paginated playlist listings, and managing the set of playlists to visit.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by the session and the extractor
//! - `extractor` - Playlist track id extraction with pagination and retries
//! - `management` - Token lifecycle and the named playlist catalog
//! - `spotify` - Spotify Web API session implementation
//! - `types` - Data structures and type definitions
//!
//! # Example
//!
//! ```
//! use playlist_ids::{config, extractor, spotify::SpotifySession, types::PlaylistReference};
//!
//! #[tokio::main]
//! async fn main() -> playlist_ids::Res<()> {
//!     config::load_env().await?;
//!     let session = SpotifySession::new(config::Credentials::from_env()?, config::Settings::from_env()?)?;
//!     let reference = PlaylistReference::new("spotify", "37i9dQZF1DWSV3Tk4GO2fq")?;
//!     let ids = extractor::extract_track_ids(&session, &reference, &Default::default()).await?;
//!     println!("{} tracks", ids.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod management;
pub mod spotify;
pub mod types;

pub use error::ExtractError;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the binary and the CLI layer where any error is simply reported
/// to the user. Library operations return [`ExtractError`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching {} playlists...", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors in the binary; the library never calls it.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Goes to stderr so that track ids written to stdout stay clean.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

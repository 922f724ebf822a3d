//! # CLI Module
//!
//! Command implementations for the `playlist-ids` binary. This is the
//! calling context of the extractor: it reads credentials, builds the
//! session once, decides which playlists to visit and prints the results.
//!
//! ## Commands
//!
//! - [`extract`] - Fetches track ids for catalog playlists or a single ad-hoc id
//! - [`playlists`] - Shows the playlist catalog
//!
//! ## Usage Patterns
//!
//! ```bash
//! playlist-ids playlists                          # What will be fetched
//! playlist-ids extract                            # Every catalog playlist
//! playlist-ids extract --name all-out-80s         # One catalog playlist
//! playlist-ids extract --playlist 5Xb... --owner u1
//! ```
//!
//! Track ids go to stdout one per line; warnings go to stderr.

mod extract;
mod playlists;

pub use extract::extract;
pub use playlists::playlists;

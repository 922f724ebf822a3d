use clap::{
    ArgAction, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};

use playlist_ids::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect track ids from playlists
    Extract(ExtractOptions),

    /// Show the playlist catalog
    Playlists,
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractOptions {
    /// Catalog playlist to extract; can be repeated (default: all)
    #[clap(long = "name", action = ArgAction::Append, num_args = 1, conflicts_with = "playlist")]
    pub names: Vec<String>,

    /// Extract a single playlist by id instead of catalog entries
    #[clap(long)]
    pub playlist: Option<String>,

    /// Owner for playlists that don't name one (default: SPOTIFY_USERNAME)
    #[clap(long)]
    pub owner: Option<String>,

    /// Playlists fetched at the same time
    #[clap(long)]
    pub concurrency: Option<usize>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Extract(opt) => {
            cli::extract(opt.names, opt.playlist, opt.owner, opt.concurrency).await
        }
        Command::Playlists => cli::playlists().await,
    }
}

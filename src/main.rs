use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporldl::{cli, config, error};

const DEFAULT_TRACK_LIST: &str = "playlist_tracks.csv";

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
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch the tracks of a playlist into a track list
    Fetch(FetchOptions),

    /// Look up a YouTube link for every track in a track list
    Resolve(ListOptions),

    /// Convert and download every track with a link
    Download(DownloadOptions),

    /// Fetch, resolve and download in one go
    Run(RunOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct FetchOptions {
    /// Spotify playlist ID
    pub playlist_id: String,

    /// Track list to write
    #[clap(long, short, default_value = DEFAULT_TRACK_LIST)]
    pub output: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ListOptions {
    /// Track list to read and update
    #[clap(long, short, default_value = DEFAULT_TRACK_LIST)]
    pub input: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    /// Track list with links
    #[clap(long, short, default_value = DEFAULT_TRACK_LIST)]
    pub input: PathBuf,

    /// Show the browser window
    #[clap(long)]
    pub headed: bool,

    /// Directory for downloaded tracks, overriding DOWNLOAD_DIR
    #[clap(long, short)]
    pub download_dir: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct RunOptions {
    /// Spotify playlist ID
    pub playlist_id: String,

    /// Track list to write
    #[clap(long, short, default_value = DEFAULT_TRACK_LIST)]
    pub output: PathBuf,

    /// Show the browser window
    #[clap(long)]
    pub headed: bool,

    /// Directory for downloaded tracks, overriding DOWNLOAD_DIR
    #[clap(long, short)]
    pub download_dir: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(opt) => cli::fetch(&opt.playlist_id, &opt.output).await,
        Command::Resolve(opt) => cli::resolve(&opt.input).await,
        Command::Download(opt) => {
            let download_dir = opt.download_dir.unwrap_or_else(config::download_dir);
            cli::download(&opt.input, opt.headed, &download_dir).await
        }
        Command::Run(opt) => {
            let download_dir = opt.download_dir.unwrap_or_else(config::download_dir);
            cli::run(&opt.playlist_id, &opt.output, opt.headed, &download_dir).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

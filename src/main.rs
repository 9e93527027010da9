use std::{path::PathBuf, sync::Arc};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporlyze::{
    cli::{self, AnalyzeOptions, Source, SourceKind},
    config, error, logging,
    types::{PkceToken, TimeRange},
};
use tokio::sync::Mutex;

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
    /// Authorize with Spotify API
    Auth,

    /// Analyze listening habits and write a report
    Analyze(AnalyzeArgs),

    /// List owned and collaborative playlists
    Playlists,

    /// Create an AI-curated playlist from a saved report
    Recommend(RecommendArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Where the tracks come from
    #[clap(long, value_enum, default_value = "top")]
    source: SourceKind,

    /// Listening period for --source top
    #[clap(long, value_enum, default_value = "medium-term")]
    period: TimeRange,

    /// Playlist id for --source playlist
    #[clap(long, required_if_eq("source", "playlist"))]
    playlist: Option<String>,

    /// Directory the report is written to
    #[clap(long)]
    output: Option<PathBuf>,

    /// Skip the AI commentary
    #[clap(long)]
    no_insights: bool,

    /// Also create a recommended playlist
    #[clap(long)]
    recommend: bool,

    /// Name of the recommended playlist
    #[clap(long)]
    name: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct RecommendArgs {
    /// Report file written by `analyze`
    report: PathBuf,

    /// Name of the playlist
    #[clap(long)]
    name: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

impl AnalyzeArgs {
    fn into_options(self) -> AnalyzeOptions {
        let source = match self.source {
            SourceKind::Top => Source::Top(self.period),
            SourceKind::Recent => Source::Recent,
            SourceKind::Library => Source::Library,
            SourceKind::Playlist => Source::Playlist(self.playlist.unwrap_or_default()),
            SourceKind::Everything => Source::Everything,
        };

        AnalyzeOptions {
            source,
            output: self.output,
            insights: !self.no_insights,
            recommend: self.recommend,
            playlist_name: self.name,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }
        Command::Analyze(args) => cli::analyze(args.into_options()).await,
        Command::Playlists => cli::playlists().await,
        Command::Recommend(args) => cli::recommend(&args.report, args.name.as_deref()).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

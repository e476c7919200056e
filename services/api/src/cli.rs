use crate::demo::{run_assess, run_demo, run_ingest, AssessArgs, DemoArgs, IngestArgs};
use crate::server;
use asteroid_watch::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Asteroid Watch",
    about = "Score near-Earth objects and generate close-approach alerts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Pull a date range from the NeoWs feed and print the scored objects
    Ingest(IngestArgs),
    /// Score a single object described on the command line
    Assess(AssessArgs),
    /// Run an offline demo covering scoring, watch lists, and alert generation
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Ingest(args) => run_ingest(args).await,
        Command::Assess(args) => run_assess(args),
        Command::Demo(args) => run_demo(args).await,
    }
}

use crate::report::{run_candidates, run_schedule, CandidatesArgs, ScheduleArgs};
use crate::server;
use care_match::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Care Match",
    about = "Match open home-care shifts to eligible caregivers and record assignments",
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
    /// Run the weekly auto-schedule batch against a snapshot file and print the report
    Schedule(ScheduleArgs),
    /// List the ranked eligible caregivers for one shift in a snapshot file
    Candidates(CandidatesArgs),
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
        Command::Schedule(args) => run_schedule(args),
        Command::Candidates(args) => run_candidates(args),
    }
}

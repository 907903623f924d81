//! workstreams - Group achievements into workstreams from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{AssignCommand, ParamsCommand, ReclusterCommand, RefreshCommand};

/// Workstreams CLI - cluster achievements and attach new ones to workstreams.
///
/// Reads achievements (and existing workstreams) from a YAML or JSON file,
/// runs either a full regroup or an incremental assignment, and writes the
/// result. Progress phases can be streamed to stderr as JSON lines.
#[derive(Parser)]
#[command(name = "workstreams")]
#[command(about = "Achievement workstream clustering tool")]
#[command(version)]
pub struct Cli {
    /// Config file overriding presets and epsilon strategy (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Input file with achievements and workstreams (YAML or JSON)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON instead of YAML
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit progress events as JSON lines on stderr
    #[arg(long, global = true)]
    pub events: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the clustering parameters for a population size
    Params(ParamsCommand),
    /// Regroup all embedded achievements into new workstreams
    Recluster(ReclusterCommand),
    /// Attach unassigned achievements to existing workstreams
    Assign(AssignCommand),
    /// Recompute workstream centroids from current members
    Refresh(RefreshCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Params(cmd) => cmd.run(&cli),
        Commands::Recluster(cmd) => cmd.run(&cli),
        Commands::Assign(cmd) => cmd.run(&cli),
        Commands::Refresh(cmd) => cmd.run(&cli),
    }
}

//! Hexxagon CLI - drivers around the engine core
//!
//! ## Commands
//!
//! - `selfplay`: Generate labeled training samples from engine self-play
//! - `match`: Play engine-vs-engine games and report the results

mod match_cmd;
mod selfplay;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hexxagon")]
#[command(version, about = "Hexxagon engine driver")]
#[command(long_about = "Drivers around the Hexxagon engine core: self-play \
    sample generation for training data, and engine-vs-engine matches for \
    strength testing.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate labeled self-play samples
    Selfplay(selfplay::SelfPlayArgs),

    /// Play engine-vs-engine games and report results
    Match(match_cmd::MatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialize_logging(cli.verbose);

    dispatch_command(cli)
}

/// Initialize tracing/logging based on verbosity
fn initialize_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("hexxagon=debug,info")
    } else {
        EnvFilter::new("hexxagon=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Dispatch to the appropriate command handler
fn dispatch_command(cli: Cli) -> anyhow::Result<()> {
    let seed = cli.seed;

    match cli.command {
        Commands::Selfplay(args) => selfplay::run(args, seed),
        Commands::Match(args) => match_cmd::run(args, seed),
    }
}

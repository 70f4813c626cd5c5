//! Playwatch CLI — the main entry point.
//!
//! Commands:
//! - `watch`     — Play a scenario and stream the merged state as JSON lines
//! - `state`     — Print one player's state once
//! - `selection` — Print the current selection once
//! - `check`     — Validate config and scenario files

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "playwatch",
    about = "playwatch — follow the active media player as a stream",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario and stream the merged state as JSON lines
    Watch {
        /// Scenario file to play
        scenario: PathBuf,

        /// Ignore the suppression switch
        #[arg(long)]
        no_suppression: bool,

        /// Drop consecutive identical lines
        #[arg(long)]
        dedup: bool,

        /// Drop the artist when the title already starts with it
        #[arg(long)]
        trim_artist: bool,
    },

    /// Print one player's state once and exit
    State {
        /// Scenario file providing the players
        scenario: PathBuf,

        /// Read this player instead of the selection head
        #[arg(short, long)]
        player: Option<String>,
    },

    /// Print the current selection once and exit
    Selection {
        /// Scenario file providing the selection
        scenario: PathBuf,
    },

    /// Validate the config file and optionally a scenario
    Check {
        /// Scenario file to validate
        scenario: Option<PathBuf>,

        /// Print the default config TOML and exit
        #[arg(long)]
        print_config: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays parseable.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PLAYWATCH_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Watch {
            scenario,
            no_suppression,
            dedup,
            trim_artist,
        } => commands::watch::run(scenario, no_suppression, dedup, trim_artist).await?,
        Commands::State { scenario, player } => commands::state::run(scenario, player).await?,
        Commands::Selection { scenario } => commands::selection::run(scenario).await?,
        Commands::Check {
            scenario,
            print_config,
        } => commands::check::run(scenario, print_config).await?,
    }

    Ok(())
}

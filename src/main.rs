//! Conquest CLI - run, benchmark and replay AI games from the command line.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Conquest - a deterministic territorial conquest rules engine
#[derive(Parser, Debug)]
#[command(name = "conquest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log engine events at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a single all-AI game
    Run {
        #[command(flatten)]
        game: cli::GameOptions,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum AI steps before giving up (default: 20000)
        #[arg(long, default_value = "20000")]
        max_steps: usize,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the command recording to file
        #[arg(long)]
        save: Option<std::path::PathBuf>,

        /// Save a snapshot of the final state into this directory
        #[arg(long)]
        snapshot_dir: Option<std::path::PathBuf>,

        /// Snapshot slot name (default: last)
        #[arg(long, default_value = "last")]
        slot: String,

        /// Suppress the game banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded game
    Replay {
        /// Recording file (.json)
        #[arg(required = true)]
        recording: std::path::PathBuf,

        /// Stop at the start of this turn
        #[arg(short, long)]
        turn: Option<u32>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Run mass parallel AI games and aggregate statistics
    Tournament {
        #[command(flatten)]
        game: cli::GameOptions,

        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum AI steps per game (default: 20000)
        #[arg(long, default_value = "20000")]
        max_steps: usize,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// List the built-in maps, or validate a map file
    Maps {
        /// Map definition file (.json) to validate
        file: Option<std::path::PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "conquest=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Run {
            game,
            seed,
            max_steps,
            format,
            save,
            snapshot_dir,
            slot,
            quiet,
        } => cli::run::execute(&game, seed, max_steps, format, save, snapshot_dir, &slot, quiet),

        Commands::Replay {
            recording,
            turn,
            format,
        } => cli::replay::execute(recording, turn, format),

        Commands::Tournament {
            game,
            games,
            seed,
            threads,
            max_steps,
            format,
            progress,
        } => cli::tournament::execute(&game, games, seed, threads, max_steps, format, progress),

        Commands::Maps { file } => cli::maps::execute(file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

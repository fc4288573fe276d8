//! Katalog CLI
//!
//! Command-line file catalogue for offline storage.
//!
//! # Commands
//!
//! - `init` - Create a new catalogue file
//! - `stats` - Display catalogue statistics
//! - `volume add` - Index a mounted volume into the catalogue
//! - `volume info` - Display information about a mounted volume

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Katalog command-line file catalogue.
#[derive(Parser)]
#[command(name = "katalog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the catalogue file
    #[arg(global = true, short, long, default_value = "catalogue.db")]
    database: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new catalogue file
    Init,

    /// Display catalogue statistics
    Stats,

    /// Volume operations
    Volume {
        #[command(subcommand)]
        command: VolumeCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum VolumeCommands {
    /// Index a mounted volume into the catalogue
    Add {
        /// Directory to index, typically a mount point
        path: PathBuf,
    },

    /// Display information about the volume holding a path
    Info {
        /// Any path on the volume
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Init => commands::init::run(&cli.database),
        Commands::Stats => commands::stats::run(&cli.database),
        Commands::Volume { command } => match command {
            VolumeCommands::Add { path } => commands::volume::add(&cli.database, &path),
            VolumeCommands::Info { path } => commands::volume::info(&path),
        },
        Commands::Version => {
            println!("katalog v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

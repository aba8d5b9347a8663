//! buildctl: build progress viewer and builder instance management.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a recorded status stream in the interactive display
//! buildctl watch --input build.jsonl
//!
//! # Pipe a live stream as plain lines
//! producer | buildctl watch --progress plain
//!
//! # Remove builder instances
//! buildctl rm b1 b2 --keep-state
//! ```

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::{CreateArgs, RmArgs, WatchArgs};

/// Build progress viewer and builder instance management
#[derive(Parser, Debug)]
#[command(name = "buildctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Builder instance to act on
    #[arg(long, global = true, env = "BUILDCTL_BUILDER")]
    builder: Option<String>,

    /// Configuration directory holding instance records
    #[arg(long, global = true, env = "BUILDCTL_CONFIG")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a stream of status batches (JSON lines)
    Watch(WatchArgs),
    /// Remove builder instances
    Rm(RmArgs),
    /// Create a builder instance backed by the local driver
    Create(CreateArgs),
    /// List builder instances
    Ls,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().unwrap_or_else(commands::default_config_dir);

    let result = match cli.command {
        Command::Watch(args) => commands::watch(args).await,
        Command::Rm(args) => commands::rm(args, cli.builder, &config_dir).await,
        Command::Create(args) => commands::create(args, &config_dir).await,
        Command::Ls => commands::ls(&config_dir),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

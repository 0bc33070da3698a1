//! etpack CLI - command-line interface
//!
//! Thin shell over the `etpack` library: argument parsing, tracing sink
//! configuration and command dispatch live here, the actual work does not.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "etpack",
    version,
    about = "Release packager for Wolfenstein: Enemy Territory maps"
)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the resolved release manifest for a map
    Scan {
        /// Path to the .map source, inside <modroot>/maps/
        map: PathBuf,

        /// Also include the .map source itself in the manifest
        #[arg(long)]
        include_source: bool,
    },

    /// Parse every shader file in a scripts directory and report findings
    Shaders {
        /// Path to the scripts directory
        scripts: PathBuf,
    },

    /// Resolve a map's dependencies and build its release pk3
    Pack {
        /// Path to the .map source, inside <modroot>/maps/
        map: PathBuf,

        /// Output archive path
        #[arg(short, long)]
        output: PathBuf,

        /// Base archive to diff against (repeatable); defaults to the mod
        /// root's pak0-pak2
        #[arg(long = "base", value_name = "PK3")]
        base: Vec<PathBuf>,

        /// Also include the .map source itself in the release
        #[arg(long)]
        include_source: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Scan {
            map,
            include_source,
        } => commands::scan::run(&map, include_source),
        Command::Shaders { scripts } => commands::shaders::run(&scripts),
        Command::Pack {
            map,
            output,
            base,
            include_source,
        } => commands::pack::run(&map, &output, &base, include_source),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Configure the tracing sink. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

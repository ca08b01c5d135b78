//! Defines the command-line arguments and subcommands for the caseform CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "caseform",
    version,
    about = "Case discovery and multi-axis parametrization for test harnesses."
)]
pub struct CaseformArgs {
    /// Engine configuration file (YAML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log engine decisions at debug level. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the combined ids and marks of a manifest's provider.
    Ids {
        /// The path to the case manifest.
        #[arg(required = true)]
        manifest: PathBuf,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Combine and wrap a manifest's provider, reporting any configuration error.
    Check {
        /// The path to the case manifest.
        #[arg(required = true)]
        manifest: PathBuf,
    },
    /// Discover the cases of every `*.cases.yaml` manifest in a directory.
    Discover {
        /// The directory to walk.
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Only list cases carrying this tag.
        #[arg(long)]
        tag: Option<String>,
    },
}

//! The caseform Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::io;
use std::path::Path;
use std::process;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::cli::args::{CaseformArgs, Command};
use crate::config::EngineConfig;
use crate::diagnostics::print_error;
use crate::discovery::{CaseSource, DiscoveryOptions};
use crate::engine::Engine;
use crate::manifest::{Manifest, MANIFEST_SUFFIX};
use crate::value::Value;
use crate::{err_msg, CaseError, ErrorContext};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = CaseformArgs::parse();
    init_tracing(args.verbose);

    let result = load_engine(args.config.as_deref()).and_then(|engine| match &args.command {
        Command::Ids { manifest, json } => handle_ids(&engine, manifest, *json),
        Command::Check { manifest } => handle_check(&engine, manifest),
        Command::Discover { path, tag } => handle_discover(&engine, path, tag.as_deref()),
    });

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "caseform=debug" } else { "caseform=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_engine(config: Option<&Path>) -> Result<Engine, CaseError> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Engine::new(config)
}

fn io_error(error: io::Error) -> CaseError {
    CaseError::Manifest {
        message: "cannot write output".to_string(),
        ctx: ErrorContext::none(),
        source: Some(Box::new(error)),
    }
}

/// Handles the `ids` subcommand.
fn handle_ids(engine: &Engine, path: &Path, json: bool) -> Result<(), CaseError> {
    let manifest = Manifest::load(path)?;
    let module = manifest.module()?;
    let provider = manifest.provider(engine, &module)?.ok_or_else(|| {
        err_msg!(Manifest, "'{}' declares no provider", path.display())
    })?;
    let Some(params) = provider.params() else {
        return output::print_success(&format!("{} is not parametrized", provider.name())).map_err(io_error);
    };
    if json {
        println!("{:#}", output::ids_json(provider.name(), params));
        return Ok(());
    }
    output::print_ids(params).map_err(io_error)
}

/// Handles the `check` subcommand.
fn handle_check(engine: &Engine, path: &Path) -> Result<(), CaseError> {
    let manifest = Manifest::load(path)?;
    let module = manifest.module()?;
    let cases = engine.discover(&CaseSource::module(&module), &DiscoveryOptions::default())?;
    let entries = match manifest.provider(engine, &module)? {
        Some(provider) => provider.params().map_or(0, |p| p.len()),
        None => 0,
    };
    output::print_success(&format!(
        "{}: {} cases, {} combined entries",
        path.display(),
        cases.len(),
        entries
    ))
    .map_err(io_error)
}

/// Handles the `discover` subcommand.
fn handle_discover(engine: &Engine, root: &Path, tag: Option<&str>) -> Result<(), CaseError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            err_msg!(Manifest, "failed to walk '{}': {}", root.display(), e)
        })?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().ends_with(MANIFEST_SUFFIX)
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    debug!(root = %root.display(), manifests = paths.len(), "found manifests");

    let mut options = DiscoveryOptions::default();
    if let Some(tag) = tag {
        options = options.with_tag(Value::from(tag));
    }
    for path in paths {
        let manifest = Manifest::load(&path)?;
        let module = manifest.module()?;
        let cases = engine.discover(&CaseSource::module(&module), &options)?;
        output::print_cases(module.name(), &cases).map_err(io_error)?;
    }
    Ok(())
}

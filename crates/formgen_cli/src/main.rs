//! formgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Any failure (invalid spec, missing logo, automation error, ...)

use std::process::ExitCode;

use clap::Parser;
use formgen_core::CoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directives = if cli.verbose {
        "formgen=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "formgen=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    // a subscriber may already be installed
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::from(ExitCodes::FAILURE)
        }
    }
}

/// Known failures print as `Error:`, anything that looks like a bug as
/// `Unexpected error:`.
fn error_line(e: &anyhow::Error) -> String {
    if is_unexpected(e) {
        format!("Unexpected error: {:#}", e)
    } else {
        format!("Error: {:#}", e)
    }
}

fn is_unexpected(e: &anyhow::Error) -> bool {
    for cause in e.chain() {
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            return core.is_internal();
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return false;
        }
    }
    true
}

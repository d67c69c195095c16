// src/bin/catalyst.rs

use anyhow::Result;
use catalyst::{
    cli::{Cli, handlers},
    constants::EXIT_CODE_INTERRUPTED,
};
use clap::Parser;
use colored::*;
use std::io;

/// The main entry point of the `catalyst` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run_cli(&cli) {
        // --- Centralized Error Handling ---
        // A prompt interrupted by Ctrl+C exits silently with the shell's interrupt code.
        if is_interrupted(&e) {
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }

        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` drives the filter; `--verbose` raises this crate to `debug`.
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp(None);
    if verbose {
        builder.filter_module("catalyst", log::LevelFilter::Debug);
    }
    builder.init();
}

fn is_interrupted(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<dialoguer::Error>()
            .is_some_and(|e| matches!(e, dialoguer::Error::IO(err) if err.kind() == io::ErrorKind::Interrupted))
            || cause
                .downcast_ref::<io::Error>()
                .is_some_and(|err| err.kind() == io::ErrorKind::Interrupted)
    })
}

/// Routes to the extraction handler when `--extract` names a workflow, otherwise starts the wizard.
fn run_cli(cli: &Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    match cli.extract_workflow() {
        Some(workflow) => handlers::extract::handle(cli, workflow),
        None => handlers::wizard::handle(cli),
    }
}

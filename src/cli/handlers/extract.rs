// src/cli/handlers/extract.rs

use anyhow::{Context, Result};

use crate::{
    cli::Cli,
    core::{config_loader, extractor},
};

/// The handler for `--extract`: prints the static matrices of one workflow to stdout.
pub fn handle(cli: &Cli, workflow_key: &str) -> Result<()> {
    let (path, config) = config_loader::load_validated(cli.config.as_deref())
        .context(t!("cli.error.loading"))?;
    log::debug!(
        "Extracting '{}' from {} as {}",
        workflow_key,
        path.display(),
        cli.format
    );

    let output = extractor::extract(&config, workflow_key, &cli.format)
        .context(t!("extract.error.failed"))?;

    if output.ends_with('\n') {
        print!("{}", output);
    } else {
        println!("{}", output);
    }
    Ok(())
}

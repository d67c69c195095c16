// src/system/github.rs

use crate::{
    constants::GH_PROGRAM,
    models::MatrixRecord,
    system::executor::{self, ExecutionError},
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("error marshaling payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("failed to trigger GitHub workflow: {0}")]
    Execution(#[from] ExecutionError),
    #[error("failed to write payload file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returned when `gh` cannot be started.
#[derive(Error, Debug)]
#[error(
    "GitHub CLI (gh) is not installed or not in your PATH. Please install it from \
     https://cli.github.com/manual/installation and run 'gh auth login' before using Catalyst"
)]
pub struct GhNotInstalled;

/// Everything needed to dispatch one workflow with its matrices.
#[derive(Debug, Clone, Copy)]
pub struct TriggerRequest<'a> {
    pub repository: &'a str,
    pub workflow_key: &'a str,
    pub workflow_file: &'a str,
    pub matrices: &'a [MatrixRecord],
    pub change_log: &'a str,
    pub branch_name: &'a str,
}

/// The seam between dispatch logic and the mechanism that starts a workflow run.
pub trait WorkflowTrigger: Send + Sync {
    fn trigger(&self, request: &TriggerRequest<'_>) -> Result<(), TriggerError>;
}

/// Serializes the matrices as the `payload` input expected by the workflows.
pub fn payload_json(matrices: &[MatrixRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&json!({ "matrices": matrices }))
}

/// Builds the argument vector for `gh workflow run`.
pub fn build_trigger_args(request: &TriggerRequest<'_>) -> Result<Vec<String>, serde_json::Error> {
    let payload = payload_json(request.matrices)?;
    Ok(vec![
        "workflow".to_string(),
        "run".to_string(),
        request.workflow_file.to_string(),
        "--repo".to_string(),
        request.repository.to_string(),
        "--ref".to_string(),
        request.branch_name.to_string(),
        "--raw-field".to_string(),
        format!("payload={}", payload),
        "--raw-field".to_string(),
        format!("change_log={}", request.change_log),
    ])
}

/// Triggers workflows through the GitHub CLI.
#[derive(Debug, Clone, Default)]
pub struct GhCli;

impl WorkflowTrigger for GhCli {
    fn trigger(&self, request: &TriggerRequest<'_>) -> Result<(), TriggerError> {
        let args = build_trigger_args(request)?;
        log::info!(
            "Triggering '{}' ({}) on {}@{} with {} matrix record(s)",
            request.workflow_key,
            request.workflow_file,
            request.repository,
            request.branch_name,
            request.matrices.len()
        );
        executor::execute_and_capture_output(GH_PROGRAM, &args)?;
        Ok(())
    }
}

/// Verifies that `gh` can be spawned.
pub fn ensure_gh_installed() -> Result<(), GhNotInstalled> {
    match executor::execute_and_capture_output(GH_PROGRAM, &["--version".to_string()]) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::debug!("gh --version failed: {}", e);
            Err(GhNotInstalled)
        }
    }
}

/// Writes each dispatch request to a JSON file instead of triggering it.
#[derive(Debug, Clone)]
pub struct PayloadWriter {
    output_dir: PathBuf,
}

impl PayloadWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The file a request is written to: `<workflow>-<owner>-<repo>.json`.
    pub fn payload_path(&self, request: &TriggerRequest<'_>) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}.json",
            request.workflow_key,
            request.repository.replace('/', "-")
        ))
    }
}

impl WorkflowTrigger for PayloadWriter {
    fn trigger(&self, request: &TriggerRequest<'_>) -> Result<(), TriggerError> {
        let content = json!({
            "workflowFile": request.workflow_file,
            "branch": request.branch_name,
            "matrices": request.matrices,
            "change_log": request.change_log,
        });
        let bytes = serde_json::to_vec_pretty(&content)?;

        let write_err = |path: &Path, source: std::io::Error| TriggerError::Write {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.output_dir).map_err(|e| write_err(&self.output_dir, e))?;

        let path = self.payload_path(request);
        fs::write(&path, bytes).map_err(|e| write_err(&path, e))?;
        log::info!("Wrote payload for '{}' to {}", request.workflow_key, path.display());
        Ok(())
    }
}

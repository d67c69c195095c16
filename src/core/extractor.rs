// src/core/extractor.rs

use crate::{
    core::interpolator,
    models::{Configuration, MatrixRecord, OutputFormat, UnknownFormat},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Format(#[from] UnknownFormat),
    #[error("workflow '{workflow}' not found in configuration. Available workflows: {}", .available.join(", "))]
    UnknownWorkflow {
        workflow: String,
        available: Vec<String>,
    },
    #[error("error marshaling to JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("error marshaling to YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Serialize, Debug)]
struct ExtractOutput<'a> {
    matrices: &'a [MatrixRecord],
}

/// Collects the static parameters of every environment that targets `workflow_key`.
///
/// The whole tree is walked in declaration order, independent of any selection.
/// Parameters whose string value contains an input placeholder are dropped,
/// since they only make sense once an operator supplies values.
pub fn extract_workflow_matrices(
    config: &Configuration,
    workflow_key: &str,
) -> Result<Vec<MatrixRecord>, ExtractError> {
    if !config.github.workflows.contains_key(workflow_key) {
        return Err(ExtractError::UnknownWorkflow {
            workflow: workflow_key.to_string(),
            available: config.workflow_keys(),
        });
    }

    let matrices = config
        .matrix
        .values()
        .flat_map(|platforms| platforms.values())
        .flat_map(|environments| environments.values())
        .filter(|spec| spec.workflow == workflow_key)
        .map(|spec| {
            spec.parameters
                .iter()
                .filter(|(_, value)| !matches!(value, Value::String(s) if interpolator::has_placeholder(s)))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<MatrixRecord>()
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Extracted {} matrix record(s) for workflow '{}'",
        matrices.len(),
        workflow_key
    );
    Ok(matrices)
}

/// Serializes the records as `{ "matrices": [...] }`.
pub fn format_output(matrices: &[MatrixRecord], format: OutputFormat) -> Result<String, ExtractError> {
    let output = ExtractOutput { matrices };
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&output)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&output)?),
    }
}

/// Runs a full extraction: validates the format first, then the workflow key.
pub fn extract(config: &Configuration, workflow_key: &str, format: &str) -> Result<String, ExtractError> {
    let format: OutputFormat = format.parse()?;
    let matrices = extract_workflow_matrices(config, workflow_key)?;
    if matrices.is_empty() {
        log::warn!("No matrices found for workflow '{}'", workflow_key);
    }
    format_output(&matrices, format)
}

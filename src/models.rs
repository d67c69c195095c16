// src/models.rs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- CONFIGURATION MODELS (What is read from `catalyst.yaml`) ---

/// The deserialized structure of a configuration file.
///
/// Every map keeps declaration order, which is the order used for display
/// and for every derived list (apps, platforms, environments, inputs).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub inputs: IndexMap<String, InputDef>,
    #[serde(default)]
    pub matrix: AppTree,
}

/// `app -> platform -> environment -> spec`.
pub type AppTree = IndexMap<String, PlatformTree>;

/// `platform -> environment -> spec`.
pub type PlatformTree = IndexMap<String, EnvironmentTree>;

/// `environment -> spec`.
pub type EnvironmentTree = IndexMap<String, EnvironmentSpec>;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct GitHubConfig {
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub workflows: IndexMap<String, WorkflowDef>,
}

/// A workflow that can be dispatched: a display name and the workflow file in the repository.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file: String,
}

/// An operator-supplied value referenced by parameters through placeholders.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDef {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: String,
}

/// The leaf of the matrix tree: which workflow to trigger and with what parameters.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSpec {
    #[serde(default)]
    pub workflow: String,
    #[serde(default, rename = "matrix", alias = "parameters")]
    pub parameters: IndexMap<String, Value>,
}

impl Configuration {
    /// All configured apps, in declaration order.
    pub fn apps(&self) -> Vec<String> {
        self.matrix.keys().cloned().collect()
    }

    /// Returns the display name of a workflow, falling back to its key.
    pub fn workflow_display_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self.github.workflows.get(key) {
            Some(def) if !def.name.is_empty() => &def.name,
            _ => key,
        }
    }

    /// Declared workflow keys, in declaration order.
    pub fn workflow_keys(&self) -> Vec<String> {
        self.github.workflows.keys().cloned().collect()
    }
}

// --- RESOLUTION OUTPUT ---

/// One resolved parameter set. Keys keep the order in which they were inserted:
/// provenance keys first (metadata projection), then parameters in declaration order.
pub type MatrixRecord = IndexMap<String, Value>;

/// `workflow_key -> records`, groups ordered by first appearance.
pub type WorkflowGroups = IndexMap<String, Vec<MatrixRecord>>;

// --- OUTPUT FORMAT ---

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid format '{0}'. Supported formats: json, yaml")]
pub struct UnknownFormat(pub String);

/// Serialization format of the `--extract` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

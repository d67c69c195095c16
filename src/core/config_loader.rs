//! # Config Loader
//!
//! Locates, parses and validates the configuration file. Everything downstream
//! (the wizard, the matrix engine, the extractor) assumes the invariants checked
//! here: a repository is set, at least one workflow is declared, every app has
//! platforms, every platform has environments, and every environment names a
//! declared workflow.
use crate::{
    constants::{CONFIG_DIR_NAME, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILENAME},
    models::Configuration,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to expand config path '{0}': {1}")]
    PathExpansion(String, String),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("GitHub repository is required")]
    MissingRepository,
    #[error("at least one workflow is required")]
    NoWorkflows,
    #[error("at least one app is required in matrix")]
    NoApps,
    #[error("app {0} has no platforms")]
    NoPlatforms(String),
    #[error("app {app} platform {platform} has no environments")]
    NoEnvironments { app: String, platform: String },
    #[error("app {app} platform {platform} environment {environment} has no workflow")]
    MissingWorkflow {
        app: String,
        platform: String,
        environment: String,
    },
    #[error(
        "app {app} platform {platform} environment {environment} references unknown workflow {workflow}"
    )]
    UnknownWorkflow {
        app: String,
        platform: String,
        environment: String,
        workflow: String,
    },
}

type ConfigResult<T> = Result<T, ConfigError>;

/// Decides which file to load.
///
/// Precedence: the explicit path (with `~` and environment variables expanded),
/// then `env_override` (the value of `CATALYST_CONFIG`), then `catalyst.yaml` in
/// `cwd` if it exists, then `<config dir>/catalyst/catalyst.yaml`.
pub fn resolve_config_path(
    explicit: Option<&str>,
    env_override: Option<String>,
    cwd: &Path,
) -> ConfigResult<PathBuf> {
    if let Some(raw) = explicit.filter(|p| !p.trim().is_empty()) {
        let expanded = shellexpand::full(raw)
            .map_err(|e| ConfigError::PathExpansion(raw.to_string(), e.to_string()))?;
        return Ok(PathBuf::from(expanded.into_owned()));
    }

    if let Some(path) = env_override.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let local = cwd.join(DEFAULT_CONFIG_FILENAME);
    if local.exists() {
        return Ok(local);
    }

    match dirs::config_dir() {
        Some(dir) => Ok(dir.join(CONFIG_DIR_NAME).join(DEFAULT_CONFIG_FILENAME)),
        None => Ok(local),
    }
}

/// Resolves the configuration path from the process environment.
pub fn discover_config_path(explicit: Option<&str>) -> ConfigResult<PathBuf> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_config_path(explicit, env::var(CONFIG_ENV_VAR).ok(), &cwd)
}

/// Parses configuration text. `.toml` files use TOML, anything else is read as YAML.
pub fn parse_config(content: &str, path: &Path) -> ConfigResult<Configuration> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        Ok(toml::from_str(content)?)
    } else {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Reads and parses the configuration at `path` without validating it.
pub fn load(path: &Path) -> ConfigResult<Configuration> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = parse_config(&content, path)?;

    let shown = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    log::debug!(
        "Loaded configuration from {}: {} app(s), {} workflow(s), {} input(s)",
        shown.display(),
        config.matrix.len(),
        config.github.workflows.len(),
        config.inputs.len()
    );
    Ok(config)
}

/// Checks the structural invariants every other component relies on.
pub fn validate(config: &Configuration) -> ConfigResult<()> {
    if config.github.repository.trim().is_empty() {
        return Err(ConfigError::MissingRepository);
    }
    if config.github.workflows.is_empty() {
        return Err(ConfigError::NoWorkflows);
    }
    if config.matrix.is_empty() {
        return Err(ConfigError::NoApps);
    }

    for (app, platforms) in &config.matrix {
        if platforms.is_empty() {
            return Err(ConfigError::NoPlatforms(app.clone()));
        }
        for (platform, environments) in platforms {
            if environments.is_empty() {
                return Err(ConfigError::NoEnvironments {
                    app: app.clone(),
                    platform: platform.clone(),
                });
            }
            for (environment, spec) in environments {
                if spec.workflow.is_empty() {
                    return Err(ConfigError::MissingWorkflow {
                        app: app.clone(),
                        platform: platform.clone(),
                        environment: environment.clone(),
                    });
                }
                if !config.github.workflows.contains_key(&spec.workflow) {
                    return Err(ConfigError::UnknownWorkflow {
                        app: app.clone(),
                        platform: platform.clone(),
                        environment: environment.clone(),
                        workflow: spec.workflow.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Locates, loads and validates the configuration in one step.
pub fn load_validated(explicit: Option<&str>) -> ConfigResult<(PathBuf, Configuration)> {
    let path = discover_config_path(explicit)?;
    let config = load(&path)?;
    validate(&config)?;
    Ok((path, config))
}

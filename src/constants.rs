// src/constants.rs

/// The default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "catalyst.yaml";

/// The name of the directory holding the configuration under the user's config dir.
pub const CONFIG_DIR_NAME: &str = "catalyst";

/// Environment variable that overrides the configuration path.
pub const CONFIG_ENV_VAR: &str = "CATALYST_CONFIG";

/// Matches an input placeholder such as `${{ input.version }}`, capturing the input name.
pub const INPUT_PLACEHOLDER_PATTERN: &str = r"\$\{\{\s*input\.([A-Za-z0-9_-]+)\s*\}\}";

/// Provenance key for the application in metadata records.
pub const APP_KEY: &str = "app";

/// Provenance key for the platform in metadata records.
pub const PLATFORM_KEY: &str = "platform";

/// Provenance key for the environment in metadata records.
pub const ENVIRONMENT_KEY: &str = "environment";

/// Branch proposed when the input form is opened for the first time.
pub const DEFAULT_BRANCH: &str = "main";

/// Longest change log accepted by the input stage, in characters.
pub const CHANGE_LOG_MAX_CHARS: usize = 400;

/// The external CLI used to trigger workflows.
pub const GH_PROGRAM: &str = "gh";

/// Prefix of the directory created by `--dry-run` when no output directory is given.
pub const PAYLOAD_DIR_PREFIX: &str = "catalyst-payloads";

/// Exit code used when the user interrupts the program (Ctrl+C).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

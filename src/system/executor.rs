// src/system/executor.rs

use std::io::ErrorKind;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' was not found in PATH.")]
    NotFound(String),
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with status {status}, output: {output}")]
    NonZeroExitStatus {
        command: String,
        status: String,
        output: String,
    },
}

/// The captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    /// Stdout and stderr joined, trimmed, the way an operator would read them in a terminal.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (_, true) => stdout.to_string(),
            _ => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Runs `program` with `args` to completion and captures both output streams.
///
/// Arguments are passed verbatim (no shell is involved), so values such as a
/// JSON payload or a multi-line change log never need quoting.
/// A non-zero exit status is an error that carries the combined output.
pub fn execute_and_capture_output(
    program: &str,
    args: &[String],
) -> Result<CapturedOutput, ExecutionError> {
    if program.trim().is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    log::debug!("Executing: {} {:?}", program, args);

    let output = StdCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExecutionError::NotFound(program.to_string()),
            _ => ExecutionError::CommandFailed(program.to_string(), e),
        })?;

    let captured = CapturedOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: format!("{} {}", program, args.first().map_or("", String::as_str))
                .trim_end()
                .to_string(),
            status: output.status.to_string(),
            output: captured.combined(),
        });
    }

    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output_joins_streams() {
        let out = CapturedOutput {
            stdout: "ok\n".into(),
            stderr: "warn\n".into(),
        };
        assert_eq!(out.combined(), "ok\nwarn");

        let only_err = CapturedOutput {
            stdout: String::new(),
            stderr: " boom ".into(),
        };
        assert_eq!(only_err.combined(), "boom");
    }

    #[test]
    fn test_empty_program_is_rejected() {
        let result = execute_and_capture_output("  ", &[]);
        assert!(matches!(result, Err(ExecutionError::EmptyCommand)));
    }

    #[test]
    fn test_missing_program_is_reported_as_not_found() {
        let result = execute_and_capture_output("catalyst-no-such-binary-xyz", &[]);
        assert!(matches!(result, Err(ExecutionError::NotFound(_))));
    }
}

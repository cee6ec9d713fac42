pub mod agents;
pub mod call;
pub mod config;
pub mod reconcile;
pub mod tools;

use crate::error::CliError;

/// What a command prints and the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
    /// Print to stderr instead of stdout
    pub is_error: bool,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            output: output.into(),
            is_error: false,
        }
    }

    /// Regular output with a non-zero exit code
    pub fn with_exit_code(exit_code: u8, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
            is_error: false,
        }
    }

    pub fn failure(err: &CliError) -> Self {
        Self {
            exit_code: err.exit_code(),
            output: format!("error: {}", err),
            is_error: true,
        }
    }
}

impl From<Result<CommandResult, CliError>> for CommandResult {
    fn from(result: Result<CommandResult, CliError>) -> Self {
        match result {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "command failed");
                Self::failure(&err)
            }
        }
    }
}

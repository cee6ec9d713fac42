//! CLI-specific error types

use dsta_core::{ConfigError, RegistryError, ToolError};
use dsta_google_api::GoogleApiError;
use thiserror::Error;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_MISMATCH: u8 = 3;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Config file or environment could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A toolset needs a setting that is not configured
    #[error("Missing setting: {0}")]
    MissingSetting(String),

    /// A client or credential provider could not be built
    #[error("Google API setup failed: {0}")]
    Google(#[from] GoogleApiError),

    /// The tool ran and failed
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Unknown agent '{name}'. Available agents: {known}")]
    UnknownAgent { name: String, known: String },

    #[error("Unknown tool '{0}'. Run `dsta tools` to list them.")]
    UnknownTool(String),

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (stdin, stdout)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 3 for a refused write, 2 for caller mistakes, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Tool(err) if err.is_mismatch() => EXIT_MISMATCH,
            Self::Tool(err) if err.is_validation() => EXIT_USAGE,
            Self::Config(_)
            | Self::MissingSetting(_)
            | Self::UnknownAgent { .. }
            | Self::UnknownTool(_)
            | Self::InvalidInput(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::Tool(ToolError::Mismatch("x".into())).exit_code(),
            EXIT_MISMATCH
        );
        assert_eq!(
            CliError::Tool(ToolError::validation("bad")).exit_code(),
            EXIT_USAGE
        );
        assert_eq!(CliError::Tool(ToolError::api("down")).exit_code(), EXIT_FAILURE);
        assert_eq!(CliError::UnknownTool("x".into()).exit_code(), EXIT_USAGE);
    }
}

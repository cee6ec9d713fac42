//! Top-level error type for dsta operations
//!
//! Flattens tool, configuration and registry failures into the categories a
//! caller acts on.

use thiserror::Error;

use crate::config::ConfigError;
use crate::tool::ToolError;
use crate::toolset::RegistryError;

/// Top-level error type
///
/// - [`Error::Config`] - fix the configuration file or environment
/// - [`Error::Validation`] - the caller passed bad arguments
/// - [`Error::NotFound`] - the campaign, tool or document does not exist
/// - [`Error::Mismatch`] - sheet and SA360 disagree, the write was refused
/// - [`Error::Api`] - a vendor API call failed
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("reconciliation failed: {0}")]
    Mismatch(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ToolError> for Error {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Validation(msg) => Self::Validation(msg),
            ToolError::NotFound(msg) => Self::NotFound(msg),
            ToolError::Mismatch(msg) => Self::Mismatch(msg),
            ToolError::Api(msg) => Self::Api(msg),
            ToolError::Serialization(e) => Self::Other(e.to_string()),
            ToolError::Custom(msg) => Self::Other(msg),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownToolset(_) => Self::NotFound(err.to_string()),
            RegistryError::DuplicateTool { .. } => Self::Config(err.to_string()),
        }
    }
}

/// Result type alias for dsta operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_categories_survive() {
        assert!(Error::from(ToolError::Mismatch("x".into())).is_mismatch());
        assert!(Error::from(ToolError::not_found("gone")).is_not_found());
        assert!(matches!(
            Error::from(ToolError::validation("bad")),
            Error::Validation(m) if m == "bad"
        ));
    }

    #[test]
    fn test_config_error_message() {
        let err = Error::from(ConfigError::Validation("nope".into()));
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "configuration error: configuration validation failed: nope"
        );
    }

    #[test]
    fn test_unknown_toolset_is_not_found() {
        let err = Error::from(RegistryError::UnknownToolset("ads".into()));
        assert!(err.is_not_found());
    }
}

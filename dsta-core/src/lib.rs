//! # dsta-core
//!
//! Building blocks shared by the DSTA campaign agents: the [`Tool`] trait and
//! its object-safe [`DynTool`] form, [`Toolset`]s and the [`ToolRegistry`],
//! the [`AppConfig`] loader and the built-in [`AgentDefinition`]s.
//!
//! ## Defining a tool
//!
//! ```ignore
//! use dsta_core::{Tool, ToolError, ToolResult};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct PingInput {
//!     /// Text to echo back
//!     text: String,
//! }
//!
//! struct Ping;
//!
//! impl Tool for Ping {
//!     type Input = PingInput;
//!
//!     fn name(&self) -> &str { "ping" }
//!     fn description(&self) -> &str { "Echo text back" }
//!
//!     async fn execute(&self, input: PingInput) -> Result<ToolResult, ToolError> {
//!         Ok(input.text.into())
//!     }
//! }
//! ```
//!
//! Agents refer to tools through named toolsets. A host runtime receives the
//! [`ToolDefinition`]s from a [`ToolRegistry`] and calls back into
//! [`ToolRegistry::call`].

pub mod agent;
pub mod config;
pub mod error;
pub mod presentation;
pub mod tool;
pub mod toolset;

pub use agent::{builtin_agents, decision_agent, sa360_agent, AgentDefinition};
pub use config::{AppConfig, AuthMode, ConfigError, LoadOptions, LogFormat};
pub use error::{Error, Result};
pub use presentation::Presentation;
pub use tool::{box_tool, DynTool, Tool, ToolDefinition, ToolError, ToolResult};
pub use toolset::{RegistryError, ToolRegistry, Toolset};

/// Common imports for tool implementations
pub mod prelude {
    pub use crate::box_tools;
    pub use crate::tool::{box_tool, DynTool, Tool, ToolError, ToolResult};
    pub use crate::toolset::Toolset;
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
}

//! Named groups of tools and the registry an agent draws them from.

use std::collections::BTreeMap;

use crate::tool::{DynTool, ToolDefinition, ToolError, ToolResult};
use serde_json::Value;

/// A named group of tools handed to an agent as a unit.
///
/// Toolsets hold cheap, clonable handles to their API clients, so `tools()`
/// may be called as often as a host needs fresh boxed tools.
pub trait Toolset: Send + Sync {
    /// Name the agent definitions refer to (e.g. "google_ads_getter")
    fn name(&self) -> &str;

    /// Build the tools in this set
    fn tools(&self) -> Vec<Box<dyn DynTool>>;
}

/// Errors raised while assembling tools into a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{tool}' from toolset '{toolset}' is already registered by toolset '{existing}'")]
    DuplicateTool {
        tool: String,
        toolset: String,
        existing: String,
    },

    #[error("unknown toolset '{0}'")]
    UnknownToolset(String),
}

/// Tools collected from one or more toolsets, addressable by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, (String, Box<dyn DynTool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every tool of a toolset. Tool names must be unique across toolsets.
    pub fn register(&mut self, toolset: &dyn Toolset) -> Result<(), RegistryError> {
        for tool in toolset.tools() {
            let name = tool.name().to_string();
            if let Some((existing, _)) = self.tools.get(&name) {
                return Err(RegistryError::DuplicateTool {
                    tool: name,
                    toolset: toolset.name().to_string(),
                    existing: existing.clone(),
                });
            }
            self.tools.insert(name, (toolset.name().to_string(), tool));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|(_, tool)| tool.as_ref())
    }

    /// Name of the toolset a tool came from
    pub fn toolset_of(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|(set, _)| set.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|(_, tool)| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name with raw JSON input
    pub async fn call(&self, name: &str, input: Value) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(format!("Tool '{}' is not registered.", name)))?;

        tracing::debug!(tool = name, "executing tool");
        let result = tool.execute_raw(input).await;
        if let Err(err) = &result {
            tracing::error!(tool = name, error = %err, "tool execution failed");
        }
        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

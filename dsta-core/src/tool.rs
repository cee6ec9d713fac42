use std::future::Future;
use std::pin::Pin;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::presentation::{render_call, render_result, Presentation};

/// What a tool hands back to the agent.
///
/// Mutations answer with a short confirmation; reads return the payload the
/// platform sent, reshaped where the agent needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolResult {
    Text(String),
    Json(Value),
}

impl ToolResult {
    pub fn json<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// The text, or compact JSON
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Text(_) => None,
        }
    }
}

impl From<String> for ToolResult {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ToolResult {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Value> for ToolResult {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

/// Why a tool call failed. The message is what the agent sees.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Input rejected before any remote call was made
    #[error("{0}")]
    Validation(String),

    /// The requested campaign, row, column or document does not exist
    #[error("{0}")]
    NotFound(String),

    /// The advertising platform, sheet or document store returned an error
    #[error("{0}")]
    Api(String),

    /// The sheet mirror and the live campaign disagree
    #[error("{0}")]
    Mismatch(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl ToolError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Raised before touching any remote system
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

/// A tool as offered to a model: name, description and input schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A single agent capability with a typed input.
///
/// The input type's doc comments become the field descriptions of the
/// generated schema, so they are written for the model.
///
/// ```rust
/// use dsta_core::{Tool, ToolError, ToolResult};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct MicrosInput {
///     /// Amount in account currency
///     amount: f64,
/// }
///
/// struct ToMicros;
///
/// impl Tool for ToMicros {
///     type Input = MicrosInput;
///
///     fn name(&self) -> &str { "to_micros" }
///     fn description(&self) -> &str { "Convert a currency amount to micros" }
///
///     async fn execute(&self, input: MicrosInput) -> Result<ToolResult, ToolError> {
///         let micros = (input.amount * 1_000_000.0).round() as i64;
///         Ok(micros.to_string().into())
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    type Input: DeserializeOwned + JsonSchema;

    /// Snake-case name the model calls, e.g. `update_campaign_status`
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<ToolResult, ToolError>> + Send;

    fn input_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(Self::Input)).unwrap_or(Value::Null)
    }

    fn format_call(&self, params: &Value, style: Presentation) -> String {
        render_call(style, self.name(), params)
    }

    fn format_result(&self, result: &ToolResult, style: Presentation) -> String {
        render_result(style, result)
    }
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send + 'a>>;

/// Type-erased [`Tool`] taking raw JSON input. Obtain one with [`box_tool`].
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;

    /// Deserialize `input` into the tool's input type and run it. Malformed
    /// input is a [`ToolError::Validation`].
    fn execute_raw(&self, input: Value) -> ToolFuture<'_>;

    fn format_call(&self, params: &Value, style: Presentation) -> String;
    fn format_result(&self, result: &ToolResult, style: Presentation) -> String;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

pub fn box_tool<T: Tool + 'static>(tool: T) -> Box<dyn DynTool> {
    Box::new(Erased(tool))
}

/// `Vec<Box<dyn DynTool>>` from tools of different types.
///
/// ```ignore
/// let tools = box_tools![
///     GetCampaignDetailsTool::new(ads.clone()),
///     GetGeoTargetsTool::new(ads),
/// ];
/// ```
#[macro_export]
macro_rules! box_tools {
    ($($tool:expr),* $(,)?) => {
        vec![$($crate::tool::box_tool($tool)),*]
    };
}

struct Erased<T>(T);

impl<T: Tool + 'static> DynTool for Erased<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn input_schema(&self) -> Value {
        self.0.input_schema()
    }

    fn execute_raw(&self, input: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let input: T::Input = serde_json::from_value(input).map_err(|e| {
                ToolError::Validation(format!("Invalid input for {}: {}", self.0.name(), e))
            })?;
            self.0.execute(input).await
        })
    }

    fn format_call(&self, params: &Value, style: Presentation) -> String {
        self.0.format_call(params, style)
    }

    fn format_result(&self, result: &ToolResult, style: Presentation) -> String {
        self.0.format_result(result, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_error_kinds() {
        assert!(ToolError::validation("bad").is_validation());
        assert!(ToolError::not_found("gone").is_not_found());
        assert!(ToolError::Mismatch("differs".into()).is_mismatch());
        assert_eq!(ToolError::api("boom").to_string(), "boom");
    }

    #[test]
    fn test_tool_result_as_json() {
        let result: ToolResult = json!({"suggestions": []}).into();
        assert!(result.as_json().is_some());
        assert!(result.as_str().is_none());
    }
}

use std::io::Read;

use dsta_core::config::AppConfig;
use dsta_core::{Presentation, ToolResult};
use serde_json::Value;

use super::CommandResult;
use crate::bootstrap::{build_registry, toolset_for_tool, AuthSource};
use crate::error::CliError;

/// How `dsta call` renders a result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputStyle {
    Ansi,
    Plain,
    /// The untruncated result: pretty JSON, or the text as is
    Raw,
}

/// Tool input from `--input`: inline JSON, `-` for stdin, or `{}` when absent.
pub fn parse_input<R: Read>(raw: Option<&str>, mut stdin: R) -> Result<Value, CliError> {
    let text = match raw {
        None => return Ok(Value::Object(Default::default())),
        Some("-") => {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf)?;
            buf
        }
        Some(inline) => inline.to_string(),
    };
    let value: Value =
        serde_json::from_str(&text).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    if !value.is_object() {
        return Err(CliError::InvalidInput(
            "tool input must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

fn raw(result: &ToolResult) -> Result<String, CliError> {
    Ok(match result {
        ToolResult::Text(text) => text.clone(),
        ToolResult::Json(value) => serde_json::to_string_pretty(value)?,
    })
}

/// Build only the toolset that owns `tool`, with real credentials, and run it.
pub async fn run(
    config: &AppConfig,
    tool: &str,
    input: Value,
    style: OutputStyle,
    auth: &AuthSource,
) -> Result<CommandResult, CliError> {
    let toolset = toolset_for_tool(config, tool)?;
    let registry = build_registry(config, &[toolset.as_str()], auth)?;
    let handle = registry
        .get(tool)
        .ok_or_else(|| CliError::UnknownTool(tool.to_string()))?;

    tracing::info!(tool, %toolset, "calling tool");
    let result = registry.call(tool, input).await?;

    let output = match style {
        OutputStyle::Ansi => handle.format_result(&result, Presentation::Ansi),
        OutputStyle::Plain => handle.format_result(&result, Presentation::Plain),
        OutputStyle::Raw => raw(&result)?,
    };
    Ok(CommandResult::success(output))
}

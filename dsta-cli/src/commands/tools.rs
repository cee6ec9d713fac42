use dsta_core::config::AppConfig;

use super::agents::find_agent;
use super::CommandResult;
use crate::bootstrap::{build_registry, AuthSource, ALL_TOOLSETS};
use crate::error::CliError;

/// List tools, or with `json` export the definitions a host runtime registers.
pub fn run(config: &AppConfig, agent: Option<&str>, json: bool) -> Result<CommandResult, CliError> {
    let registry = match agent {
        Some(name) => {
            let agent = find_agent(config, name)?;
            build_registry(config, agent.toolsets.as_slice(), &AuthSource::Describe)?
        }
        None => build_registry(config, ALL_TOOLSETS, &AuthSource::Describe)?,
    };

    if json {
        let definitions = serde_json::to_string_pretty(&registry.definitions())?;
        return Ok(CommandResult::success(definitions));
    }

    let lines: Vec<String> = registry
        .definitions()
        .into_iter()
        .map(|def| {
            let toolset = registry.toolset_of(&def.name).unwrap_or_default();
            format!("{:<34} [{}] {}", def.name, toolset, def.description)
        })
        .collect();
    Ok(CommandResult::success(lines.join("\n")))
}

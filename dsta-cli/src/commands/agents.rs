use dsta_core::config::AppConfig;
use dsta_core::{builtin_agents, AgentDefinition};

use super::CommandResult;
use crate::bootstrap::{agent_registry, AuthSource};
use crate::error::CliError;

/// Look an agent up by name, listing the known ones on a miss.
pub fn find_agent(config: &AppConfig, name: &str) -> Result<AgentDefinition, CliError> {
    let mut agents = builtin_agents(&config.agents);
    agents.remove(name).ok_or_else(|| CliError::UnknownAgent {
        name: name.to_string(),
        known: agents.keys().cloned().collect::<Vec<_>>().join(", "),
    })
}

pub fn list(config: &AppConfig) -> CommandResult {
    let lines: Vec<String> = builtin_agents(&config.agents)
        .values()
        .map(|agent| {
            format!(
                "{:<14} {:<18} {}",
                agent.name,
                agent.model,
                agent.toolsets.join(", ")
            )
        })
        .collect();
    CommandResult::success(lines.join("\n"))
}

pub fn show(config: &AppConfig, name: &str) -> Result<CommandResult, CliError> {
    let agent = find_agent(config, name)?;
    let registry = agent_registry(config, &agent, &AuthSource::Describe)?;

    let mut out = vec![
        format!("name:     {}", agent.name),
        format!("model:    {}", agent.model),
        format!("toolsets: {}", agent.toolsets.join(", ")),
        "tools:".to_string(),
    ];
    out.extend(registry.names().iter().map(|tool| format!("  - {}", tool)));
    out.push("instruction:".to_string());
    out.extend(agent.instruction.lines().map(|line| format!("  {}", line)));

    Ok(CommandResult::success(out.join("\n")))
}

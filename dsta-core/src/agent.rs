//! Agent definitions handed to a host agent runtime.
//!
//! An agent is a model, an instruction and the toolsets it may call. Running
//! the conversation loop is the host's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::AgentOverride;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub const DECISION_AGENT: &str = "decision_agent";
pub const SA360_AGENT: &str = "sa360_agent";

const DECISION_INSTRUCTION: &str = r#"You are a Marketing Campaign Manager responsible for deciding marketing campaign actions based on external signals, Firestore configuration, and a list of geographic locations.
Your configuration is stored in Firestore.

1.  First, you will be prompted for the customer ID you are working for.
2.  Using the `get_firestore_document` tool, read the document with that ID from the `GoogleAdsConfig` collection.
3.  The customer document contains a `campaigns` map field. Iterate through the values of this map. Each value represents a campaign and contains an `instruction`.
4.  The customer document also has a `locations` subcollection. Read it with `list_firestore_documents` on `GoogleAdsConfig/<customer_id>/locations`.
5.  For each campaign from the `campaigns` map:
    a.  Read the campaign's `instruction` field. This is the high-level logic you will apply (e.g., "If pollen count is high, pause ads").
    b.  Iterate through each location document.
    c.  For each location, extract its `lat` and `lng`.
    d.  Use `get_external_signal` with the `lat` and `lng` to get real-time external data (like pollen levels or weather forecasts) for that location. `list_external_signal_apis` names the available sources.
    e.  Apply the campaign's `instruction` to the data you just retrieved to make a decision.
    f.  If the decision requires an action, use the Google Ads tools to make the change (pausing the campaign, adjusting the budget, modifying geo-targeting).
6.  After processing all locations for all campaigns, respond with a clear summary of all the actions you have taken and the reasoning behind them."#;

const SA360_INSTRUCTION: &str = r#"You manage Search Ads 360 campaigns through the Google Sheet that is bulk-synced into SA360.

1.  Ask for the campaign ID, the SA360 customer ID (10 digits), the Google Sheet ID and the sheet name if you do not have them.
2.  Use `get_sa360_campaign_details` and `get_sa360_campaign_details_sheet` to inspect the live campaign and its sheet row.
3.  To change the campaign, use `update_sa360_campaign_status`, `update_sa360_campaign_budget` or `update_sa360_campaign_geolocation`. Status must be ENABLED or PAUSED.
4.  Every update first checks that the sheet row matches the live campaign. If it reports a data mismatch, do not retry. Report the mismatching fields from `reconcile_sa360_campaign` to the user instead.
5.  Summarize each change you made."#;

/// A model, an instruction and the toolsets the agent may use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub model: String,
    pub instruction: String,
    pub toolsets: Vec<String>,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        instruction: impl Into<String>,
        toolsets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instruction: instruction.into(),
            toolsets: toolsets.into_iter().map(Into::into).collect(),
        }
    }

    /// Apply a configured model/instruction override.
    pub fn with_override(mut self, over: &AgentOverride) -> Self {
        if let Some(model) = &over.model {
            self.model = model.clone();
        }
        if let Some(instruction) = &over.instruction {
            self.instruction = instruction.clone();
        }
        self
    }

    pub fn uses_toolset(&self, toolset: &str) -> bool {
        self.toolsets.iter().any(|t| t == toolset)
    }
}

/// Campaign decision agent driven by Firestore config and external signals.
pub fn decision_agent() -> AgentDefinition {
    AgentDefinition::new(
        DECISION_AGENT,
        DEFAULT_MODEL,
        DECISION_INSTRUCTION,
        [
            "google_ads_getter",
            "google_ads_updater",
            "external_signals",
            "firestore",
        ],
    )
}

/// SA360 campaign manager working through the sheet mirror.
pub fn sa360_agent() -> AgentDefinition {
    AgentDefinition::new(SA360_AGENT, DEFAULT_MODEL, SA360_INSTRUCTION, ["sa360"])
}

/// Built-in agents with configuration overrides applied, keyed by name.
pub fn builtin_agents(overrides: &BTreeMap<String, AgentOverride>) -> BTreeMap<String, AgentDefinition> {
    [decision_agent(), sa360_agent()]
        .into_iter()
        .map(|agent| {
            let agent = match overrides.get(&agent.name) {
                Some(over) => agent.with_override(over),
                None => agent,
            };
            (agent.name.clone(), agent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_agent_defaults() {
        let agent = decision_agent();
        assert_eq!(agent.model, "gemini-2.0-flash");
        assert!(agent.instruction.contains("GoogleAdsConfig"));
        assert!(agent.uses_toolset("firestore"));
        assert!(agent.uses_toolset("external_signals"));
        assert!(!agent.uses_toolset("sa360"));
    }

    #[test]
    fn test_override_replaces_only_given_fields() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            SA360_AGENT.to_string(),
            AgentOverride {
                model: Some("gemini-2.5-pro".to_string()),
                instruction: None,
            },
        );

        let agents = builtin_agents(&overrides);
        let sa360 = &agents[SA360_AGENT];
        assert_eq!(sa360.model, "gemini-2.5-pro");
        assert_eq!(sa360.instruction, sa360_agent().instruction);
        assert_eq!(agents[DECISION_AGENT], decision_agent());
    }

    #[test]
    fn test_overrides_for_unknown_agents_are_ignored() {
        let mut overrides = BTreeMap::new();
        overrides.insert("ghost".to_string(), AgentOverride::default());
        assert_eq!(builtin_agents(&overrides).len(), 2);
    }
}

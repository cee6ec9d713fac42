use dsta_core::config::AppConfig;
use dsta_tools::sa360::SA360_TOOLSET;
use serde_json::json;

use super::CommandResult;
use crate::bootstrap::{build_registry, AuthSource};
use crate::error::{CliError, EXIT_MISMATCH};

/// Arguments of `dsta reconcile`
#[derive(Clone, Debug)]
pub struct ReconcileArgs {
    pub campaign_id: String,
    pub customer_id: String,
    pub sheet_id: String,
    pub sheet_name: String,
}

/// Print the reconciliation report. A mismatch exits with code 3.
pub async fn run(
    config: &AppConfig,
    args: &ReconcileArgs,
    auth: &AuthSource,
) -> Result<CommandResult, CliError> {
    let registry = build_registry(config, &[SA360_TOOLSET], auth)?;
    let input = json!({
        "campaign_id": args.campaign_id,
        "customer_id": args.customer_id,
        "sheet_id": args.sheet_id,
        "sheet_name": args.sheet_name,
    });
    let result = registry.call("reconcile_sa360_campaign", input).await?;

    let report = result.as_json().cloned().unwrap_or_default();
    let rendered = serde_json::to_string_pretty(&report)?;
    if report["matches"].as_bool() == Some(true) {
        Ok(CommandResult::success(rendered))
    } else {
        tracing::warn!(campaign_id = %args.campaign_id, "sheet row does not match SA360");
        Ok(CommandResult::with_exit_code(EXIT_MISMATCH, rendered))
    }
}

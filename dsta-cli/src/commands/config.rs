use dsta_core::config::AppConfig;

use super::CommandResult;
use crate::bootstrap::uses_refresh_token;

/// The effective configuration with secrets redacted.
pub fn run(config: &AppConfig) -> CommandResult {
    let mut value = config.redacted();
    value["google_ads"]["effective_auth"] = if uses_refresh_token(config) {
        "oauth_refresh".into()
    } else {
        "adc".into()
    };
    let rendered = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    CommandResult::success(rendered)
}

//! Errors raised by the campaign tools

use dsta_core::ToolError;
use dsta_google_api::GoogleApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CampaignToolError {
    /// A vendor call failed; `context` names the step
    #[error("{context}: {source}")]
    Google {
        context: &'static str,
        #[source]
        source: GoogleApiError,
    },

    #[error("{field} must be a numeric ID, got '{value}'.")]
    InvalidId { field: &'static str, value: String },

    #[error("customer_id must be a 10-digit value.")]
    InvalidSa360CustomerId,

    #[error("Invalid location_id: '{0}'. Location ID must be a numeric string (e.g., '2840' for USA).")]
    InvalidLocationId(String),

    #[error("Invalid status provided: {0}. Use 'ENABLED' or 'PAUSED'.")]
    InvalidStatus(String),

    #[error("Campaign with ID '{0}' not found.")]
    CampaignNotFound(String),

    #[error("Campaign with ID '{0}' not found or has no budget.")]
    CampaignWithoutBudget(String),

    #[error("No data found in sheet '{0}'.")]
    EmptySheet(String),

    #[error("Column not found in sheet: {0}")]
    ColumnNotFound(String),

    #[error("Sheet must contain '{0}' column.")]
    MissingRequiredColumn(&'static str),

    #[error("Could not read header row from the sheet.")]
    MissingHeader,

    #[error("Data mismatch between Google Sheet and SA360 API.")]
    DataMismatch,

    #[error("{0}")]
    InvalidInput(String),
}

impl CampaignToolError {
    pub(crate) fn google(context: &'static str) -> impl FnOnce(GoogleApiError) -> Self {
        move |source| Self::Google { context, source }
    }
}

impl From<CampaignToolError> for ToolError {
    fn from(err: CampaignToolError) -> Self {
        match err {
            CampaignToolError::Google { ref source, .. } if source.is_not_found() => {
                ToolError::NotFound(err.to_string())
            }
            CampaignToolError::Google { .. } => ToolError::Api(err.to_string()),
            CampaignToolError::CampaignNotFound(_)
            | CampaignToolError::CampaignWithoutBudget(_)
            | CampaignToolError::EmptySheet(_)
            | CampaignToolError::ColumnNotFound(_) => ToolError::NotFound(err.to_string()),
            CampaignToolError::DataMismatch => ToolError::Mismatch(err.to_string()),
            CampaignToolError::InvalidId { .. }
            | CampaignToolError::InvalidSa360CustomerId
            | CampaignToolError::InvalidLocationId(_)
            | CampaignToolError::InvalidStatus(_)
            | CampaignToolError::MissingRequiredColumn(_)
            | CampaignToolError::MissingHeader
            | CampaignToolError::InvalidInput(_) => ToolError::Validation(err.to_string()),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, CampaignToolError>;

/// Strip hyphens from a Google Ads customer id and check it is numeric.
pub(crate) fn normalize_customer_id(raw: &str) -> Result<String> {
    let id: String = raw.trim().chars().filter(|c| *c != '-').collect();
    numeric("customer_id", &id)?;
    Ok(id)
}

/// Ids interpolated into GAQL must be plain digits.
pub(crate) fn numeric(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(value.to_string())
    } else {
        Err(CampaignToolError::InvalidId {
            field,
            value: value.to_string(),
        })
    }
}

/// `ENABLED`/`PAUSED`, case-insensitive, returned upper-cased.
pub(crate) fn campaign_status(raw: &str) -> Result<&'static str> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "ENABLED" => Ok("ENABLED"),
        "PAUSED" => Ok("PAUSED"),
        _ => Err(CampaignToolError::InvalidStatus(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_id_hyphens_stripped() {
        assert_eq!(normalize_customer_id("123-456-7890").unwrap(), "1234567890");
        assert!(normalize_customer_id("123-abc").is_err());
        assert!(normalize_customer_id("").is_err());
    }

    #[test]
    fn test_numeric_rejects_gaql_injection() {
        let err = numeric("campaign_id", "1' OR '1'='1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "campaign_id must be a numeric ID, got '1' OR '1'='1'."
        );
    }

    #[test]
    fn test_campaign_status() {
        assert_eq!(campaign_status("paused").unwrap(), "PAUSED");
        assert_eq!(campaign_status("ENABLED").unwrap(), "ENABLED");
        assert_eq!(
            campaign_status("REMOVED").unwrap_err().to_string(),
            "Invalid status provided: REMOVED. Use 'ENABLED' or 'PAUSED'."
        );
    }

    #[test]
    fn test_tool_error_mapping() {
        assert!(ToolError::from(CampaignToolError::DataMismatch).is_mismatch());
        assert!(ToolError::from(CampaignToolError::CampaignNotFound("1".into())).is_not_found());
        assert!(ToolError::from(CampaignToolError::InvalidStatus("x".into())).is_validation());

        let api = CampaignToolError::Google {
            context: "Failed to fetch campaign details",
            source: GoogleApiError::NotFound("NOT_FOUND - gone".into()),
        };
        let mapped = ToolError::from(api);
        assert!(mapped.is_not_found());
        assert_eq!(
            mapped.to_string(),
            "Failed to fetch campaign details: Not found: NOT_FOUND - gone"
        );
    }
}

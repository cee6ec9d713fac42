use std::collections::BTreeMap;

use dsta_google_api::{Sa360Client, SheetsClient};
use serde_json::{json, Value};

use super::details::fetch_campaign_details;
use super::reconcile::{compare_campaign_data, ReconcileReport};
use super::sheet::{
    append_exclusion_row, update_campaign_property, SheetTable, ROW_TYPE_COLUMN,
};
use crate::error::{campaign_status, CampaignToolError, Result};
use crate::prelude::*;

/// The two clients every SA360 tool works with.
#[derive(Clone, Debug)]
pub struct Sa360Clients {
    pub sa360: Sa360Client,
    pub sheets: SheetsClient,
}

impl Sa360Clients {
    /// Compare the campaign's sheet row with the live campaign.
    pub async fn reconcile(
        &self,
        campaign_id: &str,
        customer_id: &str,
        sheet_id: &str,
        sheet_name: &str,
    ) -> Result<(ReconcileReport, BTreeMap<String, String>)> {
        let record = SheetTable::load(&self.sheets, sheet_id, sheet_name)
            .await?
            .campaign_record(campaign_id)?;
        let api = fetch_campaign_details(&self.sa360, campaign_id, customer_id).await?;
        Ok((compare_campaign_data(&record, &api), record))
    }

    /// Reconcile before a write. On mismatch the row's `Row Type` is cleared so
    /// bulk sync skips it, and the write is refused.
    async fn write_gate(
        &self,
        campaign_id: &str,
        customer_id: &str,
        sheet_id: &str,
        sheet_name: &str,
    ) -> Result<BTreeMap<String, String>> {
        let (report, record) = self
            .reconcile(campaign_id, customer_id, sheet_id, sheet_name)
            .await?;
        if report.is_match() {
            return Ok(record);
        }

        if let Err(err) = update_campaign_property(
            &self.sheets,
            campaign_id,
            ROW_TYPE_COLUMN,
            Value::String(String::new()),
            sheet_id,
            sheet_name,
        )
        .await
        {
            tracing::error!(campaign_id, error = %err, "could not clear Row Type after mismatch");
        }
        Err(CampaignToolError::DataMismatch)
    }
}

fn success(message: String) -> ToolResult {
    ToolResult::Json(json!({ "success": message }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Sa360DetailsInput {
    /// SA360 campaign ID
    pub campaign_id: String,
    /// SA360 customer ID, exactly 10 digits
    pub customer_id: String,
}

/// Live campaign details from the SA360 Reporting API.
#[derive(Clone, Debug)]
pub struct GetSa360CampaignDetailsTool {
    clients: Sa360Clients,
}

impl GetSa360CampaignDetailsTool {
    pub fn new(clients: Sa360Clients) -> Self {
        Self { clients }
    }
}

impl Tool for GetSa360CampaignDetailsTool {
    type Input = Sa360DetailsInput;

    fn name(&self) -> &str {
        "get_sa360_campaign_details"
    }

    fn description(&self) -> &str {
        "Fetch an SA360 campaign from the Reporting API: settings, budget (in currency \
         units), LANGUAGE/DEVICE criteria and the canonical names of its locations."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let details =
            fetch_campaign_details(&self.clients.sa360, &input.campaign_id, &input.customer_id)
                .await?;
        Ok(ToolResult::Json(details))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SheetDetailsInput {
    /// SA360 campaign ID
    pub campaign_id: String,
    /// Google Sheet (spreadsheet) ID
    pub sheet_id: String,
    /// Tab holding the bulk-sync rows
    pub sheet_name: String,
}

/// The campaign's row in the bulk-sync sheet, keyed by header.
#[derive(Clone, Debug)]
pub struct GetSa360CampaignDetailsSheetTool {
    clients: Sa360Clients,
}

impl GetSa360CampaignDetailsSheetTool {
    pub fn new(clients: Sa360Clients) -> Self {
        Self { clients }
    }
}

impl Tool for GetSa360CampaignDetailsSheetTool {
    type Input = SheetDetailsInput;

    fn name(&self) -> &str {
        "get_sa360_campaign_details_sheet"
    }

    fn description(&self) -> &str {
        "Read an SA360 campaign's row from the Google Sheet, as a map from column header to cell."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let record = SheetTable::load(&self.clients.sheets, &input.sheet_id, &input.sheet_name)
            .await?
            .campaign_record(&input.campaign_id)?;
        tracing::info!(campaign_id = %input.campaign_id, "read campaign row from sheet");
        Ok(ToolResult::Json(json!(record)))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Sa360StatusInput {
    /// SA360 campaign ID
    pub campaign_id: String,
    /// "ENABLED" or "PAUSED" (case-insensitive)
    pub status: String,
    /// Google Sheet (spreadsheet) ID
    pub sheet_id: String,
    /// Tab holding the bulk-sync rows
    pub sheet_name: String,
    /// SA360 customer ID, exactly 10 digits
    pub customer_id: String,
}

/// Set `Campaign status` in the sheet after the reconciliation check passes.
#[derive(Clone, Debug)]
pub struct UpdateSa360CampaignStatusTool {
    clients: Sa360Clients,
}

impl UpdateSa360CampaignStatusTool {
    pub fn new(clients: Sa360Clients) -> Self {
        Self { clients }
    }
}

impl Tool for UpdateSa360CampaignStatusTool {
    type Input = Sa360StatusInput;

    fn name(&self) -> &str {
        "update_sa360_campaign_status"
    }

    fn description(&self) -> &str {
        "Set an SA360 campaign's status to 'ENABLED' or 'PAUSED' through the bulk-sync \
         sheet. Refused when the sheet row does not match the live campaign."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let status = campaign_status(&input.status)?;
        self.clients
            .write_gate(
                &input.campaign_id,
                &input.customer_id,
                &input.sheet_id,
                &input.sheet_name,
            )
            .await?;

        let message = update_campaign_property(
            &self.clients.sheets,
            &input.campaign_id,
            "Campaign status",
            json!(status),
            &input.sheet_id,
            &input.sheet_name,
        )
        .await?;
        Ok(success(message))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Sa360BudgetInput {
    /// SA360 campaign ID
    pub campaign_id: String,
    /// New budget in currency units (not micros)
    pub budget: f64,
    /// Google Sheet (spreadsheet) ID
    pub sheet_id: String,
    /// Tab holding the bulk-sync rows
    pub sheet_name: String,
    /// SA360 customer ID, exactly 10 digits
    pub customer_id: String,
}

/// Set `Budget` in the sheet after the reconciliation check passes.
#[derive(Clone, Debug)]
pub struct UpdateSa360CampaignBudgetTool {
    clients: Sa360Clients,
}

impl UpdateSa360CampaignBudgetTool {
    pub fn new(clients: Sa360Clients) -> Self {
        Self { clients }
    }
}

impl Tool for UpdateSa360CampaignBudgetTool {
    type Input = Sa360BudgetInput;

    fn name(&self) -> &str {
        "update_sa360_campaign_budget"
    }

    fn description(&self) -> &str {
        "Set an SA360 campaign's budget through the bulk-sync sheet. Refused when the \
         sheet row does not match the live campaign."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        if !input.budget.is_finite() || input.budget < 0.0 {
            return Err(CampaignToolError::InvalidInput(
                "budget must be a non-negative number.".to_string(),
            )
            .into());
        }
        self.clients
            .write_gate(
                &input.campaign_id,
                &input.customer_id,
                &input.sheet_id,
                &input.sheet_name,
            )
            .await?;

        let message = update_campaign_property(
            &self.clients.sheets,
            &input.campaign_id,
            "Budget",
            json!(input.budget),
            &input.sheet_id,
            &input.sheet_name,
        )
        .await?;
        Ok(success(message))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Sa360GeolocationInput {
    /// SA360 campaign ID
    pub campaign_id: String,
    /// Location to target, or to exclude when `remove` is set
    pub location_name: String,
    /// Google Sheet (spreadsheet) ID
    pub sheet_id: String,
    /// Tab holding the bulk-sync rows
    pub sheet_name: String,
    /// SA360 customer ID, exactly 10 digits
    pub customer_id: String,
    /// Append an "excluded location" row instead of rewriting `Location`
    #[serde(default)]
    pub remove: bool,
}

/// Rewrite `Location`, or append an exclusion row, after the reconciliation check passes.
#[derive(Clone, Debug)]
pub struct UpdateSa360CampaignGeolocationTool {
    clients: Sa360Clients,
}

impl UpdateSa360CampaignGeolocationTool {
    pub fn new(clients: Sa360Clients) -> Self {
        Self { clients }
    }
}

impl Tool for UpdateSa360CampaignGeolocationTool {
    type Input = Sa360GeolocationInput;

    fn name(&self) -> &str {
        "update_sa360_campaign_geolocation"
    }

    fn description(&self) -> &str {
        "Update an SA360 campaign's location in the bulk-sync sheet, or with remove=true \
         add an 'excluded location' row for it. Refused when the sheet row does not match \
         the live campaign."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        if input.location_name.trim().is_empty() {
            return Err(ToolError::validation("location_name must not be empty."));
        }
        let record = self
            .clients
            .write_gate(
                &input.campaign_id,
                &input.customer_id,
                &input.sheet_id,
                &input.sheet_name,
            )
            .await?;

        let message = if input.remove {
            append_exclusion_row(
                &self.clients.sheets,
                &input.campaign_id,
                &input.location_name,
                &record,
                &input.sheet_id,
                &input.sheet_name,
            )
            .await?
        } else {
            update_campaign_property(
                &self.clients.sheets,
                &input.campaign_id,
                "Location",
                json!(input.location_name),
                &input.sheet_id,
                &input.sheet_name,
            )
            .await?
        };
        Ok(success(message))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReconcileInput {
    /// SA360 campaign ID
    pub campaign_id: String,
    /// SA360 customer ID, exactly 10 digits
    pub customer_id: String,
    /// Google Sheet (spreadsheet) ID
    pub sheet_id: String,
    /// Tab holding the bulk-sync rows
    pub sheet_name: String,
}

/// Read-only: report which fields of the sheet row disagree with SA360.
#[derive(Clone, Debug)]
pub struct ReconcileSa360CampaignTool {
    clients: Sa360Clients,
}

impl ReconcileSa360CampaignTool {
    pub fn new(clients: Sa360Clients) -> Self {
        Self { clients }
    }
}

impl Tool for ReconcileSa360CampaignTool {
    type Input = ReconcileInput;

    fn name(&self) -> &str {
        "reconcile_sa360_campaign"
    }

    fn description(&self) -> &str {
        "Compare a campaign's sheet row with the live SA360 campaign and list every \
         field that disagrees. Changes nothing."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let (report, _) = self
            .clients
            .reconcile(
                &input.campaign_id,
                &input.customer_id,
                &input.sheet_id,
                &input.sheet_name,
            )
            .await?;
        Ok(ToolResult::Json(report.to_json()))
    }
}

use dsta_google_api::ads::{ad_group_path, campaign_path, geo_target_constant_path};
use dsta_google_api::GoogleAdsClient;
use serde_json::{json, Value};

use crate::error::{normalize_customer_id, numeric, CampaignToolError};
use crate::prelude::*;

fn first_resource_name(names: Vec<String>) -> std::result::Result<String, ToolError> {
    names
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::api("The mutate call returned no results."))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateStatusInput {
    /// Google Ads customer ID (hyphens are ignored)
    pub customer_id: String,
    /// Campaign to update
    pub campaign_id: String,
    /// "ENABLED" or "PAUSED"
    pub status: String,
}

/// Enable or pause a campaign.
#[derive(Clone, Debug)]
pub struct UpdateCampaignStatusTool {
    client: GoogleAdsClient,
}

impl UpdateCampaignStatusTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for UpdateCampaignStatusTool {
    type Input = UpdateStatusInput;

    fn name(&self) -> &str {
        "update_campaign_status"
    }

    fn description(&self) -> &str {
        "Enable or pause a Google Ads campaign. Status must be 'ENABLED' or 'PAUSED'."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let status = match input.status.as_str() {
            "ENABLED" | "PAUSED" => input.status.clone(),
            other => return Err(CampaignToolError::InvalidStatus(other.to_string()).into()),
        };
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let campaign_id = numeric("campaign_id", &input.campaign_id)?;

        let operation = json!({
            "update": {
                "resourceName": campaign_path(&customer_id, &campaign_id),
                "status": status,
            },
            "updateMask": "status",
        });

        let names = self
            .client
            .mutate_campaigns(&customer_id, vec![operation])
            .await
            .map_err(CampaignToolError::google("Failed to update campaign"))?;
        let resource_name = first_resource_name(names)?;

        tracing::info!(%customer_id, %campaign_id, %status, "campaign status updated");
        Ok(ToolResult::Json(json!({
            "success": true,
            "resource_name": resource_name,
        })))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateBudgetInput {
    /// Google Ads customer ID (hyphens are ignored)
    pub customer_id: String,
    /// Campaign whose budget changes
    pub campaign_id: String,
    /// New budget amount in micros (1 unit of currency = 1,000,000 micros)
    pub new_budget_micros: i64,
}

/// Change the amount of the budget attached to a campaign.
#[derive(Clone, Debug)]
pub struct UpdateCampaignBudgetTool {
    client: GoogleAdsClient,
}

impl UpdateCampaignBudgetTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for UpdateCampaignBudgetTool {
    type Input = UpdateBudgetInput;

    fn name(&self) -> &str {
        "update_campaign_budget"
    }

    fn description(&self) -> &str {
        "Update the budget amount (in micros) of a Google Ads campaign."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let campaign_id = numeric("campaign_id", &input.campaign_id)?;
        if input.new_budget_micros <= 0 {
            return Err(ToolError::validation("new_budget_micros must be positive."));
        }

        let query = format!(
            "SELECT campaign.campaign_budget FROM campaign WHERE campaign.id = {}",
            campaign_id
        );
        let rows = self
            .client
            .search_stream(&customer_id, &query)
            .await
            .map_err(CampaignToolError::google("Failed to fetch campaign budget"))?;

        let budget = rows
            .iter()
            .find_map(|row| row["campaign"]["campaignBudget"].as_str())
            .filter(|rn| !rn.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CampaignToolError::CampaignWithoutBudget(campaign_id.clone()))?;

        let operation = json!({
            "update": {
                "resourceName": budget,
                "amountMicros": input.new_budget_micros.to_string(),
            },
            "updateMask": "amountMicros",
        });

        let names = self
            .client
            .mutate_campaign_budgets(&customer_id, vec![operation])
            .await
            .map_err(CampaignToolError::google("Failed to update campaign budget"))?;
        let resource_name = first_resource_name(names)?;

        tracing::info!(
            %customer_id,
            %campaign_id,
            amount_micros = input.new_budget_micros,
            "campaign budget updated"
        );
        Ok(ToolResult::Json(json!({
            "success": true,
            "resource_name": resource_name,
        })))
    }
}

/// Which criterion service a geo-target replacement goes through
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GeoScope {
    Campaign,
    AdGroup,
}

impl GeoScope {
    fn existing_query(self, id: &str) -> String {
        match self {
            Self::Campaign => format!(
                "SELECT campaign_criterion.resource_name FROM campaign_criterion \
                 WHERE campaign.id = {} AND campaign_criterion.type = 'LOCATION'",
                id
            ),
            Self::AdGroup => format!(
                "SELECT ad_group_criterion.resource_name FROM ad_group_criterion \
                 WHERE ad_group.id = {} AND ad_group_criterion.type = 'LOCATION'",
                id
            ),
        }
    }

    fn row_key(self) -> &'static str {
        match self {
            Self::Campaign => "campaignCriterion",
            Self::AdGroup => "adGroupCriterion",
        }
    }

    fn create(self, customer_id: &str, id: &str, location_id: &str, negative: bool) -> Value {
        let (parent_field, parent) = match self {
            Self::Campaign => ("campaign", campaign_path(customer_id, id)),
            Self::AdGroup => ("adGroup", ad_group_path(customer_id, id)),
        };
        json!({
            "create": {
                parent_field: parent,
                "location": { "geoTargetConstant": geo_target_constant_path(location_id) },
                "negative": negative,
            }
        })
    }
}

/// Remove every existing LOCATION criterion, then create one per location id.
async fn replace_geo_targets(
    client: &GoogleAdsClient,
    scope: GeoScope,
    customer_id: &str,
    id: &str,
    location_ids: &[String],
    negative: bool,
) -> std::result::Result<ToolResult, ToolError> {
    if let Some(bad) = location_ids
        .iter()
        .find(|l| l.is_empty() || !l.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(CampaignToolError::InvalidLocationId(bad.clone()).into());
    }

    let existing = client
        .search_stream(customer_id, &scope.existing_query(id))
        .await
        .map_err(CampaignToolError::google("Failed to fetch existing geo targets"))?;

    let mut operations: Vec<Value> = existing
        .iter()
        .filter_map(|row| row[scope.row_key()]["resourceName"].as_str())
        .map(|rn| json!({ "remove": rn }))
        .collect();
    operations.extend(
        location_ids
            .iter()
            .map(|location| scope.create(customer_id, id, location, negative)),
    );

    if operations.is_empty() {
        return Ok(ToolResult::Json(json!({
            "success": true,
            "message": "No changes to apply.",
        })));
    }

    let result = match scope {
        GeoScope::Campaign => client
            .mutate_campaign_criteria(customer_id, operations)
            .await
            .map_err(CampaignToolError::google("Failed to update campaign geo targets")),
        GeoScope::AdGroup => client
            .mutate_ad_group_criteria(customer_id, operations)
            .await
            .map_err(CampaignToolError::google("Failed to update ad group geo targets")),
    };
    let resource_names = result?;

    tracing::info!(
        customer_id,
        id,
        scope = ?scope,
        locations = location_ids.len(),
        "geo targets replaced"
    );
    Ok(ToolResult::Json(json!({
        "success": true,
        "resource_names": resource_names,
    })))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CampaignGeoInput {
    /// Google Ads customer ID (hyphens are ignored)
    pub customer_id: String,
    /// Campaign to retarget
    pub campaign_id: String,
    /// Geo target constant IDs, e.g. "2840" for the USA
    pub location_ids: Vec<String>,
    /// Exclude these locations instead of targeting them
    #[serde(default)]
    pub negative: bool,
}

/// Replace the campaign-level geo targets.
#[derive(Clone, Debug)]
pub struct UpdateCampaignGeoTargetsTool {
    client: GoogleAdsClient,
}

impl UpdateCampaignGeoTargetsTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for UpdateCampaignGeoTargetsTool {
    type Input = CampaignGeoInput;

    fn name(&self) -> &str {
        "update_campaign_geo_targets"
    }

    fn description(&self) -> &str {
        "Replace all geo targets of a Google Ads campaign with the given location IDs."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let campaign_id = numeric("campaign_id", &input.campaign_id)?;
        replace_geo_targets(
            &self.client,
            GeoScope::Campaign,
            &customer_id,
            &campaign_id,
            &input.location_ids,
            input.negative,
        )
        .await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdGroupGeoInput {
    /// Google Ads customer ID (hyphens are ignored)
    pub customer_id: String,
    /// Ad group to retarget
    pub ad_group_id: String,
    /// Geo target constant IDs, e.g. "2840" for the USA
    pub location_ids: Vec<String>,
    /// Exclude these locations instead of targeting them
    #[serde(default)]
    pub negative: bool,
}

/// Replace the ad-group-level geo targets.
#[derive(Clone, Debug)]
pub struct UpdateAdGroupGeoTargetsTool {
    client: GoogleAdsClient,
}

impl UpdateAdGroupGeoTargetsTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for UpdateAdGroupGeoTargetsTool {
    type Input = AdGroupGeoInput;

    fn name(&self) -> &str {
        "update_ad_group_geo_targets"
    }

    fn description(&self) -> &str {
        "Replace all geo targets of a Google Ads ad group with the given location IDs."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let ad_group_id = numeric("ad_group_id", &input.ad_group_id)?;
        replace_geo_targets(
            &self.client,
            GeoScope::AdGroup,
            &customer_id,
            &ad_group_id,
            &input.location_ids,
            input.negative,
        )
        .await
    }
}

use std::collections::BTreeMap;

use dsta_google_api::GoogleAdsClient;
use serde_json::{json, Value};

use crate::error::{normalize_customer_id, numeric, CampaignToolError};
use crate::prelude::*;

const CAMPAIGN_FIELDS: &str = "
    campaign_budget.id,
    campaign_budget.name,
    campaign_budget.amount_micros,
    campaign_budget.status,
    campaign_budget.delivery_method,
    campaign_budget.type,
    campaign.app_campaign_setting.bidding_strategy_goal_type,
    campaign.audience_setting.use_audience_grouped,
    campaign.base_campaign,
    campaign.bidding_strategy,
    campaign.bidding_strategy_system_status,
    campaign.bidding_strategy_type,
    campaign.campaign_budget,
    campaign.dynamic_search_ads_setting.domain_name,
    campaign.dynamic_search_ads_setting.language_code,
    campaign.dynamic_search_ads_setting.use_supplied_urls_only,
    campaign.end_date,
    campaign.geo_target_type_setting.negative_geo_target_type,
    campaign.geo_target_type_setting.positive_geo_target_type,
    campaign.id,
    campaign.labels,
    campaign.local_campaign_setting.location_source_type,
    campaign.maximize_conversion_value.target_roas,
    campaign.maximize_conversions.target_cpa_micros,
    campaign.name,
    campaign.optimization_goal_setting.optimization_goal_types,
    campaign.optimization_score,
    campaign.real_time_bidding_setting.opt_in,
    campaign.resource_name,
    campaign.serving_status,
    campaign.start_date,
    campaign.status,
    campaign.target_cpa.cpc_bid_ceiling_micros,
    campaign.target_cpa.cpc_bid_floor_micros,
    campaign.target_cpa.target_cpa_micros,
    campaign.target_impression_share.cpc_bid_ceiling_micros,
    campaign.target_impression_share.location,
    campaign.target_impression_share.location_fraction_micros,
    campaign.target_roas.cpc_bid_ceiling_micros,
    campaign.target_roas.cpc_bid_floor_micros,
    campaign.target_roas.target_roas,
    campaign.target_spend.cpc_bid_ceiling_micros,
    campaign.target_spend.target_spend_micros";

fn campaign_details_query(campaign_id: &str) -> String {
    format!(
        "SELECT {} FROM campaign WHERE campaign.id = {}",
        CAMPAIGN_FIELDS, campaign_id
    )
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CampaignDetailsInput {
    /// Google Ads customer ID (hyphens are ignored)
    pub customer_id: String,
    /// Campaign to fetch
    pub campaign_id: String,
}

/// Fetch one campaign with its budget, bidding and geo settings.
#[derive(Clone, Debug)]
pub struct GetCampaignDetailsTool {
    client: GoogleAdsClient,
}

impl GetCampaignDetailsTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for GetCampaignDetailsTool {
    type Input = CampaignDetailsInput;

    fn name(&self) -> &str {
        "get_campaign_details"
    }

    fn description(&self) -> &str {
        "Fetch details for a Google Ads campaign: status, dates, bidding strategy, \
         geo target settings and its campaign budget."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let campaign_id = numeric("campaign_id", &input.campaign_id)?;

        let rows = self
            .client
            .search_stream(&customer_id, &campaign_details_query(&campaign_id))
            .await
            .map_err(CampaignToolError::google("Failed to fetch campaign details"))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CampaignToolError::CampaignNotFound(campaign_id.clone()))?;

        Ok(ToolResult::Json(json!({
            "campaign": row.get("campaign").cloned().unwrap_or_else(|| json!({})),
            "campaignBudget": row.get("campaignBudget").cloned().unwrap_or_else(|| json!({})),
        })))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeoSearchInput {
    /// Google Ads customer ID (hyphens are ignored)
    pub customer_id: String,
    /// Location to look up, e.g. "USA" or "New York City"
    pub location_name: String,
}

/// Suggest geo target constants matching a location name.
#[derive(Clone, Debug)]
pub struct SearchGeoTargetConstantsTool {
    client: GoogleAdsClient,
}

impl SearchGeoTargetConstantsTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for SearchGeoTargetConstantsTool {
    type Input = GeoSearchInput;

    fn name(&self) -> &str {
        "search_geo_target_constants"
    }

    fn description(&self) -> &str {
        "Search geo target constants by location name. Returns the matching \
         constants with their numeric IDs for use as location_ids."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let name = input.location_name.trim();
        if name.is_empty() {
            return Err(ToolError::validation("location_name must not be empty."));
        }

        let suggestions = self
            .client
            .suggest_geo_target_constants(&customer_id, &[name.to_string()])
            .await
            .map_err(CampaignToolError::google(
                "Failed to search for geo target constants",
            ))?;

        let constants: Vec<Value> = suggestions
            .into_iter()
            .filter_map(|mut s| s.get_mut("geoTargetConstant").map(Value::take))
            .collect();

        Ok(ToolResult::Json(json!({ "suggestions": constants })))
    }
}

/// Read the LOCATION criteria of a campaign and of each of its ad groups.
#[derive(Clone, Debug)]
pub struct GetGeoTargetsTool {
    client: GoogleAdsClient,
}

impl GetGeoTargetsTool {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Tool for GetGeoTargetsTool {
    type Input = CampaignDetailsInput;

    fn name(&self) -> &str {
        "get_geo_targets"
    }

    fn description(&self) -> &str {
        "Fetch the geo targets (LOCATION criteria) of a campaign and of its ad groups."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let customer_id = normalize_customer_id(&input.customer_id)?;
        let campaign_id = numeric("campaign_id", &input.campaign_id)?;

        let campaign_query = format!(
            "SELECT campaign_criterion.resource_name, campaign_criterion.negative, \
             campaign_criterion.location.geo_target_constant \
             FROM campaign_criterion \
             WHERE campaign.id = {} AND campaign_criterion.type = 'LOCATION'",
            campaign_id
        );
        let campaign_targets: Vec<Value> = self
            .client
            .search_stream(&customer_id, &campaign_query)
            .await
            .map_err(CampaignToolError::google("Failed to fetch campaign geo targets"))?
            .into_iter()
            .filter_map(|mut row| row.get_mut("campaignCriterion").map(Value::take))
            .collect();

        let ad_group_query = format!(
            "SELECT ad_group.id, ad_group_criterion.resource_name, ad_group_criterion.negative, \
             ad_group_criterion.location.geo_target_constant \
             FROM ad_group_criterion \
             WHERE campaign.id = {} AND ad_group_criterion.type = 'LOCATION'",
            campaign_id
        );
        let rows = self
            .client
            .search_stream(&customer_id, &ad_group_query)
            .await
            .map_err(CampaignToolError::google("Failed to fetch ad group geo targets"))?;

        let mut ad_group_targets: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for mut row in rows {
            let ad_group_id = match &row["adGroup"]["id"] {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            if let Some(criterion) = row.get_mut("adGroupCriterion").map(Value::take) {
                ad_group_targets.entry(ad_group_id).or_default().push(criterion);
            }
        }

        Ok(ToolResult::Json(json!({
            "campaign_targets": campaign_targets,
            "ad_group_targets": ad_group_targets,
        })))
    }
}

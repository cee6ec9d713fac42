//! Live campaign details from the SA360 Reporting API.

use dsta_google_api::Sa360Client;
use serde_json::{json, Value};

use crate::error::{numeric, CampaignToolError, Result};

const CAMPAIGN_FIELDS: &str = "
    campaign.id,
    campaign.name,
    campaign.status,
    campaign.labels,
    campaign.tracking_url_template,
    campaign.url_custom_parameters,
    campaign.url_expansion_opt_out,
    campaign.campaign_budget,
    campaign_budget.amount_micros,
    campaign_budget.delivery_method,
    campaign_budget.period,
    campaign.geo_target_type_setting.negative_geo_target_type,
    campaign.geo_target_type_setting.positive_geo_target_type,
    campaign.serving_status,
    campaign.ad_serving_optimization_status,
    campaign.advertising_channel_type,
    campaign.advertising_channel_sub_type,
    campaign.engine_id,
    campaign.start_date,
    campaign.end_date,
    campaign.bidding_strategy_type,
    campaign.bidding_strategy,
    campaign.final_url_suffix,
    campaign.network_settings.target_google_search,
    campaign.network_settings.target_search_network,
    campaign.network_settings.target_content_network,
    campaign.network_settings.target_partner_search_network,
    campaign.target_cpa.target_cpa_micros,
    campaign.target_roas.target_roas,
    campaign.target_impression_share.location,
    campaign.target_impression_share.cpc_bid_ceiling_micros,
    campaign.selective_optimization.conversion_actions,
    campaign.dynamic_search_ads_setting.domain_name";

/// SA360 customer ids are exactly ten digits.
pub fn validate_customer_id(customer_id: &str) -> Result<()> {
    if customer_id.len() == 10 && customer_id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CampaignToolError::InvalidSa360CustomerId)
    }
}

/// `amountMicros / 1e6` when the micros string is all digits, else 0.0
pub fn budget_from_micros(campaign_budget: &Value) -> f64 {
    match campaign_budget.get("amountMicros") {
        Some(Value::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
            s.parse::<f64>().map(|m| m / 1_000_000.0).unwrap_or(0.0)
        }
        Some(Value::Number(n)) if n.is_u64() => n.as_f64().map(|m| m / 1_000_000.0).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Canonical names of the campaign's LOCATION criteria.
async fn campaign_locations(
    client: &Sa360Client,
    customer_id: &str,
    campaign_id: &str,
) -> Result<Vec<String>> {
    let ids_query = format!(
        "SELECT campaign_criterion.location.geo_target_constant FROM campaign_criterion \
         WHERE campaign.id = {} AND campaign_criterion.type = 'LOCATION'",
        campaign_id
    );
    let rows = client
        .search(customer_id, &ids_query)
        .await
        .map_err(CampaignToolError::google("Failed to fetch campaign locations"))?;

    let constants: Vec<String> = rows
        .iter()
        .filter_map(|row| row["campaignCriterion"]["location"]["geoTargetConstant"].as_str())
        .filter_map(|rn| rn.rsplit('/').next())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .map(|id| format!("'geoTargetConstants/{}'", id))
        .collect();

    if constants.is_empty() {
        return Ok(Vec::new());
    }

    let names_query = format!(
        "SELECT geo_target_constant.resource_name, geo_target_constant.name, \
         geo_target_constant.canonical_name, geo_target_constant.country_code \
         FROM geo_target_constant \
         WHERE geo_target_constant.resource_name IN ({})",
        constants.join(",")
    );
    let rows = client
        .search(customer_id, &names_query)
        .await
        .map_err(CampaignToolError::google("Failed to fetch location names"))?;

    Ok(rows
        .iter()
        .filter_map(|row| row["geoTargetConstant"]["canonicalName"].as_str())
        .map(str::to_string)
        .collect())
}

/// `{"campaign", "campaignBudget", "campaignCriterion"}` with `campaign.budget`
/// and `campaign.location` filled in.
pub async fn fetch_campaign_details(
    client: &Sa360Client,
    campaign_id: &str,
    customer_id: &str,
) -> Result<Value> {
    validate_customer_id(customer_id)?;
    let campaign_id = numeric("campaign_id", campaign_id)?;

    let campaign_query = format!(
        "SELECT {} FROM campaign WHERE campaign.id = {}",
        CAMPAIGN_FIELDS, campaign_id
    );
    let criterion_query = format!(
        "SELECT campaign.id, campaign_criterion.criterion_id, campaign_criterion.type, \
         campaign_criterion.negative, campaign_criterion.device.type, \
         campaign_criterion.bid_modifier \
         FROM campaign_criterion \
         WHERE campaign_criterion.type IN ('LANGUAGE', 'DEVICE') AND campaign.id = {}",
        campaign_id
    );

    let rows = client
        .search(customer_id, &campaign_query)
        .await
        .map_err(CampaignToolError::google("Failed to fetch campaign details"))?;
    let mut row = rows
        .into_iter()
        .next()
        .ok_or_else(|| CampaignToolError::CampaignNotFound(campaign_id.clone()))?;

    let criteria = client
        .search(customer_id, &criterion_query)
        .await
        .map_err(CampaignToolError::google("Failed to fetch campaign details"))?;

    let campaign_budget = row
        .get_mut("campaignBudget")
        .map(Value::take)
        .unwrap_or_else(|| json!({}));
    let mut campaign = row
        .get_mut("campaign")
        .map(Value::take)
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({}));

    campaign["budget"] = json!(budget_from_micros(&campaign_budget));
    campaign["location"] = json!(campaign_locations(client, customer_id, &campaign_id).await?);

    tracing::debug!(%campaign_id, customer_id, "fetched SA360 campaign details");
    Ok(json!({
        "campaign": campaign,
        "campaignBudget": campaign_budget,
        "campaignCriterion": criteria,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_id_must_be_ten_digits() {
        assert!(validate_customer_id("1234567890").is_ok());
        assert!(validate_customer_id("123456789").is_err());
        assert!(validate_customer_id("123-456-7890").is_err());
        assert_eq!(
            validate_customer_id("abc").unwrap_err().to_string(),
            "customer_id must be a 10-digit value."
        );
    }

    #[test]
    fn test_budget_from_micros() {
        assert_eq!(budget_from_micros(&json!({"amountMicros": "150000000"})), 150.0);
        assert_eq!(budget_from_micros(&json!({"amountMicros": "-5"})), 0.0);
        assert_eq!(budget_from_micros(&json!({"amountMicros": "1.5"})), 0.0);
        assert_eq!(budget_from_micros(&json!({})), 0.0);
        assert_eq!(budget_from_micros(&json!({"amountMicros": 2500000})), 2.5);
    }
}

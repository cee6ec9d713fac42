//! Field-by-field comparison of a sheet row with the live SA360 campaign.
//!
//! A rule only fires when the sheet cell holds something other than whitespace.
//! Blank cells are never compared.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Sheet columns checked by [`compare_campaign_data`]
pub const CHECKED_COLUMNS: &[&str] = &[
    "Campaign ID",
    "Campaign",
    "Campaign status",
    "Campaign type",
    "Budget",
    "Bid strategy type",
    "Campaign start date",
    "Campaign end date",
    "Location",
];

const BUDGET_TOLERANCE: f64 = 1e-6;

/// One field where the sheet and the API disagree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldMismatch {
    pub field: String,
    pub sheet_value: String,
    pub api_value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub campaign_id: String,
    pub mismatches: Vec<FieldMismatch>,
}

impl ReconcileReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "campaign_id": self.campaign_id,
            "matches": self.is_match(),
            "mismatches": self.mismatches,
        })
    }
}

fn present<'a>(row: &'a BTreeMap<String, String>, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn api_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn api_budget(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bid_strategy_key(value: &str) -> String {
    value.to_lowercase().replace('_', " ")
}

fn sorted_locations(cell: &str) -> Vec<String> {
    let mut locations: Vec<String> = cell
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    locations.sort();
    locations
}

/// Compare a sheet record (header → cell) with the output of
/// `get_sa360_campaign_details`.
pub fn compare_campaign_data(sheet_row: &BTreeMap<String, String>, api: &Value) -> ReconcileReport {
    let campaign = &api["campaign"];
    let mut mismatches = Vec::new();
    let mut mismatch = |field: &str, sheet: &str, api_value: &Value| {
        mismatches.push(FieldMismatch {
            field: field.to_string(),
            sheet_value: sheet.to_string(),
            api_value: api_value.clone(),
        });
    };

    if let Some(sheet) = present(sheet_row, "Campaign ID") {
        if sheet != api_text(&campaign["id"]) {
            mismatch("Campaign ID", sheet, &campaign["id"]);
        }
    }

    if let Some(sheet) = present(sheet_row, "Campaign") {
        if campaign["name"].as_str() != Some(sheet) {
            mismatch("Campaign", sheet, &campaign["name"]);
        }
    }

    if let Some(sheet) = present(sheet_row, "Campaign status") {
        if sheet.to_uppercase() != api_text(&campaign["status"]).to_uppercase() {
            mismatch("Campaign status", sheet, &campaign["status"]);
        }
    }

    if let Some(sheet) = present(sheet_row, "Campaign type") {
        if sheet.to_uppercase() != api_text(&campaign["advertisingChannelType"]).to_uppercase() {
            mismatch("Campaign type", sheet, &campaign["advertisingChannelType"]);
        }
    }

    // Any non-empty budget cell is compared, including one that is only spaces
    if let Some(sheet) = sheet_row.get("Budget").filter(|v| !v.is_empty()) {
        let matches = match (sheet.trim().parse::<f64>(), api_budget(&campaign["budget"])) {
            (Ok(sheet_budget), Some(api_value)) => {
                (sheet_budget - api_value).abs() <= BUDGET_TOLERANCE
            }
            _ => false,
        };
        if !matches {
            mismatch("Budget", sheet, &campaign["budget"]);
        }
    }

    if let Some(sheet) = present(sheet_row, "Bid strategy type") {
        let api_value = api_text(&campaign["biddingStrategyType"]);
        if bid_strategy_key(sheet) != bid_strategy_key(&api_value) {
            mismatch("Bid strategy type", sheet, &campaign["biddingStrategyType"]);
        }
    }

    for (column, key) in [
        ("Campaign start date", "startDate"),
        ("Campaign end date", "endDate"),
    ] {
        if let Some(sheet) = present(sheet_row, column) {
            if campaign[key].as_str() != Some(sheet) {
                mismatch(column, sheet, &campaign[key]);
            }
        }
    }

    if let Some(sheet) = present(sheet_row, "Location") {
        let mut api_locations: Vec<String> = match &campaign["location"] {
            Value::Array(items) => items.iter().map(api_text).collect(),
            _ => Vec::new(),
        };
        api_locations.sort();
        if sorted_locations(sheet) != api_locations {
            mismatch("Location", sheet, &campaign["location"]);
        }
    }

    let report = ReconcileReport {
        campaign_id: api_text(&campaign["id"]),
        mismatches,
    };

    for m in &report.mismatches {
        tracing::warn!(
            campaign_id = %report.campaign_id,
            field = %m.field,
            sheet = %m.sheet_value,
            api = %m.api_value,
            "sheet and SA360 disagree"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn api() -> Value {
        json!({
            "campaign": {
                "id": "111",
                "name": "Spring Allergy",
                "status": "ENABLED",
                "advertisingChannelType": "SEARCH",
                "budget": 150.0,
                "biddingStrategyType": "MAXIMIZE_CONVERSIONS",
                "startDate": "2025-03-01",
                "endDate": "2025-06-30",
                "location": ["Paris,Ile-de-France,France", "Lyon"]
            }
        })
    }

    fn fields(report: &ReconcileReport) -> Vec<&str> {
        report.mismatches.iter().map(|m| m.field.as_str()).collect()
    }

    #[test]
    fn test_matching_row() {
        let sheet = row(&[
            ("Campaign ID", "111"),
            ("Campaign", "Spring Allergy"),
            ("Campaign status", "enabled"),
            ("Campaign type", "search"),
            ("Budget", "150.0000001"),
            ("Bid strategy type", "Maximize conversions"),
            ("Campaign start date", "2025-03-01"),
            ("Campaign end date", "2025-06-30"),
        ]);
        let report = compare_campaign_data(&sheet, &api());
        assert!(report.is_match(), "{:?}", report);
    }

    #[test]
    fn test_blank_cells_are_skipped() {
        let sheet = row(&[("Campaign", "   "), ("Campaign status", ""), ("Location", " ")]);
        assert!(compare_campaign_data(&sheet, &api()).is_match());
    }

    #[test]
    fn test_name_is_case_sensitive() {
        let sheet = row(&[("Campaign", "spring allergy")]);
        assert_eq!(fields(&compare_campaign_data(&sheet, &api())), vec!["Campaign"]);
    }

    #[test]
    fn test_budget_tolerance_and_parse_failure() {
        assert_eq!(
            fields(&compare_campaign_data(&row(&[("Budget", "150.01")]), &api())),
            vec!["Budget"]
        );
        assert_eq!(
            fields(&compare_campaign_data(&row(&[("Budget", "lots")]), &api())),
            vec!["Budget"]
        );
        assert_eq!(
            fields(&compare_campaign_data(&row(&[("Budget", "  ")]), &api())),
            vec!["Budget"]
        );
    }

    #[test]
    fn test_missing_api_budget_defaults_to_zero() {
        let api = json!({"campaign": {"id": "1"}});
        assert!(compare_campaign_data(&row(&[("Budget", "0")]), &api).is_match());
    }

    #[test]
    fn test_missing_api_date_is_mismatch() {
        let api = json!({"campaign": {"id": "1"}});
        let report = compare_campaign_data(&row(&[("Campaign end date", "2025-06-30")]), &api);
        assert_eq!(fields(&report), vec!["Campaign end date"]);
    }

    #[test]
    fn test_location_order_and_spacing_ignored() {
        // The sheet splits on commas, so a canonical name with commas only matches itself split
        let api = json!({"campaign": {"id": "1", "location": ["Lyon", "Paris"]}});
        let sheet = row(&[("Location", " Paris ,, Lyon")]);
        assert!(compare_campaign_data(&sheet, &api).is_match());

        let sheet = row(&[("Location", "Paris")]);
        assert_eq!(fields(&compare_campaign_data(&sheet, &api)), vec!["Location"]);
    }

    #[test]
    fn test_numeric_api_id_is_compared_as_text() {
        let api = json!({"campaign": {"id": 111}});
        assert!(compare_campaign_data(&row(&[("Campaign ID", "111")]), &api).is_match());
        assert!(!compare_campaign_data(&row(&[("Campaign ID", "112")]), &api).is_match());
    }

    #[test]
    fn test_report_lists_every_mismatch() {
        let sheet = row(&[
            ("Campaign ID", "999"),
            ("Campaign status", "PAUSED"),
            ("Bid strategy type", "target_cpa"),
        ]);
        let report = compare_campaign_data(&sheet, &api());
        assert_eq!(
            fields(&report),
            vec!["Campaign ID", "Campaign status", "Bid strategy type"]
        );

        let value = report.to_json();
        assert_eq!(value["matches"], false);
        assert_eq!(value["mismatches"][1]["sheet_value"], "PAUSED");
        assert_eq!(value["mismatches"][1]["api_value"], "ENABLED");
    }
}

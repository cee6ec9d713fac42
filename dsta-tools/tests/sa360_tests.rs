// Integration tests for the SA360 toolset
//
// The sheet and the SA360 Reporting API are both served by one mock server,
// told apart by path and by the GAQL in the request body.

use std::sync::Arc;
use std::time::Duration;

use dsta_core::ToolRegistry;
use dsta_google_api::{Sa360Client, SheetsClient, StaticTokenProvider};
use dsta_tools::Sa360Toolset;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/v0/customers/1234567890/searchAds360:search";
const SHEET_PATH: &str = "/v4/spreadsheets/sheet-1/values/'Campaigns'";

fn header() -> Value {
    json!([
        "Row Type",
        "Campaign ID",
        "Campaign",
        "Campaign status",
        "Budget",
        "Location",
        "Customer ID",
        "Action",
        "Associated Campaign ID",
        "EU political ads"
    ])
}

fn sheet(budget: &str) -> Value {
    json!({
        "range": "Campaigns!A1:J3",
        "values": [
            header(),
            ["campaign", "111", "Spring Allergy", "Enabled", budget, "Paris", "123-456-7890", "", "", "No"],
            ["campaign", "222", "Autumn", "Paused", "10"]
        ]
    })
}

fn registry(server: &MockServer) -> ToolRegistry {
    let auth = Arc::new(StaticTokenProvider::new("test-token"));
    let timeout = Duration::from_secs(5);
    let sa360 = Sa360Client::with_options(&server.uri(), auth.clone(), timeout).unwrap();
    let sheets = SheetsClient::with_options(&server.uri(), auth, timeout).unwrap();

    let mut registry = ToolRegistry::new();
    registry.register(&Sa360Toolset::new(sa360, sheets)).unwrap();
    registry
}

/// Mount the sheet and the live campaign. The live budget is 150.
async fn mount_campaign(server: &MockServer, sheet_budget: &str) {
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet(sheet_budget)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_string_contains("FROM campaign WHERE campaign.id = 111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "campaign": {
                    "id": "111",
                    "name": "Spring Allergy",
                    "status": "ENABLED",
                    "advertisingChannelType": "SEARCH"
                },
                "campaignBudget": {"amountMicros": "150000000"}
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_string_contains("campaign_criterion.type IN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"campaignCriterion": {"criterionId": "9", "type": "LANGUAGE"}}]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_string_contains("campaign_criterion.type = 'LOCATION'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "campaignCriterion": {
                    "location": {"geoTargetConstant": "geoTargetConstants/1006094"}
                }
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_string_contains("FROM geo_target_constant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"geoTargetConstant": {"canonicalName": "Paris"}}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_campaign_details_combine_budget_and_locations() {
    let server = MockServer::start().await;
    mount_campaign(&server, "150").await;

    let result = registry(&server)
        .call(
            "get_sa360_campaign_details",
            json!({"campaign_id": "111", "customer_id": "1234567890"}),
        )
        .await
        .unwrap();
    let details = result.as_json().unwrap();

    assert_eq!(details["campaign"]["budget"], 150.0);
    assert_eq!(details["campaign"]["location"], json!(["Paris"]));
    assert_eq!(details["campaignCriterion"][0]["campaignCriterion"]["type"], "LANGUAGE");
}

#[tokio::test]
async fn test_sheet_details_are_keyed_by_header() {
    let server = MockServer::start().await;
    mount_campaign(&server, "150").await;

    let result = registry(&server)
        .call(
            "get_sa360_campaign_details_sheet",
            json!({"campaign_id": "222", "sheet_id": "sheet-1", "sheet_name": "Campaigns"}),
        )
        .await
        .unwrap();

    assert_eq!(
        result.as_json().unwrap(),
        &json!({
            "Row Type": "campaign",
            "Campaign ID": "222",
            "Campaign": "Autumn",
            "Campaign status": "Paused",
            "Budget": "10"
        })
    );
}

#[tokio::test]
async fn test_tab_named_like_a_cell_is_read_as_a_sheet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Q1'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet("150")))
        .expect(1)
        .mount(&server)
        .await;

    let result = registry(&server)
        .call(
            "get_sa360_campaign_details_sheet",
            json!({"campaign_id": "111", "sheet_id": "sheet-1", "sheet_name": "Q1"}),
        )
        .await
        .unwrap();

    assert_eq!(result.as_json().unwrap()["Campaign"], "Spring Allergy");
}

#[tokio::test]
async fn test_budget_update_writes_cell_when_sheet_matches() {
    let server = MockServer::start().await;
    mount_campaign(&server, "150").await;

    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/Campaigns!E2"))
        .and(body_json(json!({"range": "Campaigns!E2", "values": [[200.5]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let result = registry(&server)
        .call(
            "update_sa360_campaign_budget",
            json!({
                "campaign_id": "111",
                "budget": 200.5,
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns",
                "customer_id": "1234567890"
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result.as_json().unwrap()["success"],
        "Campaign '111' Budget updated to '200.5'."
    );
}

#[tokio::test]
async fn test_mismatch_clears_row_type_and_refuses_write() {
    let server = MockServer::start().await;
    mount_campaign(&server, "999").await;

    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/Campaigns!A2"))
        .and(body_json(json!({"range": "Campaigns!A2", "values": [[""]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/Campaigns!D2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = registry(&server)
        .call(
            "update_sa360_campaign_status",
            json!({
                "campaign_id": "111",
                "status": "paused",
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns",
                "customer_id": "1234567890"
            }),
        )
        .await
        .unwrap_err();

    assert!(err.is_mismatch());
    assert_eq!(
        err.to_string(),
        "Data mismatch between Google Sheet and SA360 API."
    );
}

#[tokio::test]
async fn test_status_is_upper_cased() {
    let server = MockServer::start().await;
    mount_campaign(&server, "150").await;

    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/Campaigns!D2"))
        .and(body_json(json!({"range": "Campaigns!D2", "values": [["PAUSED"]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let result = registry(&server)
        .call(
            "update_sa360_campaign_status",
            json!({
                "campaign_id": "111",
                "status": "paused",
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns",
                "customer_id": "1234567890"
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result.as_json().unwrap()["success"],
        "Campaign '111' Campaign status updated to 'PAUSED'."
    );
}

#[tokio::test]
async fn test_invalid_status_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    let err = registry(&server)
        .call(
            "update_sa360_campaign_status",
            json!({
                "campaign_id": "111",
                "status": "REMOVED",
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns",
                "customer_id": "1234567890"
            }),
        )
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_short_customer_id_is_rejected() {
    let server = MockServer::start().await;
    mount_campaign(&server, "150").await;

    let err = registry(&server)
        .call(
            "reconcile_sa360_campaign",
            json!({
                "campaign_id": "111",
                "customer_id": "12345",
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns"
            }),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "customer_id must be a 10-digit value.");
}

#[tokio::test]
async fn test_remove_location_appends_exclusion_row() {
    let server = MockServer::start().await;
    mount_campaign(&server, "150").await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/Campaigns!1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": [header()]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Campaigns':append"))
        .and(body_json(json!({
            "values": [[
                "excluded location",
                "",
                "Spring Allergy",
                "",
                "",
                "Lyon",
                "123-456-7890",
                "deactivate",
                "111",
                "No"
            ]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let result = registry(&server)
        .call(
            "update_sa360_campaign_geolocation",
            json!({
                "campaign_id": "111",
                "location_name": "Lyon",
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns",
                "customer_id": "1234567890",
                "remove": true
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        result.as_json().unwrap()["success"],
        "Geolocation removal record for 'Lyon' added for campaign '111'."
    );
}

#[tokio::test]
async fn test_reconcile_reports_without_writing() {
    let server = MockServer::start().await;
    mount_campaign(&server, "99").await;

    let result = registry(&server)
        .call(
            "reconcile_sa360_campaign",
            json!({
                "campaign_id": "111",
                "customer_id": "1234567890",
                "sheet_id": "sheet-1",
                "sheet_name": "Campaigns"
            }),
        )
        .await
        .unwrap();
    let report = result.as_json().unwrap();

    assert_eq!(report["matches"], false);
    assert_eq!(report["mismatches"][0]["field"], "Budget");
    assert_eq!(report["mismatches"][0]["api_value"], 150.0);

    let writes = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .count();
    assert_eq!(writes, 0);
}

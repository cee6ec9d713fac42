use dsta_core::prelude::*;
use dsta_core::{Presentation, ToolDefinition, ToolRegistry};
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
struct BudgetInput {
    /// Campaign to change
    campaign_id: String,
    /// New daily budget in micros
    new_budget_micros: i64,
}

struct FakeBudgetTool;

impl Tool for FakeBudgetTool {
    type Input = BudgetInput;

    fn name(&self) -> &str {
        "update_campaign_budget"
    }

    fn description(&self) -> &str {
        "Update a campaign budget"
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        if input.new_budget_micros <= 0 {
            return Err(ToolError::validation("Budget must be positive."));
        }
        ToolResult::json(json!({
            "success": true,
            "resource_name": format!("customers/1/campaignBudgets/{}", input.campaign_id),
        }))
        .map_err(ToolError::from)
    }
}

struct BudgetToolset;

impl Toolset for BudgetToolset {
    fn name(&self) -> &str {
        "google_ads_updater"
    }

    fn tools(&self) -> Vec<Box<dyn DynTool>> {
        box_tools![FakeBudgetTool]
    }
}

#[test]
fn test_tool_result_text_factory() {
    let result = ToolResult::text("Hello");
    assert!(matches!(result, ToolResult::Text(ref s) if s == "Hello"));
    assert_eq!(result.as_str(), Some("Hello"));
}

#[test]
fn test_tool_result_json_as_text() {
    let result = ToolResult::Json(json!({"key": "value"}));
    let text = result.as_text();
    assert!(text.contains("key"));
    assert!(text.contains("value"));
    assert!(result.as_str().is_none());
}

#[test]
fn test_schema_carries_field_docs() {
    let schema = FakeBudgetTool.input_schema();
    let props = &schema["properties"];
    assert_eq!(props["new_budget_micros"]["type"], "integer");
    assert!(props["campaign_id"]["description"]
        .as_str()
        .unwrap()
        .contains("Campaign"));
}

#[tokio::test]
async fn test_dyn_tool_round_trip_through_registry() {
    let mut registry = ToolRegistry::new();
    registry.register(&BudgetToolset).unwrap();

    let result = registry
        .call(
            "update_campaign_budget",
            json!({"campaign_id": "42", "new_budget_micros": 5_000_000}),
        )
        .await
        .unwrap();

    let value = result.as_json().unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["resource_name"], "customers/1/campaignBudgets/42");
}

#[tokio::test]
async fn test_tool_error_passes_through() {
    let tool = box_tool(FakeBudgetTool);
    let err = tool
        .execute_raw(json!({"campaign_id": "42", "new_budget_micros": 0}))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Budget must be positive.");
}

#[tokio::test]
async fn test_missing_field_is_validation_error() {
    let tool = box_tool(FakeBudgetTool);
    let err = tool
        .execute_raw(json!({"campaign_id": "42"}))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("new_budget_micros"));
}

#[test]
fn test_definition_serializes_for_host_runtime() {
    let def = box_tool(FakeBudgetTool).definition();
    let value = serde_json::to_value(&def).unwrap();

    assert_eq!(value["name"], "update_campaign_budget");
    assert!(value["input_schema"]["properties"].is_object());

    let back: ToolDefinition = serde_json::from_value(value).unwrap();
    assert_eq!(back, def);
}

#[test]
fn test_formatting_through_dyn_tool() {
    let tool = box_tool(FakeBudgetTool);
    let result = ToolResult::Json(json!({
        "success": true,
        "resource_name": "customers/1/campaignBudgets/42"
    }));

    assert!(tool
        .format_result(&result, Presentation::Plain)
        .starts_with("ok: updated customers/1/campaignBudgets/42"));
    assert!(tool
        .format_result(&result, Presentation::Markdown)
        .contains("```json"));
    assert_eq!(
        tool.format_call(&json!({"campaign_id": "42"}), Presentation::Plain),
        "update_campaign_budget(campaign_id=\"42\")"
    );
}

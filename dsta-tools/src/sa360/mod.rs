//! Search Ads 360 tools.
//!
//! SA360 campaigns are changed by editing a Google Sheet that SA360 bulk-syncs.
//! Every write first compares the campaign's sheet row against the live
//! campaign; a disagreement clears the row's `Row Type` and refuses the write.

mod details;
mod reconcile;
mod sheet;
mod tools;

pub use details::{budget_from_micros, fetch_campaign_details, validate_customer_id};
pub use reconcile::{compare_campaign_data, FieldMismatch, ReconcileReport, CHECKED_COLUMNS};
pub use sheet::{
    a1_range, column_letter, exclusion_row, sheet_range, SheetTable, CAMPAIGN_ID_COLUMN,
    ROW_TYPE_COLUMN,
};
pub use tools::{
    GetSa360CampaignDetailsSheetTool, GetSa360CampaignDetailsTool, ReconcileSa360CampaignTool,
    Sa360Clients, UpdateSa360CampaignBudgetTool, UpdateSa360CampaignGeolocationTool,
    UpdateSa360CampaignStatusTool,
};

use dsta_core::{box_tools, DynTool, Toolset};
use dsta_google_api::{Sa360Client, SheetsClient};

pub const SA360_TOOLSET: &str = "sa360";

#[derive(Clone, Debug)]
pub struct Sa360Toolset {
    clients: Sa360Clients,
}

impl Sa360Toolset {
    pub fn new(sa360: Sa360Client, sheets: SheetsClient) -> Self {
        Self {
            clients: Sa360Clients { sa360, sheets },
        }
    }
}

impl Toolset for Sa360Toolset {
    fn name(&self) -> &str {
        SA360_TOOLSET
    }

    fn tools(&self) -> Vec<Box<dyn DynTool>> {
        box_tools![
            GetSa360CampaignDetailsTool::new(self.clients.clone()),
            GetSa360CampaignDetailsSheetTool::new(self.clients.clone()),
            UpdateSa360CampaignStatusTool::new(self.clients.clone()),
            UpdateSa360CampaignBudgetTool::new(self.clients.clone()),
            UpdateSa360CampaignGeolocationTool::new(self.clients.clone()),
            ReconcileSa360CampaignTool::new(self.clients.clone()),
        ]
    }
}

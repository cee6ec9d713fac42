//! Google Ads tools: read campaign state and mutate status, budget and geo targets.
//!
//! | Tool | Toolset |
//! |------|---------|
//! | [`GetCampaignDetailsTool`] | `google_ads_getter` |
//! | [`SearchGeoTargetConstantsTool`] | `google_ads_getter` |
//! | [`GetGeoTargetsTool`] | `google_ads_getter` |
//! | [`UpdateCampaignStatusTool`] | `google_ads_updater` |
//! | [`UpdateCampaignBudgetTool`] | `google_ads_updater` |
//! | [`UpdateCampaignGeoTargetsTool`] | `google_ads_updater` |
//! | [`UpdateAdGroupGeoTargetsTool`] | `google_ads_updater` |

mod getter;
mod updater;

pub use getter::{GetCampaignDetailsTool, GetGeoTargetsTool, SearchGeoTargetConstantsTool};
pub use updater::{
    UpdateAdGroupGeoTargetsTool, UpdateCampaignBudgetTool, UpdateCampaignGeoTargetsTool,
    UpdateCampaignStatusTool,
};

use dsta_core::{box_tools, DynTool, Toolset};
use dsta_google_api::GoogleAdsClient;

pub const GETTER_TOOLSET: &str = "google_ads_getter";
pub const UPDATER_TOOLSET: &str = "google_ads_updater";

/// Read-only Google Ads tools
#[derive(Clone, Debug)]
pub struct GoogleAdsGetterToolset {
    client: GoogleAdsClient,
}

impl GoogleAdsGetterToolset {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Toolset for GoogleAdsGetterToolset {
    fn name(&self) -> &str {
        GETTER_TOOLSET
    }

    fn tools(&self) -> Vec<Box<dyn DynTool>> {
        box_tools![
            GetCampaignDetailsTool::new(self.client.clone()),
            SearchGeoTargetConstantsTool::new(self.client.clone()),
            GetGeoTargetsTool::new(self.client.clone()),
        ]
    }
}

/// Mutating Google Ads tools
#[derive(Clone, Debug)]
pub struct GoogleAdsUpdaterToolset {
    client: GoogleAdsClient,
}

impl GoogleAdsUpdaterToolset {
    pub fn new(client: GoogleAdsClient) -> Self {
        Self { client }
    }
}

impl Toolset for GoogleAdsUpdaterToolset {
    fn name(&self) -> &str {
        UPDATER_TOOLSET
    }

    fn tools(&self) -> Vec<Box<dyn DynTool>> {
        box_tools![
            UpdateCampaignStatusTool::new(self.client.clone()),
            UpdateCampaignBudgetTool::new(self.client.clone()),
            UpdateCampaignGeoTargetsTool::new(self.client.clone()),
            UpdateAdGroupGeoTargetsTool::new(self.client.clone()),
        ]
    }
}

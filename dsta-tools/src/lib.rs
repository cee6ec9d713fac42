//! # dsta-tools
//!
//! The tools the DSTA campaign agents call, grouped into toolsets:
//!
//! | Toolset | Feature | Contents |
//! |---------|---------|----------|
//! | `google_ads_getter` | `google_ads` | Campaign details, geo target lookups |
//! | `google_ads_updater` | `google_ads` | Status, budget and geo target changes |
//! | `sa360` | `sa360` | Sheet-mirrored SA360 edits behind a reconciliation check |
//! | `firestore` | `firestore` | Campaign configuration documents |
//! | `external_signals` | `signals` | Weather, pollen and other lat/lng APIs |
//!
//! Every toolset is built from already-configured API clients, so hosts
//! decide how credentials are obtained.

mod error;

#[cfg(feature = "firestore")]
pub mod firestore;
#[cfg(feature = "google_ads")]
pub mod google_ads;
#[cfg(feature = "sa360")]
pub mod sa360;
#[cfg(feature = "signals")]
pub mod signals;

pub use error::CampaignToolError;

#[cfg(feature = "firestore")]
pub use firestore::FirestoreToolset;
#[cfg(feature = "google_ads")]
pub use google_ads::{GoogleAdsGetterToolset, GoogleAdsUpdaterToolset};
#[cfg(feature = "sa360")]
pub use sa360::Sa360Toolset;
#[cfg(feature = "signals")]
pub use signals::ExternalSignalsToolset;

pub mod prelude {
    pub use dsta_core::prelude::*;
}

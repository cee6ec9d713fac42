//! Minimal REST clients for the Google APIs the DSTA agents touch.
//!
//! Each client covers only the endpoints the tools call:
//!
//! - [`GoogleAdsClient`]: `googleAds:searchStream`, four mutate services and
//!   `geoTargetConstants:suggest`
//! - [`Sa360Client`]: `searchAds360:search`
//! - [`SheetsClient`]: values get/update/append
//! - [`FirestoreClient`]: document get and collection list
//!
//! Authentication goes through a [`TokenProvider`]; see [`auth`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use dsta_google_api::{auth::AdcTokenProvider, SheetsClient};
//!
//! let auth = Arc::new(AdcTokenProvider::new(dsta_google_api::auth::SHEETS_SCOPES.iter().copied())?);
//! let sheets = SheetsClient::new(auth)?;
//! let rows = sheets.get_values("spreadsheet-id", "Campaigns").await?;
//! ```

pub mod ads;
pub mod auth;
mod client;
pub mod error;
pub mod firestore;
pub mod sa360;
pub mod sheets;

pub use ads::{GoogleAdsClient, GoogleAdsClientBuilder};
pub use auth::{AdcTokenProvider, RefreshTokenProvider, StaticTokenProvider, TokenProvider};
pub use error::GoogleApiError;
pub use firestore::{FirestoreClient, FirestoreDocument};
pub use sa360::Sa360Client;
pub use sheets::SheetsClient;

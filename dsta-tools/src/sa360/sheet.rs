//! Reading and writing the SA360 bulk-sync sheet.

use std::collections::BTreeMap;

use dsta_google_api::SheetsClient;
use serde_json::Value;

use crate::error::{CampaignToolError, Result};

pub const CAMPAIGN_ID_COLUMN: &str = "Campaign ID";
pub const ROW_TYPE_COLUMN: &str = "Row Type";

/// A1 column letters for a zero-based index: 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// The whole sheet as an A1 range. Always quoted, since a bare name such as
/// `Q1` would be read as a cell of the first sheet.
pub fn sheet_range(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

/// `<sheet>!<cells>`, quoting the sheet name when A1 notation requires it.
pub fn a1_range(sheet_name: &str, cells: &str) -> String {
    let plain = sheet_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        format!("{}!{}", sheet_name, cells)
    } else {
        format!("{}!{}", sheet_range(sheet_name), cells)
    }
}

/// The whole sheet: a header row and the data rows below it.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn from_values(sheet_name: &str, mut values: Vec<Vec<String>>) -> Result<Self> {
        if values.is_empty() {
            return Err(CampaignToolError::EmptySheet(sheet_name.to_string()));
        }
        let header = values.remove(0);
        Ok(Self {
            header,
            rows: values,
        })
    }

    pub async fn load(client: &SheetsClient, sheet_id: &str, sheet_name: &str) -> Result<Self> {
        let values = client
            .get_values(sheet_id, &sheet_range(sheet_name))
            .await
            .map_err(CampaignToolError::google("Failed to fetch campaign details"))?;
        Self::from_values(sheet_name, values)
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| CampaignToolError::ColumnNotFound(column.to_string()))
    }

    /// Index (into `rows`) of the first row whose `Campaign ID` cell equals the id
    pub fn find_campaign(&self, campaign_id: &str) -> Result<usize> {
        let id_index = self.column_index(CAMPAIGN_ID_COLUMN)?;
        self.rows
            .iter()
            .position(|row| row.get(id_index).is_some_and(|cell| cell == campaign_id))
            .ok_or_else(|| CampaignToolError::CampaignNotFound(campaign_id.to_string()))
    }

    /// Header → cell for one data row. Short rows map only the cells they have.
    pub fn record(&self, row_index: usize) -> BTreeMap<String, String> {
        match self.rows.get(row_index) {
            Some(row) => self
                .header
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
            None => BTreeMap::new(),
        }
    }

    pub fn campaign_record(&self, campaign_id: &str) -> Result<BTreeMap<String, String>> {
        let index = self.find_campaign(campaign_id)?;
        Ok(self.record(index))
    }

    /// The A1 cell holding `column` for the campaign's row. Data rows start at sheet row 2.
    pub fn cell_for(&self, campaign_id: &str, column: &str) -> Result<String> {
        let column_index = self.column_index(column)?;
        let row_index = self.find_campaign(campaign_id)?;
        Ok(format!("{}{}", column_letter(column_index), row_index + 2))
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write one property of a campaign's row and return the confirmation message.
pub async fn update_campaign_property(
    client: &SheetsClient,
    campaign_id: &str,
    property: &str,
    value: Value,
    sheet_id: &str,
    sheet_name: &str,
) -> Result<String> {
    let table = SheetTable::load(client, sheet_id, sheet_name).await?;
    let range = a1_range(sheet_name, &table.cell_for(campaign_id, property)?);
    let shown = display(&value);

    client
        .update_values(sheet_id, &range, vec![vec![value]])
        .await
        .map_err(CampaignToolError::google("Failed to update campaign property"))?;

    tracing::info!(campaign_id, property, value = %shown, %range, "campaign property updated");
    Ok(format!(
        "Campaign '{}' {} updated to '{}'.",
        campaign_id, property, shown
    ))
}

/// Build an "excluded location" row ordered by the sheet header.
pub fn exclusion_row(
    header: &[String],
    campaign_id: &str,
    location_name: &str,
    campaign_record: &BTreeMap<String, String>,
) -> Result<Vec<Value>> {
    for required in ["Associated Campaign ID", "Action", ROW_TYPE_COLUMN] {
        if !header.iter().any(|h| h == required) {
            return Err(CampaignToolError::MissingRequiredColumn(required));
        }
    }

    let copied = |column: &str| campaign_record.get(column).cloned().unwrap_or_default();
    let cells: BTreeMap<&str, String> = [
        (ROW_TYPE_COLUMN, "excluded location".to_string()),
        ("Action", "deactivate".to_string()),
        ("Customer ID", copied("Customer ID")),
        ("Campaign", copied("Campaign")),
        ("EU political ads", copied("EU political ads")),
        ("Location", location_name.to_string()),
        ("Associated Campaign ID", campaign_id.to_string()),
    ]
    .into_iter()
    .collect();

    Ok(header
        .iter()
        .map(|h| Value::String(cells.get(h.as_str()).cloned().unwrap_or_default()))
        .collect())
}

/// Append an "excluded location" row for the campaign.
pub async fn append_exclusion_row(
    client: &SheetsClient,
    campaign_id: &str,
    location_name: &str,
    campaign_record: &BTreeMap<String, String>,
    sheet_id: &str,
    sheet_name: &str,
) -> Result<String> {
    let header = client
        .get_values(sheet_id, &a1_range(sheet_name, "1:1"))
        .await
        .map_err(CampaignToolError::google("Failed to remove campaign geolocation"))?
        .into_iter()
        .next()
        .filter(|h| !h.is_empty())
        .ok_or(CampaignToolError::MissingHeader)?;

    let row = exclusion_row(&header, campaign_id, location_name, campaign_record)?;

    client
        .append_values(sheet_id, &sheet_range(sheet_name), vec![row])
        .await
        .map_err(CampaignToolError::google("Failed to remove campaign geolocation"))?;

    tracing::info!(campaign_id, location_name, "geolocation removal record added");
    Ok(format!(
        "Geolocation removal record for '{}' added for campaign '{}'.",
        location_name, campaign_id
    ))
}

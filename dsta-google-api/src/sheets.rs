//! Google Sheets v4 values client.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use reqwest::Method;
use serde_json::{json, Value};

use crate::auth::TokenProvider;
use crate::client::{RestClient, DEFAULT_TIMEOUT};
use crate::error::GoogleApiError;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Clone, Debug)]
pub struct SheetsClient {
    rest: RestClient,
}

/// Render one cell as the text a user sees in the sheet
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetsClient {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Result<Self, GoogleApiError> {
        Self::with_options(DEFAULT_API_BASE, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_base: &str,
        auth: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Result<Self, GoogleApiError> {
        Ok(Self {
            rest: RestClient::new(api_base, auth, timeout)?,
        })
    }

    /// Read a range. Rows keep their ragged length; non-string cells are stringified.
    pub async fn get_values(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, GoogleApiError> {
        let url = self
            .rest
            .url(&["v4", "spreadsheets", sheet_id, "values", range])?;
        let response = self.rest.get(url).await?;

        let rows = match response.get("values") {
            Some(Value::Array(rows)) => rows,
            _ => return Ok(Vec::new()),
        };

        Ok(rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(cell_text).collect(),
                _ => Vec::new(),
            })
            .collect())
    }

    /// Overwrite a range with `valueInputOption=RAW`
    pub async fn update_values(
        &self,
        sheet_id: &str,
        range: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<Value, GoogleApiError> {
        let mut url = self
            .rest
            .url(&["v4", "spreadsheets", sheet_id, "values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({ "range": range, "values": rows });
        let response = self
            .rest
            .send(Method::PUT, url, Some(&body), HeaderMap::new())
            .await?;
        tracing::info!(sheet_id, range, "sheet range updated");
        Ok(response)
    }

    /// Append rows after the table found in `range`, with `valueInputOption=RAW`
    pub async fn append_values(
        &self,
        sheet_id: &str,
        range: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<Value, GoogleApiError> {
        let append = format!("{}:append", range);
        let mut url = self
            .rest
            .url(&["v4", "spreadsheets", sheet_id, "values", &append])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({ "values": rows });
        let response = self
            .rest
            .send(Method::POST, url, Some(&body), HeaderMap::new())
            .await?;
        tracing::info!(sheet_id, range, "sheet rows appended");
        Ok(response)
    }
}

#[cfg(test)]
mod wiremock_tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SheetsClient {
        SheetsClient::with_options(
            &server.uri(),
            Arc::new(StaticTokenProvider::new("t")),
            DEFAULT_TIMEOUT,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_values_stringifies_cells() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Campaigns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Campaigns!A1:C3",
                "values": [["Campaign ID", "Budget", "Active"], ["42", 12.5, true], ["43"]]
            })))
            .mount(&server)
            .await;

        let rows = client(&server).get_values("sheet-1", "Campaigns").await.unwrap();
        assert_eq!(rows[1], vec!["42", "12.5", "true"]);
        assert_eq!(rows[2], vec!["43"]);
    }

    #[tokio::test]
    async fn test_get_values_empty_sheet() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"range": "Empty!A1:Z1000"})))
            .mount(&server)
            .await;

        assert!(client(&server).get_values("s", "Empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_values_raw() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v4/spreadsheets/sheet-1/values/Campaigns!D2"))
            .and(query_param("valueInputOption", "RAW"))
            .and(body_json(json!({"range": "Campaigns!D2", "values": [["PAUSED"]]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .update_values("sheet-1", "Campaigns!D2", vec![vec![json!("PAUSED")]])
            .await
            .unwrap();
        assert_eq!(response["updatedCells"], 1);
    }

    #[tokio::test]
    async fn test_append_values_raw() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/Campaigns:append"))
            .and(query_param("valueInputOption", "RAW"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updates": {"updatedRows": 1}})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .append_values("sheet-1", "Campaigns", vec![vec![json!("excluded location")]])
            .await
            .unwrap();
    }
}

//! Search Ads 360 Reporting API client.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use reqwest::Method;
use serde_json::{json, Value};

use crate::auth::TokenProvider;
use crate::client::{RestClient, DEFAULT_TIMEOUT};
use crate::error::GoogleApiError;

pub const DEFAULT_API_BASE: &str = "https://searchads360.googleapis.com";
const API_VERSION: &str = "v0";

/// Upper bound on pages followed for one query
const MAX_PAGES: usize = 100;

#[derive(Clone, Debug)]
pub struct Sa360Client {
    rest: RestClient,
}

impl Sa360Client {
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

    /// Run a query through `searchAds360:search`, following `nextPageToken`.
    pub async fn search(&self, customer_id: &str, query: &str) -> Result<Vec<Value>, GoogleApiError> {
        let url = self.rest.url(&[
            API_VERSION,
            "customers",
            customer_id,
            "searchAds360:search",
        ])?;

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut body = json!({ "query": query });
            if let Some(token) = &page_token {
                body["pageToken"] = Value::String(token.clone());
            }

            let mut response = self
                .rest
                .send(Method::POST, url.clone(), Some(&body), HeaderMap::new())
                .await?;

            if let Some(Value::Array(results)) = response.get_mut("results").map(Value::take) {
                rows.extend(results);
            }

            page_token = response
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            if page_token.is_none() {
                return Ok(rows);
            }
        }

        tracing::warn!(customer_id, pages = MAX_PAGES, "sa360 search stopped at page limit");
        Ok(rows)
    }
}

#[cfg(test)]
mod wiremock_tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Sa360Client {
        Sa360Client::with_options(
            &server.uri(),
            Arc::new(StaticTokenProvider::new("t")),
            DEFAULT_TIMEOUT,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_follows_page_tokens() {
        let server = MockServer::start().await;
        let endpoint = "/v0/customers/1234567890/searchAds360:search";

        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_json(json!({"query": "SELECT campaign.id FROM campaign"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"campaign": {"id": "1"}}],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_json(json!({"query": "SELECT campaign.id FROM campaign", "pageToken": "page-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"campaign": {"id": "2"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server)
            .search("1234567890", "SELECT campaign.id FROM campaign")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["campaign"]["id"], "2");
    }

    #[tokio::test]
    async fn test_search_without_results_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fieldMask": "campaign.id"})))
            .mount(&server)
            .await;

        let rows = client(&server).search("1234567890", "SELECT x").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_search_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Customer not found", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).search("1234567890", "SELECT x").await.unwrap_err();
        assert!(err.is_not_found());
    }
}

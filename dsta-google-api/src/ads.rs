//! Google Ads REST client: GAQL search and the handful of mutate services the tools use.

use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::auth::TokenProvider;
use crate::client::{RestClient, DEFAULT_TIMEOUT};
use crate::error::GoogleApiError;

pub const DEFAULT_API_BASE: &str = "https://googleads.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v21";

const DEVELOPER_TOKEN: HeaderName = HeaderName::from_static("developer-token");
const LOGIN_CUSTOMER_ID: HeaderName = HeaderName::from_static("login-customer-id");

/// `customers/{customer_id}/campaigns/{campaign_id}`
pub fn campaign_path(customer_id: &str, campaign_id: &str) -> String {
    format!("customers/{}/campaigns/{}", customer_id, campaign_id)
}

/// `customers/{customer_id}/adGroups/{ad_group_id}`
pub fn ad_group_path(customer_id: &str, ad_group_id: &str) -> String {
    format!("customers/{}/adGroups/{}", customer_id, ad_group_id)
}

/// `geoTargetConstants/{location_id}`
pub fn geo_target_constant_path(location_id: &str) -> String {
    format!("geoTargetConstants/{}", location_id)
}

/// Google Ads API client
#[derive(Clone)]
pub struct GoogleAdsClient {
    rest: RestClient,
    api_version: String,
    developer_token: SecretString,
    login_customer_id: Option<String>,
}

impl std::fmt::Debug for GoogleAdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAdsClient")
            .field("rest", &self.rest)
            .field("api_version", &self.api_version)
            .field("developer_token", &"[REDACTED]")
            .field("login_customer_id", &self.login_customer_id)
            .finish()
    }
}

impl GoogleAdsClient {
    pub fn builder() -> GoogleAdsClientBuilder {
        GoogleAdsClientBuilder::default()
    }

    fn headers(&self, customer_id: &str) -> Result<HeaderMap, GoogleApiError> {
        let mut headers = HeaderMap::new();

        let mut token = HeaderValue::from_str(self.developer_token.expose_secret())
            .map_err(|e| GoogleApiError::Configuration(format!("invalid developer token: {}", e)))?;
        token.set_sensitive(true);
        headers.insert(DEVELOPER_TOKEN, token);

        let login = self.login_customer_id.as_deref().unwrap_or(customer_id);
        let login = HeaderValue::from_str(login).map_err(|e| {
            GoogleApiError::Configuration(format!("invalid login customer id: {}", e))
        })?;
        headers.insert(LOGIN_CUSTOMER_ID, login);

        Ok(headers)
    }

    async fn post(
        &self,
        customer_id: &str,
        segments: &[&str],
        body: Value,
    ) -> Result<Value, GoogleApiError> {
        let mut path = vec![self.api_version.as_str()];
        path.extend_from_slice(segments);
        let url = self.rest.url(&path)?;
        self.rest
            .send(Method::POST, url, Some(&body), self.headers(customer_id)?)
            .await
    }

    /// Run a GAQL query through `googleAds:searchStream`, flattening the batches.
    pub async fn search_stream(
        &self,
        customer_id: &str,
        query: &str,
    ) -> Result<Vec<Value>, GoogleApiError> {
        let response = self
            .post(
                customer_id,
                &["customers", customer_id, "googleAds:searchStream"],
                json!({ "query": query }),
            )
            .await?;

        let batches = match response {
            Value::Array(batches) => batches,
            Value::Object(_) => vec![response],
            other => {
                return Err(GoogleApiError::InvalidResponse(format!(
                    "unexpected searchStream body: {}",
                    other
                )))
            }
        };

        Ok(batches
            .into_iter()
            .filter_map(|mut batch| match batch.get_mut("results").map(Value::take) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .flatten()
            .collect())
    }

    async fn mutate(
        &self,
        customer_id: &str,
        service: &str,
        operations: Vec<Value>,
    ) -> Result<Vec<String>, GoogleApiError> {
        let response = self
            .post(
                customer_id,
                &["customers", customer_id, service],
                json!({ "operations": operations }),
            )
            .await?;

        let names = response
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| r.get("resourceName").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        tracing::info!(customer_id, service, "google ads mutate applied");
        Ok(names)
    }

    /// `campaigns:mutate`; returns the resource names of the results
    pub async fn mutate_campaigns(
        &self,
        customer_id: &str,
        operations: Vec<Value>,
    ) -> Result<Vec<String>, GoogleApiError> {
        self.mutate(customer_id, "campaigns:mutate", operations).await
    }

    pub async fn mutate_campaign_budgets(
        &self,
        customer_id: &str,
        operations: Vec<Value>,
    ) -> Result<Vec<String>, GoogleApiError> {
        self.mutate(customer_id, "campaignBudgets:mutate", operations)
            .await
    }

    pub async fn mutate_campaign_criteria(
        &self,
        customer_id: &str,
        operations: Vec<Value>,
    ) -> Result<Vec<String>, GoogleApiError> {
        self.mutate(customer_id, "campaignCriteria:mutate", operations)
            .await
    }

    pub async fn mutate_ad_group_criteria(
        &self,
        customer_id: &str,
        operations: Vec<Value>,
    ) -> Result<Vec<String>, GoogleApiError> {
        self.mutate(customer_id, "adGroupCriteria:mutate", operations)
            .await
    }

    /// Suggest geo target constants for location names.
    ///
    /// Returns the `geoTargetConstantSuggestions` entries as sent by the API.
    pub async fn suggest_geo_target_constants(
        &self,
        customer_id: &str,
        location_names: &[String],
    ) -> Result<Vec<Value>, GoogleApiError> {
        let response = self
            .post(
                customer_id,
                &["geoTargetConstants:suggest"],
                json!({ "locationNames": { "names": location_names } }),
            )
            .await?;

        Ok(match response.get("geoTargetConstantSuggestions") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        })
    }
}

/// Builder for [`GoogleAdsClient`]. The developer token and a token provider are required.
#[derive(Default)]
pub struct GoogleAdsClientBuilder {
    api_base: Option<String>,
    api_version: Option<String>,
    developer_token: Option<SecretString>,
    login_customer_id: Option<String>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    timeout: Option<Duration>,
}

impl GoogleAdsClientBuilder {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn developer_token(mut self, token: SecretString) -> Self {
        self.developer_token = Some(token);
        self
    }

    /// Manager account sent as `login-customer-id`. Without it the operated customer is used.
    pub fn login_customer_id(mut self, id: impl Into<String>) -> Self {
        self.login_customer_id = Some(id.into().replace('-', ""));
        self
    }

    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<GoogleAdsClient, GoogleApiError> {
        let developer_token = self.developer_token.ok_or_else(|| {
            GoogleApiError::Configuration(
                "GOOGLE_ADS_DEVELOPER_TOKEN is required for the Google Ads client".to_string(),
            )
        })?;
        let auth = self.token_provider.ok_or_else(|| {
            GoogleApiError::Configuration("a token provider is required".to_string())
        })?;

        let rest = RestClient::new(
            self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
            auth,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;

        Ok(GoogleAdsClient {
            rest,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            developer_token,
            login_customer_id: self.login_customer_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths() {
        assert_eq!(campaign_path("123", "456"), "customers/123/campaigns/456");
        assert_eq!(ad_group_path("123", "9"), "customers/123/adGroups/9");
        assert_eq!(geo_target_constant_path("2840"), "geoTargetConstants/2840");
    }

    #[test]
    fn test_builder_requires_developer_token() {
        let err = GoogleAdsClient::builder()
            .token_provider(Arc::new(crate::auth::StaticTokenProvider::new("t")))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_ADS_DEVELOPER_TOKEN"));
    }

    #[test]
    fn test_debug_hides_developer_token() {
        let client = GoogleAdsClient::builder()
            .developer_token(SecretString::from("dev-secret".to_string()))
            .token_provider(Arc::new(crate::auth::StaticTokenProvider::new("t")))
            .build()
            .unwrap();
        assert!(!format!("{:?}", client).contains("dev-secret"));
    }
}

#[cfg(test)]
mod wiremock_tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoogleAdsClient {
        GoogleAdsClient::builder()
            .api_base(server.uri())
            .developer_token(SecretString::from("dev-token".to_string()))
            .token_provider(Arc::new(StaticTokenProvider::new("access")))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_stream_flattens_batches() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v21/customers/1234567890/googleAds:searchStream"))
            .and(header("authorization", "Bearer access"))
            .and(header("developer-token", "dev-token"))
            .and(header("login-customer-id", "1234567890"))
            .and(body_json(json!({"query": "SELECT campaign.id FROM campaign"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"results": [{"campaign": {"id": "1"}}, {"campaign": {"id": "2"}}]},
                {"results": [{"campaign": {"id": "3"}}]},
                {"fieldMask": "campaign.id"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server)
            .search_stream("1234567890", "SELECT campaign.id FROM campaign")
            .await
            .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r["campaign"]["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_login_customer_id_override() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("login-customer-id", "9998887777"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleAdsClient::builder()
            .api_base(server.uri())
            .developer_token(SecretString::from("dev-token".to_string()))
            .login_customer_id("999-888-7777")
            .token_provider(Arc::new(StaticTokenProvider::new("access")))
            .build()
            .unwrap();

        let rows = client.search_stream("1234567890", "SELECT x").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_mutate_returns_resource_names() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v21/customers/42/campaigns:mutate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"resourceName": "customers/42/campaigns/7"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let names = client(&server)
            .mutate_campaigns(
                "42",
                vec![json!({"update": {"resourceName": "customers/42/campaigns/7", "status": "PAUSED"}, "updateMask": "status"})],
            )
            .await
            .unwrap();
        assert_eq!(names, vec!["customers/42/campaigns/7"]);
    }

    #[tokio::test]
    async fn test_suggest_geo_target_constants() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v21/geoTargetConstants:suggest"))
            .and(body_json(json!({"locationNames": {"names": ["Paris"]}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "geoTargetConstantSuggestions": [
                    {"geoTargetConstant": {"resourceName": "geoTargetConstants/1006094", "name": "Paris"}}
                ]
            })))
            .mount(&server)
            .await;

        let suggestions = client(&server)
            .suggest_geo_target_constants("42", &["Paris".to_string()])
            .await
            .unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["geoTargetConstant"]["name"], "Paris");
    }

    #[tokio::test]
    async fn test_search_stream_error_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!([{
                "error": {
                    "code": 403,
                    "message": "The caller does not have permission",
                    "status": "PERMISSION_DENIED"
                }
            }])))
            .mount(&server)
            .await;

        let err = client(&server)
            .search_stream("42", "SELECT campaign.id FROM campaign")
            .await
            .unwrap_err();
        assert!(matches!(err, GoogleApiError::PermissionDenied(_)));
        assert!(err.to_string().contains("PERMISSION_DENIED - The caller does not have permission"));
    }
}

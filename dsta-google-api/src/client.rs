//! Shared request plumbing: URL building, auth headers, error classification.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::auth::TokenProvider;
use crate::error::{parse_error_response, GoogleApiError};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// An authenticated JSON client bound to one API base URL.
#[derive(Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    base: Url,
    auth: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .field("auth", &self.auth)
            .finish()
    }
}

/// A reqwest client whose requests fail after `timeout`.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, GoogleApiError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GoogleApiError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

impl RestClient {
    pub(crate) fn new(
        base: &str,
        auth: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Result<Self, GoogleApiError> {
        let base = Url::parse(base).map_err(|e| {
            GoogleApiError::Configuration(format!("invalid API base URL '{}': {}", base, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(GoogleApiError::Configuration(format!(
                "API base URL '{}' cannot carry a path",
                base
            )));
        }

        let http = http_client(timeout)?;
        Ok(Self { http, base, auth })
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so sheet ranges such as `My Sheet!A1:C9` survive intact.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, GoogleApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                GoogleApiError::Configuration(format!("API base URL '{}' cannot carry a path", self.base))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Send a request and parse the JSON body. An empty success body yields `{}`.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        extra_headers: HeaderMap,
    ) -> Result<Value, GoogleApiError> {
        let auth = self.auth.auth_headers().await?;

        tracing::debug!(method = %method, url = %url, "google api request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .headers(auth)
            .headers(extra_headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(GoogleApiError::from_reqwest_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(GoogleApiError::from_reqwest_error)?;

        if !status.is_success() {
            let error = parse_error_response(&text, status.as_u16());
            tracing::error!(
                method = %method,
                path = url.path(),
                status = status.as_u16(),
                error = %error,
                "google api call failed"
            );
            return Err(error);
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        serde_json::from_str(&text).map_err(|e| {
            GoogleApiError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }

    pub(crate) async fn get(&self, url: Url) -> Result<Value, GoogleApiError> {
        self.send(Method::GET, url, None, HeaderMap::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    fn client(base: &str) -> RestClient {
        RestClient::new(base, Arc::new(StaticTokenProvider::new("t")), DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let url = client("https://sheets.googleapis.com")
            .url(&["v4", "spreadsheets", "abc", "values", "Q1 Plan!A1:C9"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Q1%20Plan!A1:C9"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let url = client("http://127.0.0.1:9000/proxy/")
            .url(&["v21", "customers", "123", "googleAds:searchStream"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/proxy/v21/customers/123/googleAds:searchStream"
        );
    }

    #[test]
    fn test_invalid_base_rejected() {
        let err = RestClient::new(
            "not a url",
            Arc::new(StaticTokenProvider::new("t")),
            DEFAULT_TIMEOUT,
        )
        .unwrap_err();
        assert!(matches!(err, GoogleApiError::Configuration(_)));
    }
}

//! Credential providers that produce the `Authorization` header for each request.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use google_cloud_auth::credentials::{self, CacheableResource, Credentials};
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::client::{http_client, DEFAULT_TIMEOUT};
use crate::error::GoogleApiError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const SCOPE_ADWORDS: &str = "https://www.googleapis.com/auth/adwords";
pub const SCOPE_DOUBLECLICKSEARCH: &str = "https://www.googleapis.com/auth/doubleclicksearch";
pub const SCOPE_SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";
pub const SCOPE_DATASTORE: &str = "https://www.googleapis.com/auth/datastore";

/// Scopes requested for the Sheets client
pub const SHEETS_SCOPES: &[&str] = &[SCOPE_SPREADSHEETS, SCOPE_DRIVE];

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of request authentication headers.
#[async_trait]
pub trait TokenProvider: Send + Sync + fmt::Debug {
    async fn auth_headers(&self) -> Result<HeaderMap, GoogleApiError>;
}

fn bearer(token: &str) -> Result<HeaderMap, GoogleApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| GoogleApiError::Authentication(format!("invalid access token: {}", e)))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

// ============================================================================
// Application Default Credentials
// ============================================================================

/// Application Default Credentials with explicit scopes.
pub struct AdcTokenProvider {
    credentials: Credentials,
    cached: RwLock<Option<HeaderMap>>,
}

impl AdcTokenProvider {
    pub fn new<I, S>(scopes: I) -> Result<Self, GoogleApiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = credentials::Builder::default()
            .with_scopes(scopes)
            .build()
            .map_err(|e| {
                GoogleApiError::Configuration(format!(
                    "failed to build Application Default Credentials: {e}"
                ))
            })?;
        Ok(Self::with_credentials(credentials))
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            cached: RwLock::new(None),
        }
    }
}

impl fmt::Debug for AdcTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdcTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for AdcTokenProvider {
    async fn auth_headers(&self) -> Result<HeaderMap, GoogleApiError> {
        let headers = self
            .credentials
            .headers(Default::default())
            .await
            .map_err(|e| {
                GoogleApiError::Authentication(format!("failed to obtain Google auth headers: {e}"))
            })?;

        match headers {
            CacheableResource::New { data, .. } => {
                *self.cached.write() = Some(data.clone());
                Ok(data)
            }
            CacheableResource::NotModified => self.cached.read().clone().ok_or_else(|| {
                GoogleApiError::Authentication(
                    "credentials reported NotModified before any headers were cached".to_string(),
                )
            }),
        }
    }
}

// ============================================================================
// OAuth2 refresh token
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    access_token: SecretString,
    expires_at: Instant,
}

/// Exchanges a long-lived refresh token for access tokens.
pub struct RefreshTokenProvider {
    http: reqwest::Client,
    token_uri: String,
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

impl RefreshTokenProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        refresh_token: SecretString,
    ) -> Result<Self, GoogleApiError> {
        Ok(Self {
            http: http_client(DEFAULT_TIMEOUT)?,
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            client_id: client_id.into(),
            client_secret,
            refresh_token,
            cached: tokio::sync::Mutex::new(None),
        })
    }

    /// Give up on the token endpoint after `timeout` instead of the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GoogleApiError> {
        self.http = http_client(timeout)?;
        Ok(self)
    }

    /// Override the token endpoint
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    async fn refresh(&self) -> Result<CachedToken, GoogleApiError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", self.refresh_token.expose_secret()),
        ];

        let response = self
            .http
            .post(&self.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(GoogleApiError::from_reqwest_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(GoogleApiError::from_reqwest_error)?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{} - {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status.as_u16()),
            };
            tracing::error!(status = status.as_u16(), "OAuth token refresh failed");
            return Err(GoogleApiError::Authentication(format!(
                "token refresh failed: {}",
                detail
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            GoogleApiError::InvalidResponse(format!("failed to parse token response: {}", e))
        })?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        tracing::debug!(expires_in = lifetime.as_secs(), "refreshed OAuth access token");

        Ok(CachedToken {
            access_token: token.access_token.into(),
            expires_at: Instant::now() + lifetime,
        })
    }
}

impl fmt::Debug for RefreshTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenProvider")
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for RefreshTokenProvider {
    async fn auth_headers(&self) -> Result<HeaderMap, GoogleApiError> {
        let mut cached = self.cached.lock().await;

        let fresh = cached
            .as_ref()
            .is_some_and(|t| Instant::now() + EXPIRY_MARGIN < t.expires_at);
        if !fresh {
            *cached = Some(self.refresh().await?);
        }

        match cached.as_ref() {
            Some(token) => bearer(token.access_token.expose_secret()),
            None => Err(GoogleApiError::Authentication(
                "no access token available".to_string(),
            )),
        }
    }
}

// ============================================================================
// Static token
// ============================================================================

/// A pre-minted bearer token.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn auth_headers(&self) -> Result<HeaderMap, GoogleApiError> {
        bearer(self.token.expose_secret())
    }
}


#[cfg(test)]
mod wiremock_tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> RefreshTokenProvider {
        RefreshTokenProvider::new(
            "client-1",
            SecretString::from("secret".to_string()),
            SecretString::from("refresh-1".to_string()),
        )
        .unwrap()
        .with_token_uri(format!("{}/token", server.uri()))
    }

    #[tokio::test]
    async fn test_refresh_exchange_and_cache() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        let first = provider.auth_headers().await.unwrap();
        let second = provider.auth_headers().await.unwrap();

        assert_eq!(first[AUTHORIZATION], "Bearer ya29.token");
        assert_eq!(second[AUTHORIZATION], "Bearer ya29.token");
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refreshed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "short",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server);
        provider.auth_headers().await.unwrap();
        provider.auth_headers().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_grant_is_authentication_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let err = provider(&server).auth_headers().await.unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("invalid_grant - Token has been expired"));
    }

    #[tokio::test]
    async fn test_stalled_token_endpoint_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let provider = provider(&server)
            .with_timeout(Duration::from_millis(200))
            .unwrap();
        let err = provider.auth_headers().await.unwrap_err();
        assert!(matches!(err, GoogleApiError::Network(_)), "{}", err);
        assert!(err.to_string().contains("timed out"), "{}", err);
    }
}

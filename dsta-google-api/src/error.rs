//! Error types for the Google REST clients

use serde::Deserialize;
use thiserror::Error;

/// Google's error envelope: `{"error": {"code", "message", "status"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    /// Canonical status such as `NOT_FOUND` or `PERMISSION_DENIED`
    #[serde(default)]
    pub status: String,
}

/// Errors from the Google Ads, SA360, Sheets and Firestore clients
#[derive(Debug, Error)]
pub enum GoogleApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Other(String),
}

impl GoogleApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::PermissionDenied(_))
    }

    /// Classify a Google error envelope into an error variant.
    ///
    /// The message keeps the vendor's wording as `<STATUS> - <message>`.
    pub fn from_api_error(error: &ApiError, status_code: u16) -> Self {
        let msg = if error.status.is_empty() {
            error.message.clone()
        } else {
            format!("{} - {}", error.status, error.message)
        };

        match (status_code, error.status.as_str()) {
            (401, _) | (_, "UNAUTHENTICATED") => Self::Authentication(msg),
            (403, _) | (_, "PERMISSION_DENIED") => Self::PermissionDenied(msg),
            (404, _) | (_, "NOT_FOUND") => Self::NotFound(msg),
            (429, _) | (_, "RESOURCE_EXHAUSTED") => Self::RateLimited(msg),
            (503, _) | (_, "UNAVAILABLE") => Self::ServiceUnavailable(msg),
            (400, _) | (_, "INVALID_ARGUMENT") | (_, "FAILED_PRECONDITION") => {
                Self::InvalidRequest(msg)
            }
            (500..=599, _) => Self::ServiceUnavailable(msg),
            _ => Self::Other(msg),
        }
    }

    /// Classify a transport error
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            Self::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.is_request() {
            Self::Network(format!("Request failed: {}", err))
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Build an error from a non-success HTTP status and its body.
pub(crate) fn parse_error_response(body: &str, status_code: u16) -> GoogleApiError {
    // searchStream wraps the envelope in an array
    let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok().or_else(|| {
        serde_json::from_str::<Vec<ApiErrorResponse>>(body)
            .ok()
            .and_then(|v| v.into_iter().next())
    });

    match parsed {
        Some(resp) => GoogleApiError::from_api_error(&resp.error, status_code),
        None => {
            let error = ApiError {
                code: status_code,
                message: if body.trim().is_empty() {
                    format!("HTTP {}", status_code)
                } else {
                    body.trim().to_string()
                },
                status: String::new(),
            };
            GoogleApiError::from_api_error(&error, status_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_by_status_name() {
        let err = parse_error_response(
            r#"{"error": {"code": 400, "message": "Campaign not enabled", "status": "FAILED_PRECONDITION"}}"#,
            400,
        );
        assert!(matches!(err, GoogleApiError::InvalidRequest(_)));
        assert_eq!(
            err.to_string(),
            "Invalid request: FAILED_PRECONDITION - Campaign not enabled"
        );
    }

    #[test]
    fn test_classifies_array_envelope() {
        let err = parse_error_response(
            r#"[{"error": {"code": 403, "message": "caller lacks access", "status": "PERMISSION_DENIED"}}]"#,
            403,
        );
        assert!(err.is_auth());
        assert!(err.to_string().contains("caller lacks access"));
    }

    #[test]
    fn test_plain_body_falls_back_to_http_status() {
        assert!(parse_error_response("upstream busy", 502)
            .to_string()
            .contains("upstream busy"));
        assert!(matches!(
            parse_error_response("", 429),
            GoogleApiError::RateLimited(m) if m == "HTTP 429"
        ));
        assert!(parse_error_response("{}", 404).is_not_found());
    }
}

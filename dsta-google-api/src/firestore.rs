//! Firestore v1 REST client (read-only) and typed-value decoding.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::TokenProvider;
use crate::client::{RestClient, DEFAULT_TIMEOUT};
use crate::error::GoogleApiError;

pub const DEFAULT_API_BASE: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

const PAGE_SIZE: &str = "300";
const MAX_PAGES: usize = 50;

/// A document with its fields decoded into plain JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FirestoreDocument {
    /// Last path segment of `name`
    pub id: String,
    /// Full resource name
    pub name: String,
    pub fields: Map<String, Value>,
}

impl FirestoreDocument {
    fn from_api(raw: &Value) -> Result<Self, GoogleApiError> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GoogleApiError::InvalidResponse("document without a name".to_string()))?
            .to_string();
        let id = name.rsplit('/').next().unwrap_or_default().to_string();
        let fields = match raw.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields),
            _ => Map::new(),
        };
        Ok(Self { id, name, fields })
    }

    /// Fields plus `_id`, the shape handed to agents
    pub fn to_json(&self) -> Value {
        let mut out = self.fields.clone();
        out.insert("_id".to_string(), Value::String(self.id.clone()));
        Value::Object(out)
    }
}

/// Decode a Firestore `fields` map.
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Decode one typed Firestore value (`{"stringValue": "x"}` and friends).
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue"
        | "bytesValue" => inner.clone(),
        // int64 travels as a string
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| inner.clone()),
            other => other.clone(),
        },
        "geoPointValue" => {
            let mut point = Map::new();
            point.insert(
                "latitude".to_string(),
                inner.get("latitude").cloned().unwrap_or(Value::from(0.0)),
            );
            point.insert(
                "longitude".to_string(),
                inner.get("longitude").cloned().unwrap_or(Value::from(0.0)),
            );
            Value::Object(point)
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Value::Object(decode_fields(fields)),
            _ => Value::Object(Map::new()),
        },
        "arrayValue" => match inner.get("values") {
            Some(Value::Array(values)) => Value::Array(values.iter().map(decode_value).collect()),
            _ => Value::Array(Vec::new()),
        },
        _ => value.clone(),
    }
}

#[derive(Clone, Debug)]
pub struct FirestoreClient {
    rest: RestClient,
    project_id: String,
    database: String,
}

impl FirestoreClient {
    pub fn new(project_id: impl Into<String>, auth: Arc<dyn TokenProvider>) -> Result<Self, GoogleApiError> {
        Self::with_options(DEFAULT_API_BASE, project_id, DEFAULT_DATABASE, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_base: &str,
        project_id: impl Into<String>,
        database: impl Into<String>,
        auth: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Result<Self, GoogleApiError> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(GoogleApiError::Configuration(
                "a Firestore project id is required (set GOOGLE_CLOUD_PROJECT)".to_string(),
            ));
        }
        Ok(Self {
            rest: RestClient::new(api_base, auth, timeout)?,
            project_id,
            database: database.into(),
        })
    }

    fn documents_url(&self, path: &str) -> Result<url::Url, GoogleApiError> {
        let mut segments = vec![
            "v1",
            "projects",
            self.project_id.as_str(),
            "databases",
            self.database.as_str(),
            "documents",
        ];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        self.rest.url(&segments)
    }

    /// Fetch `collection/doc[/collection/doc...]`
    pub async fn get_document(&self, path: &str) -> Result<FirestoreDocument, GoogleApiError> {
        let depth = path.split('/').filter(|s| !s.is_empty()).count();
        if depth == 0 || depth % 2 != 0 {
            return Err(GoogleApiError::InvalidRequest(format!(
                "'{}' is not a document path",
                path
            )));
        }
        let raw = self.rest.get(self.documents_url(path)?).await?;
        FirestoreDocument::from_api(&raw)
    }

    /// List every document of a collection, following page tokens.
    pub async fn list_documents(
        &self,
        collection_path: &str,
    ) -> Result<Vec<FirestoreDocument>, GoogleApiError> {
        let depth = collection_path.split('/').filter(|s| !s.is_empty()).count();
        if depth % 2 != 1 {
            return Err(GoogleApiError::InvalidRequest(format!(
                "'{}' is not a collection path",
                collection_path
            )));
        }

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut url = self.documents_url(collection_path)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.rest.get(url).await?;
            if let Some(Value::Array(raw_docs)) = response.get("documents") {
                for raw in raw_docs {
                    documents.push(FirestoreDocument::from_api(raw)?);
                }
            }

            page_token = response
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                return Ok(documents);
            }
        }

        tracing::warn!(
            collection_path,
            pages = MAX_PAGES,
            documents = documents.len(),
            "firestore listing stopped at page limit"
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_scalar_values() {
        assert_eq!(decode_value(&json!({"stringValue": "pollen"})), json!("pollen"));
        assert_eq!(decode_value(&json!({"integerValue": "42"})), json!(42));
        assert_eq!(decode_value(&json!({"doubleValue": 51.5})), json!(51.5));
        assert_eq!(decode_value(&json!({"booleanValue": true})), json!(true));
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
        assert_eq!(
            decode_value(&json!({"timestampValue": "2025-03-01T00:00:00Z"})),
            json!("2025-03-01T00:00:00Z")
        );
    }

    #[test]
    fn test_decode_nested_values() {
        let raw = json!({
            "mapValue": {"fields": {
                "instruction": {"stringValue": "Pause ads when pollen is high"},
                "ids": {"arrayValue": {"values": [{"integerValue": "1"}, {"integerValue": "2"}]}},
                "where": {"geoPointValue": {"latitude": 40.7, "longitude": -74.0}}
            }}
        });
        assert_eq!(
            decode_value(&raw),
            json!({
                "instruction": "Pause ads when pollen is high",
                "ids": [1, 2],
                "where": {"latitude": 40.7, "longitude": -74.0}
            })
        );
    }

    #[test]
    fn test_decode_empty_containers() {
        assert_eq!(decode_value(&json!({"arrayValue": {}})), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})), json!({}));
    }

    #[test]
    fn test_document_json_has_id() {
        let doc = FirestoreDocument::from_api(&json!({
            "name": "projects/p/databases/(default)/documents/GoogleAdsConfig/123",
            "fields": {"campaigns": {"mapValue": {}}}
        }))
        .unwrap();
        assert_eq!(doc.id, "123");
        assert_eq!(doc.to_json(), json!({"campaigns": {}, "_id": "123"}));
    }
}

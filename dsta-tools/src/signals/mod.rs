//! External signals (weather, pollen and similar) fetched from configured
//! HTTP APIs by latitude and longitude.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dsta_core::config::{SignalApiConfig, SignalsConfig};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use url::Url;

use crate::prelude::*;

pub const SIGNALS_TOOLSET: &str = "external_signals";

/// One configured API with its key already resolved from the environment.
#[derive(Clone, Debug)]
pub struct SignalApi {
    pub name: String,
    pub url_template: String,
    pub description: Option<String>,
    api_key: Option<SecretString>,
}

impl SignalApi {
    fn from_config(
        name: &str,
        config: &SignalApiConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Self {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| {
                let key = env(var).filter(|k| !k.is_empty());
                if key.is_none() {
                    tracing::warn!(api = name, env = var, "signal API key variable is not set");
                }
                key
            })
            .map(SecretString::from);
        Self {
            name: name.to_string(),
            url_template: config.url.clone(),
            description: config.description.clone(),
            api_key,
        }
    }

    /// Fill `{lat}`/`{lng}` and append `key=` when a key is configured.
    pub fn request_url(&self, lat: f64, lng: f64) -> Result<Url, ToolError> {
        let filled = self
            .url_template
            .replace("{lat}", &lat.to_string())
            .replace("{lng}", &lng.to_string());
        let mut url = Url::parse(&filled).map_err(|e| {
            ToolError::Custom(format!("Signal API '{}' has an invalid URL: {}", self.name, e))
        })?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key.expose_secret());
        }
        Ok(url)
    }
}

#[derive(Clone, Debug)]
struct SignalApis {
    http: reqwest::Client,
    apis: Arc<BTreeMap<String, SignalApi>>,
}

impl SignalApis {
    fn lookup(&self, name: &str) -> Result<&SignalApi, ToolError> {
        self.apis.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.apis.keys().map(String::as_str).collect();
            ToolError::validation(format!(
                "Unknown signal API '{}'. Available APIs: {}",
                name,
                known.join(", ")
            ))
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SignalInput {
    /// Name of a configured signal API, e.g. "pollen" or "weather"
    pub api_name: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

#[derive(Clone, Debug)]
pub struct GetExternalSignalTool {
    apis: SignalApis,
}

impl Tool for GetExternalSignalTool {
    type Input = SignalInput;

    fn name(&self) -> &str {
        "get_external_signal"
    }

    fn description(&self) -> &str {
        "Fetch an external signal (such as the pollen forecast or current weather) for a \
         latitude/longitude from a configured API. Returns the API's JSON response."
    }

    async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
        let api = self.apis.lookup(&input.api_name)?;
        if !(-90.0..=90.0).contains(&input.lat) || !(-180.0..=180.0).contains(&input.lng) {
            return Err(ToolError::validation(format!(
                "Coordinates out of range: lat={}, lng={}",
                input.lat, input.lng
            )));
        }

        let url = api.request_url(input.lat, input.lng)?;
        tracing::debug!(api = %api.name, lat = input.lat, lng = input.lng, "fetching external signal");

        let response = self
            .apis
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::api(format!("Signal API '{}' request failed: {}", api.name, e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::api(format!("Signal API '{}' request failed: {}", api.name, e.without_url())))?;

        if !status.is_success() {
            tracing::error!(api = %api.name, status = status.as_u16(), "signal API returned an error");
            return Err(ToolError::api(format!(
                "Signal API '{}' returned HTTP {}: {}",
                api.name,
                status.as_u16(),
                body
            )));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            ToolError::api(format!("Signal API '{}' returned invalid JSON: {}", api.name, e))
        })?;
        Ok(ToolResult::Json(value))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListSignalApisInput {}

#[derive(Clone, Debug)]
pub struct ListExternalSignalApisTool {
    apis: SignalApis,
}

impl Tool for ListExternalSignalApisTool {
    type Input = ListSignalApisInput;

    fn name(&self) -> &str {
        "list_external_signal_apis"
    }

    fn description(&self) -> &str {
        "List the external signal APIs available to get_external_signal."
    }

    async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
        let apis: Vec<Value> = self
            .apis
            .apis
            .values()
            .map(|api| {
                json!({
                    "name": api.name,
                    "description": api.description.clone().unwrap_or_default(),
                })
            })
            .collect();
        Ok(ToolResult::Json(json!(apis)))
    }
}

/// Signal APIs from `[signals]`, keys read from the process environment.
#[derive(Clone, Debug)]
pub struct ExternalSignalsToolset {
    apis: SignalApis,
}

impl ExternalSignalsToolset {
    pub fn new(config: &SignalsConfig) -> Result<Self, ToolError> {
        Self::with_env(config, |var| std::env::var(var).ok())
    }

    /// Like [`new`](Self::new) with a custom variable lookup.
    pub fn with_env<F>(config: &SignalsConfig, env: F) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Custom(format!("Failed to build HTTP client: {}", e)))?;
        let apis = config
            .apis
            .iter()
            .map(|(name, api)| (name.clone(), SignalApi::from_config(name, api, &env)))
            .collect();
        Ok(Self {
            apis: SignalApis {
                http,
                apis: Arc::new(apis),
            },
        })
    }

    pub fn api_names(&self) -> Vec<&str> {
        self.apis.apis.keys().map(String::as_str).collect()
    }
}

impl Toolset for ExternalSignalsToolset {
    fn name(&self) -> &str {
        SIGNALS_TOOLSET
    }

    fn tools(&self) -> Vec<Box<dyn DynTool>> {
        box_tools![
            GetExternalSignalTool {
                apis: self.apis.clone()
            },
            ListExternalSignalApisTool {
                apis: self.apis.clone()
            },
        ]
    }
}

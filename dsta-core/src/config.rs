//! Application configuration: optional TOML file, then environment overrides,
//! then validation.
//!
//! ```toml
//! [google_ads]
//! api_version = "v21"
//! developer_token = "${GOOGLE_ADS_DEVELOPER_TOKEN}"
//! auth = "auto"
//!
//! [firestore]
//! project_id = "my-project"
//!
//! [signals.apis.pollen]
//! url = "https://pollen.googleapis.com/v1/forecast:lookup?location.latitude={lat}&location.longitude={lng}&days=1"
//! api_key_env = "GOOGLE_MAPS_API_KEY"
//!
//! [agents.sa360_agent]
//! model = "gemini-2.5-flash"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "dsta.toml";
pub const DEFAULT_GOOGLE_ADS_ENDPOINT: &str = "https://googleads.googleapis.com";
pub const DEFAULT_GOOGLE_ADS_API_VERSION: &str = "v21";
pub const DEFAULT_SA360_ENDPOINT: &str = "https://searchads360.googleapis.com";
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";
pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_ads: GoogleAdsConfig,
    pub sa360: EndpointConfig,
    pub sheets: EndpointConfig,
    pub firestore: FirestoreConfig,
    pub signals: SignalsConfig,
    pub logging: LoggingConfig,
    pub agents: BTreeMap<String, AgentOverride>,
}

#[derive(Clone, Debug)]
pub struct GoogleAdsConfig {
    pub endpoint: String,
    pub api_version: String,
    pub developer_token: Option<SecretString>,
    /// Manager account to send as `login-customer-id`; defaults to the operated customer
    pub login_customer_id: Option<String>,
    pub auth: AuthMode,
    pub oauth: OAuthClientConfig,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct OAuthClientConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub token_uri: String,
}

impl OAuthClientConfig {
    /// All three refresh-token credentials are present
    pub fn is_complete(&self) -> bool {
        self.client_id.as_deref().is_some_and(|v| !v.is_empty())
            && self
                .client_secret
                .as_ref()
                .is_some_and(|v| !v.expose_secret().is_empty())
            && self
                .refresh_token
                .as_ref()
                .is_some_and(|v| !v.expose_secret().is_empty())
    }
}

#[derive(Clone, Debug)]
pub struct EndpointConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub endpoint: String,
    pub project_id: Option<String>,
    pub database: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SignalsConfig {
    pub apis: BTreeMap<String, SignalApiConfig>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalApiConfig {
    /// URL template with `{lat}` and `{lng}` placeholders
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Environment variable holding the API key appended as `key=`
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
}

/// How the Google Ads client obtains its access token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Application Default Credentials
    Adc,
    /// OAuth2 refresh-token exchange with the configured client
    OauthRefresh,
    /// Refresh token when all OAuth variables are set, ADC otherwise
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub log_level: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_ads: GoogleAdsConfig {
                endpoint: DEFAULT_GOOGLE_ADS_ENDPOINT.to_string(),
                api_version: DEFAULT_GOOGLE_ADS_API_VERSION.to_string(),
                developer_token: None,
                login_customer_id: None,
                auth: AuthMode::Auto,
                oauth: OAuthClientConfig {
                    client_id: None,
                    client_secret: None,
                    refresh_token: None,
                    token_uri: DEFAULT_TOKEN_URI.to_string(),
                },
                timeout_secs: 60,
            },
            sa360: EndpointConfig {
                endpoint: DEFAULT_SA360_ENDPOINT.to_string(),
                timeout_secs: 60,
            },
            sheets: EndpointConfig {
                endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
                timeout_secs: 60,
            },
            firestore: FirestoreConfig {
                endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_string(),
                project_id: None,
                database: "(default)".to_string(),
                timeout_secs: 30,
            },
            signals: SignalsConfig {
                apis: default_signal_apis(),
                timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
            agents: BTreeMap::new(),
        }
    }
}

fn default_signal_apis() -> BTreeMap<String, SignalApiConfig> {
    let mut apis = BTreeMap::new();
    apis.insert(
        "pollen".to_string(),
        SignalApiConfig {
            url: "https://pollen.googleapis.com/v1/forecast:lookup?location.latitude={lat}&location.longitude={lng}&days=1".to_string(),
            description: Some("Daily pollen index forecast (grass, tree, weed) for a location".to_string()),
            api_key_env: Some("GOOGLE_MAPS_API_KEY".to_string()),
        },
    );
    apis.insert(
        "weather".to_string(),
        SignalApiConfig {
            url: "https://weather.googleapis.com/v1/currentConditions:lookup?location.latitude={lat}&location.longitude={lng}".to_string(),
            description: Some("Current weather conditions for a location".to_string()),
            api_key_env: Some("GOOGLE_MAPS_API_KEY".to_string()),
        },
    );
    apis
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "adc" => Ok(Self::Adc),
            "oauth_refresh" | "oauth" => Ok(Self::OauthRefresh),
            "auto" => Ok(Self::Auto),
            other => Err(ConfigError::Validation(format!(
                "unsupported auth mode `{other}` (expected adc|oauth_refresh|auto)"
            ))),
        }
    }
}

impl AppConfig {
    /// Load from the file system and the process environment.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        Self::load_with_env(options, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup (used by tests).
    pub fn load_with_env<F>(options: LoadOptions, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path, &env)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides(&env)?;
        if let Some(level) = options.log_level {
            config.logging.level = level;
        }
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document on top of the defaults, without touching the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let patch = toml::from_str::<ConfigPatch>(raw).map_err(|source| ConfigError::ParseFile {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let mut config = Self::default();
        config.apply_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(ads) = patch.google_ads {
            if let Some(endpoint) = ads.endpoint {
                self.google_ads.endpoint = endpoint;
            }
            if let Some(api_version) = ads.api_version {
                self.google_ads.api_version = api_version;
            }
            if let Some(token) = ads.developer_token {
                self.google_ads.developer_token = Some(token.into());
            }
            if let Some(login) = ads.login_customer_id {
                self.google_ads.login_customer_id = Some(login);
            }
            if let Some(auth) = ads.auth {
                self.google_ads.auth = auth;
            }
            if let Some(client_id) = ads.client_id {
                self.google_ads.oauth.client_id = Some(client_id);
            }
            if let Some(client_secret) = ads.client_secret {
                self.google_ads.oauth.client_secret = Some(client_secret.into());
            }
            if let Some(refresh_token) = ads.refresh_token {
                self.google_ads.oauth.refresh_token = Some(refresh_token.into());
            }
            if let Some(token_uri) = ads.token_uri {
                self.google_ads.oauth.token_uri = token_uri;
            }
            if let Some(timeout_secs) = ads.timeout_secs {
                self.google_ads.timeout_secs = timeout_secs;
            }
        }

        if let Some(sa360) = patch.sa360 {
            sa360.apply_to(&mut self.sa360);
        }
        if let Some(sheets) = patch.sheets {
            sheets.apply_to(&mut self.sheets);
        }

        if let Some(firestore) = patch.firestore {
            if let Some(endpoint) = firestore.endpoint {
                self.firestore.endpoint = endpoint;
            }
            if let Some(project_id) = firestore.project_id {
                self.firestore.project_id = Some(project_id);
            }
            if let Some(database) = firestore.database {
                self.firestore.database = database;
            }
            if let Some(timeout_secs) = firestore.timeout_secs {
                self.firestore.timeout_secs = timeout_secs;
            }
        }

        if let Some(signals) = patch.signals {
            if signals.replace_defaults.unwrap_or(false) {
                self.signals.apis.clear();
            }
            self.signals.apis.extend(signals.apis);
            if let Some(timeout_secs) = signals.timeout_secs {
                self.signals.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        self.agents.extend(patch.agents);
    }

    fn apply_env_overrides<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = read("GOOGLE_ADS_DEVELOPER_TOKEN") {
            self.google_ads.developer_token = Some(value.into());
        }
        if let Some(value) = read("GOOGLE_ADS_LOGIN_CUSTOMER_ID") {
            self.google_ads.login_customer_id = Some(value);
        }
        if let Some(value) = read("GOOGLE_ADS_CLIENT_ID") {
            self.google_ads.oauth.client_id = Some(value);
        }
        if let Some(value) = read("GOOGLE_ADS_CLIENT_SECRET") {
            self.google_ads.oauth.client_secret = Some(value.into());
        }
        if let Some(value) = read("GOOGLE_ADS_REFRESH_TOKEN") {
            self.google_ads.oauth.refresh_token = Some(value.into());
        }
        if let Some(value) = read("DSTA_GOOGLE_ADS_AUTH") {
            self.google_ads.auth = value.parse()?;
        }
        if let Some(value) = read("DSTA_GOOGLE_ADS_API_VERSION") {
            self.google_ads.api_version = value;
        }

        let project = read("DSTA_FIRESTORE_PROJECT").or_else(|| read("GOOGLE_CLOUD_PROJECT"));
        if let Some(value) = project {
            self.firestore.project_id = Some(value);
        }
        if let Some(value) = read("DSTA_FIRESTORE_DATABASE") {
            self.firestore.database = value;
        }

        if let Some(value) = read("DSTA_SIGNALS_TIMEOUT_SECS") {
            self.signals.timeout_secs = parse_u64("DSTA_SIGNALS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read("DSTA_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read("DSTA_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("google_ads.endpoint", &self.google_ads.endpoint)?;
        validate_endpoint("google_ads.token_uri", &self.google_ads.oauth.token_uri)?;
        validate_endpoint("sa360.endpoint", &self.sa360.endpoint)?;
        validate_endpoint("sheets.endpoint", &self.sheets.endpoint)?;
        validate_endpoint("firestore.endpoint", &self.firestore.endpoint)?;

        let version = self.google_ads.api_version.as_str();
        if !(version.starts_with('v') && version.len() > 1 && version[1..].chars().all(|c| c.is_ascii_digit())) {
            return Err(ConfigError::Validation(format!(
                "google_ads.api_version must look like `v21`, got `{version}`"
            )));
        }

        if let Some(login) = &self.google_ads.login_customer_id {
            let digits: String = login.chars().filter(|c| *c != '-').collect();
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Validation(format!(
                    "google_ads.login_customer_id must be numeric, got `{login}`"
                )));
            }
        }

        if self.google_ads.auth == AuthMode::OauthRefresh && !self.google_ads.oauth.is_complete() {
            return Err(ConfigError::Validation(
                "google_ads.auth = oauth_refresh requires GOOGLE_ADS_CLIENT_ID, GOOGLE_ADS_CLIENT_SECRET and GOOGLE_ADS_REFRESH_TOKEN".to_string(),
            ));
        }

        for (name, timeout) in [
            ("google_ads.timeout_secs", self.google_ads.timeout_secs),
            ("sa360.timeout_secs", self.sa360.timeout_secs),
            ("sheets.timeout_secs", self.sheets.timeout_secs),
            ("firestore.timeout_secs", self.firestore.timeout_secs),
            ("signals.timeout_secs", self.signals.timeout_secs),
        ] {
            if timeout == 0 || timeout > 600 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be in range 1..=600"
                )));
            }
        }

        for (name, api) in &self.signals.apis {
            if !api.url.contains("{lat}") || !api.url.contains("{lng}") {
                return Err(ConfigError::Validation(format!(
                    "signals.apis.{name}.url must contain `{{lat}}` and `{{lng}}` placeholders"
                )));
            }
            validate_endpoint(&format!("signals.apis.{name}.url"), &api.url)?;
        }

        validate_log_level(&self.logging.level)?;
        Ok(())
    }

    /// The effective configuration with every secret replaced by a marker.
    pub fn redacted(&self) -> Value {
        let secret = |s: &Option<SecretString>| match s {
            Some(_) => json!("[REDACTED]"),
            None => Value::Null,
        };

        json!({
            "google_ads": {
                "endpoint": self.google_ads.endpoint,
                "api_version": self.google_ads.api_version,
                "developer_token": secret(&self.google_ads.developer_token),
                "login_customer_id": self.google_ads.login_customer_id,
                "auth": self.google_ads.auth,
                "client_id": self.google_ads.oauth.client_id,
                "client_secret": secret(&self.google_ads.oauth.client_secret),
                "refresh_token": secret(&self.google_ads.oauth.refresh_token),
                "token_uri": self.google_ads.oauth.token_uri,
                "timeout_secs": self.google_ads.timeout_secs,
            },
            "sa360": {"endpoint": self.sa360.endpoint, "timeout_secs": self.sa360.timeout_secs},
            "sheets": {"endpoint": self.sheets.endpoint, "timeout_secs": self.sheets.timeout_secs},
            "firestore": {
                "endpoint": self.firestore.endpoint,
                "project_id": self.firestore.project_id,
                "database": self.firestore.database,
                "timeout_secs": self.firestore.timeout_secs,
            },
            "signals": {"apis": self.signals.apis, "timeout_secs": self.signals.timeout_secs},
            "logging": {"level": self.logging.level, "format": self.logging.format},
            "agents": self.agents,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    google_ads: Option<GoogleAdsPatch>,
    sa360: Option<EndpointPatch>,
    sheets: Option<EndpointPatch>,
    firestore: Option<FirestorePatch>,
    signals: Option<SignalsPatch>,
    logging: Option<LoggingPatch>,
    #[serde(default)]
    agents: BTreeMap<String, AgentOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GoogleAdsPatch {
    endpoint: Option<String>,
    api_version: Option<String>,
    developer_token: Option<String>,
    login_customer_id: Option<String>,
    auth: Option<AuthMode>,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    token_uri: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndpointPatch {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

impl EndpointPatch {
    fn apply_to(self, target: &mut EndpointConfig) {
        if let Some(endpoint) = self.endpoint {
            target.endpoint = endpoint;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            target.timeout_secs = timeout_secs;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FirestorePatch {
    endpoint: Option<String>,
    project_id: Option<String>,
    database: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SignalsPatch {
    replace_defaults: Option<bool>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    apis: BTreeMap<String, SignalApiConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [
        PathBuf::from(DEFAULT_CONFIG_FILE),
        PathBuf::from("config").join(DEFAULT_CONFIG_FILE),
    ]
    .into_iter()
    .find(|path| path.exists())
}

fn read_patch<F>(path: &Path, env: &F) -> Result<ConfigPatch, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let interpolated = interpolate_env_vars(&raw, env)?;
    toml::from_str::<ConfigPatch>(&interpolated).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `${VAR}` references with values from the environment.
fn interpolate_env_vars<F>(input: &str, env: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env(&key).ok_or_else(|| ConfigError::MissingEnvInterpolation {
                var: key.clone(),
            })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn validate_endpoint(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be an http(s) URL, got `{value}`"
        )))
    }
}

fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    // Accept plain levels and env-filter directives such as `dsta_tools=debug,info`.
    let plain = ["trace", "debug", "info", "warn", "error", "off"];
    let ok = level.split(',').all(|directive| {
        let level_part = directive.rsplit('=').next().unwrap_or("").trim();
        plain.contains(&level_part.to_ascii_lowercase().as_str())
    });
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "logging.level `{level}` is not a valid level or filter directive"
        )))
    }
}

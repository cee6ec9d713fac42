//! Wiring from [`AppConfig`] to credential providers, API clients, toolsets
//! and the [`ToolRegistry`] a command runs against.

use std::sync::Arc;
use std::time::Duration;

use dsta_core::config::AppConfig;
use dsta_core::{AgentDefinition, AuthMode, ToolRegistry, Toolset};
use dsta_google_api::auth::{
    SCOPE_ADWORDS, SCOPE_DATASTORE, SCOPE_DOUBLECLICKSEARCH, SHEETS_SCOPES,
};
use dsta_google_api::{
    AdcTokenProvider, FirestoreClient, GoogleAdsClient, RefreshTokenProvider, Sa360Client,
    SheetsClient, StaticTokenProvider, TokenProvider,
};
use dsta_tools::firestore::FIRESTORE_TOOLSET;
use dsta_tools::google_ads::{GETTER_TOOLSET, UPDATER_TOOLSET};
use dsta_tools::sa360::SA360_TOOLSET;
use dsta_tools::signals::SIGNALS_TOOLSET;
use dsta_tools::{
    ExternalSignalsToolset, FirestoreToolset, GoogleAdsGetterToolset, GoogleAdsUpdaterToolset,
    Sa360Toolset,
};
use secrecy::{ExposeSecret, SecretString};

use crate::error::CliError;

/// Pre-minted bearer token used for every Google API instead of ADC
pub const ACCESS_TOKEN_ENV: &str = "DSTA_ACCESS_TOKEN";

pub const ALL_TOOLSETS: &[&str] = &[
    GETTER_TOOLSET,
    UPDATER_TOOLSET,
    SA360_TOOLSET,
    FIRESTORE_TOOLSET,
    SIGNALS_TOOLSET,
];

/// Where clients get their credentials.
#[derive(Clone, Debug)]
pub enum AuthSource {
    /// ADC per API, or the OAuth refresh token for Google Ads per `google_ads.auth`
    Live,
    /// One bearer token for every API
    Static(SecretString),
    /// No credentials. Clients are built only to describe their tools.
    Describe,
}

impl AuthSource {
    /// [`AuthSource::Static`] when `DSTA_ACCESS_TOKEN` is set, otherwise [`AuthSource::Live`].
    pub fn from_env() -> Self {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Self::Static(SecretString::from(token)),
            _ => Self::Live,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Api {
    GoogleAds,
    Sa360,
    Sheets,
    Firestore,
}

impl Api {
    fn scopes(self) -> Vec<&'static str> {
        match self {
            Self::GoogleAds => vec![SCOPE_ADWORDS],
            Self::Sa360 => vec![SCOPE_DOUBLECLICKSEARCH],
            Self::Sheets => SHEETS_SCOPES.to_vec(),
            Self::Firestore => vec![SCOPE_DATASTORE],
        }
    }
}

/// Whether the Google Ads client should use the OAuth refresh token.
pub fn uses_refresh_token(config: &AppConfig) -> bool {
    match config.google_ads.auth {
        AuthMode::Adc => false,
        AuthMode::OauthRefresh => true,
        AuthMode::Auto => config.google_ads.oauth.is_complete(),
    }
}

fn refresh_provider(config: &AppConfig) -> Result<Arc<dyn TokenProvider>, CliError> {
    let oauth = &config.google_ads.oauth;
    match (&oauth.client_id, &oauth.client_secret, &oauth.refresh_token) {
        (Some(client_id), Some(secret), Some(refresh)) => Ok(Arc::new(
            RefreshTokenProvider::new(client_id.clone(), secret.clone(), refresh.clone())?
                .with_token_uri(oauth.token_uri.clone()),
        )),
        _ => Err(CliError::MissingSetting(
            "GOOGLE_ADS_CLIENT_ID, GOOGLE_ADS_CLIENT_SECRET and GOOGLE_ADS_REFRESH_TOKEN"
                .to_string(),
        )),
    }
}

fn token_provider(
    config: &AppConfig,
    api: Api,
    auth: &AuthSource,
) -> Result<Arc<dyn TokenProvider>, CliError> {
    match auth {
        AuthSource::Describe => Ok(Arc::new(StaticTokenProvider::new(String::new()))),
        AuthSource::Static(token) => Ok(Arc::new(StaticTokenProvider::new(
            token.expose_secret().to_string(),
        ))),
        AuthSource::Live if api == Api::GoogleAds && uses_refresh_token(config) => {
            tracing::debug!("Google Ads uses the OAuth refresh token");
            refresh_provider(config)
        }
        AuthSource::Live => {
            tracing::debug!(api = ?api, "using Application Default Credentials");
            Ok(Arc::new(AdcTokenProvider::new(api.scopes())?))
        }
    }
}

fn google_ads_client(config: &AppConfig, auth: &AuthSource) -> Result<GoogleAdsClient, CliError> {
    let ads = &config.google_ads;
    let developer_token = match (&ads.developer_token, auth) {
        (Some(token), _) => token.clone(),
        (None, AuthSource::Describe) => SecretString::from(String::from("unset")),
        (None, _) => {
            return Err(CliError::MissingSetting(
                "GOOGLE_ADS_DEVELOPER_TOKEN is required for the Google Ads toolsets".to_string(),
            ))
        }
    };

    let mut builder = GoogleAdsClient::builder()
        .api_base(ads.endpoint.clone())
        .api_version(ads.api_version.clone())
        .developer_token(developer_token)
        .token_provider(token_provider(config, Api::GoogleAds, auth)?)
        .timeout(Duration::from_secs(ads.timeout_secs));
    if let Some(login) = &ads.login_customer_id {
        builder = builder.login_customer_id(login.clone());
    }
    Ok(builder.build()?)
}

fn firestore_client(config: &AppConfig, auth: &AuthSource) -> Result<FirestoreClient, CliError> {
    let firestore = &config.firestore;
    let project_id = match (&firestore.project_id, auth) {
        (Some(project), _) => project.clone(),
        (None, AuthSource::Describe) => String::from("unset"),
        (None, _) => {
            return Err(CliError::MissingSetting(
                "GOOGLE_CLOUD_PROJECT (or firestore.project_id) is required for the firestore toolset"
                    .to_string(),
            ))
        }
    };
    Ok(FirestoreClient::with_options(
        &firestore.endpoint,
        project_id,
        firestore.database.clone(),
        token_provider(config, Api::Firestore, auth)?,
        Duration::from_secs(firestore.timeout_secs),
    )?)
}

/// Build one toolset by name.
pub fn build_toolset(
    config: &AppConfig,
    name: &str,
    auth: &AuthSource,
) -> Result<Box<dyn Toolset>, CliError> {
    let toolset: Box<dyn Toolset> = match name {
        GETTER_TOOLSET => Box::new(GoogleAdsGetterToolset::new(google_ads_client(config, auth)?)),
        UPDATER_TOOLSET => Box::new(GoogleAdsUpdaterToolset::new(google_ads_client(config, auth)?)),
        SA360_TOOLSET => {
            let sa360 = Sa360Client::with_options(
                &config.sa360.endpoint,
                token_provider(config, Api::Sa360, auth)?,
                Duration::from_secs(config.sa360.timeout_secs),
            )?;
            let sheets = SheetsClient::with_options(
                &config.sheets.endpoint,
                token_provider(config, Api::Sheets, auth)?,
                Duration::from_secs(config.sheets.timeout_secs),
            )?;
            Box::new(Sa360Toolset::new(sa360, sheets))
        }
        FIRESTORE_TOOLSET => Box::new(FirestoreToolset::new(firestore_client(config, auth)?)),
        SIGNALS_TOOLSET => Box::new(ExternalSignalsToolset::new(&config.signals)?),
        other => {
            return Err(CliError::Registry(
                dsta_core::RegistryError::UnknownToolset(other.to_string()),
            ))
        }
    };
    Ok(toolset)
}

/// A registry holding the tools of the named toolsets.
pub fn build_registry<S: AsRef<str>>(
    config: &AppConfig,
    toolsets: &[S],
    auth: &AuthSource,
) -> Result<ToolRegistry, CliError> {
    let mut registry = ToolRegistry::new();
    for name in toolsets {
        let toolset = build_toolset(config, name.as_ref(), auth)?;
        registry.register(toolset.as_ref())?;
    }
    tracing::debug!(tools = registry.len(), "tool registry built");
    Ok(registry)
}

/// The registry an agent would be handed.
pub fn agent_registry(
    config: &AppConfig,
    agent: &AgentDefinition,
    auth: &AuthSource,
) -> Result<ToolRegistry, CliError> {
    build_registry(config, agent.toolsets.as_slice(), auth)
}

/// Name of the toolset that provides `tool`.
pub fn toolset_for_tool(config: &AppConfig, tool: &str) -> Result<String, CliError> {
    let registry = build_registry(config, ALL_TOOLSETS, &AuthSource::Describe)?;
    registry
        .toolset_of(tool)
        .map(str::to_string)
        .ok_or_else(|| CliError::UnknownTool(tool.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_prefers_complete_oauth() {
        let mut config = AppConfig::default();
        assert!(!uses_refresh_token(&config));

        config.google_ads.oauth.client_id = Some("id".into());
        config.google_ads.oauth.client_secret = Some(SecretString::from("secret".to_string()));
        assert!(!uses_refresh_token(&config));

        config.google_ads.oauth.refresh_token = Some(SecretString::from("refresh".to_string()));
        assert!(uses_refresh_token(&config));

        config.google_ads.auth = AuthMode::Adc;
        assert!(!uses_refresh_token(&config));
    }

    #[test]
    fn test_live_ads_client_requires_developer_token() {
        let config = AppConfig::default();
        let err = build_toolset(
            &config,
            GETTER_TOOLSET,
            &AuthSource::Static(SecretString::from("t".to_string())),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("GOOGLE_ADS_DEVELOPER_TOKEN"));
    }

    #[test]
    fn test_describe_builds_every_toolset() {
        let registry =
            build_registry(&AppConfig::default(), ALL_TOOLSETS, &AuthSource::Describe).unwrap();
        assert_eq!(registry.toolset_of("reconcile_sa360_campaign"), Some("sa360"));
        assert_eq!(registry.toolset_of("get_firestore_document"), Some("firestore"));
        assert_eq!(registry.len(), 17);
    }

    #[test]
    fn test_unknown_tool() {
        let err = toolset_for_tool(&AppConfig::default(), "launch_rocket").unwrap_err();
        assert!(matches!(err, CliError::UnknownTool(_)));
    }
}

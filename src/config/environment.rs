// ABOUTME: Environment-based configuration for the Strava client and the flow runtime
// ABOUTME: Parses credentials, endpoints, timeouts, and scheduling options with defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use super::ConfigError;
use crate::flows::AuthorizeSettings;
use crate::logging::LoggingConfig;
use crate::runtime::RuntimeOptions;
use stravels_core::constants::{env_keys, linking, strava};
use stravels_providers::StravaClientConfig;

/// Default HTTP request timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default HTTP connect timeout in seconds
const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Strava client configuration
#[derive(Debug, Clone)]
pub struct StravaConfig {
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Redirect URI the deep link arrives on
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Strava origin
    pub base_url: String,
    /// Pre-issued access token for fetch and logout commands
    pub access_token: Option<String>,
    /// Page size
    pub per_page: u32,
    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
    /// HTTP connect timeout in seconds
    pub http_connect_timeout_secs: u64,
}

impl Default for StravaConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: strava::DEFAULT_REDIRECT_URI.to_owned(),
            scopes: vec![strava::DEFAULT_SCOPES.to_owned()],
            base_url: strava::BASE_URL.to_owned(),
            access_token: None,
            per_page: strava::DEFAULT_PER_PAGE,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            http_connect_timeout_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl StravaConfig {
    /// Load Strava configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        let per_page: u32 = parse_env_or(env_keys::STRAVA_PER_PAGE, strava::DEFAULT_PER_PAGE)?;
        let clamped = per_page.clamp(1, strava::MAX_PER_PAGE);
        if clamped != per_page {
            warn!(per_page, clamped, "STRAVA_PER_PAGE out of range, clamping");
        }

        Ok(Self {
            client_id: env_var_opt(env_keys::STRAVA_CLIENT_ID),
            client_secret: env_var_opt(env_keys::STRAVA_CLIENT_SECRET),
            redirect_uri: env_var_or(env_keys::STRAVA_REDIRECT_URI, strava::DEFAULT_REDIRECT_URI),
            scopes: parse_scopes(&env_var_or(env_keys::STRAVA_SCOPES, strava::DEFAULT_SCOPES)),
            base_url: env_var_or(env_keys::STRAVA_BASE_URL, strava::BASE_URL),
            access_token: env_var_opt(env_keys::STRAVA_ACCESS_TOKEN),
            per_page: clamped,
            http_timeout_secs: parse_env_or(
                env_keys::HTTP_TIMEOUT_SECS,
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            http_connect_timeout_secs: parse_env_or(
                env_keys::HTTP_CONNECT_TIMEOUT_SECS,
                DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }

    /// Check that the OAuth client credentials are present
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing credential
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_none() {
            return Err(ConfigError::MissingField(env_keys::STRAVA_CLIENT_ID));
        }
        if self.client_secret.is_none() {
            return Err(ConfigError::MissingField(env_keys::STRAVA_CLIENT_SECRET));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ValueOutOfRange(env_keys::HTTP_TIMEOUT_SECS));
        }
        Ok(())
    }

    /// Settings for [`stravels_providers::StravaClient`]
    #[must_use]
    pub fn to_client_config(&self) -> StravaClientConfig {
        StravaClientConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            scopes: self.scopes.clone(),
            base_url: self.base_url.clone(),
            per_page: self.per_page,
        }
    }
}

/// Flow runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Deadline for the OAuth redirect; unbounded when `None`
    pub redirect_timeout: Option<Duration>,
    /// Start a token exchange when authorization succeeds
    pub chain_token_exchange: bool,
    /// Deep-link event name
    pub deep_link_event: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            redirect_timeout: None,
            chain_token_exchange: true,
            deep_link_event: linking::DEFAULT_EVENT.to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect timeout is not a number of seconds, or
    /// if the chaining flag is not a boolean
    pub fn from_env() -> Result<Self, ConfigError> {
        let redirect_timeout = match env_var_opt(env_keys::REDIRECT_TIMEOUT_SECS) {
            None => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::Parse {
                        key: env_keys::REDIRECT_TIMEOUT_SECS,
                        value: raw,
                    })
                }
            },
        };

        let chain_token_exchange = match env_var_opt(env_keys::CHAIN_TOKEN_EXCHANGE) {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Parse {
                key: env_keys::CHAIN_TOKEN_EXCHANGE,
                value: raw,
            })?,
        };

        Ok(Self {
            redirect_timeout,
            chain_token_exchange,
            deep_link_event: env_var_or(env_keys::DEEP_LINK_EVENT, linking::DEFAULT_EVENT),
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Strava client settings
    pub strava: StravaConfig,
    /// Runtime policy
    pub runtime: RuntimeConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load the full configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if any section fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            strava: StravaConfig::from_env()?,
            runtime: RuntimeConfig::from_env()?,
            logging: LoggingConfig::from_env(),
        };
        debug!(
            base_url = %config.strava.base_url,
            redirect_uri = %config.strava.redirect_uri,
            has_client_id = config.strava.client_id.is_some(),
            has_access_token = config.strava.access_token.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Scheduling options for [`crate::runtime::Runtime`]
    #[must_use]
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            authorize: AuthorizeSettings {
                event_name: self.runtime.deep_link_event.clone(),
                redirect_uri: self.strava.redirect_uri.clone(),
                redirect_timeout: self.runtime.redirect_timeout,
            },
            chain_token_exchange: self.runtime.chain_token_exchange,
        }
    }
}

/// Parse a boolean flag value
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma separated scope list
fn parse_scopes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Get environment variable, treating empty values as unset
fn env_var_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env_var_opt(key).unwrap_or_else(|| default.to_owned())
}

/// Parse environment variable or return the default when unset
fn parse_env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    env_var_opt(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|_| ConfigError::Parse { key, value: raw })
    })
}

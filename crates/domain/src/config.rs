//! Pipeline configuration structures
//!
//! These are plain serde structures. Loading them from the environment or
//! from JSON/TOML files lives in `authpipe-infra`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCEPT_HEADER, DEFAULT_AUTH_FAILURE_STATUSES, DEFAULT_KEYCHAIN_ACCOUNT,
    DEFAULT_KEYCHAIN_SERVICE, DEFAULT_REFRESH_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    JSON_CONTENT_TYPE,
};
use crate::errors::{ConfigError, ConfigResult};
use crate::impl_str_conversions;
use crate::types::Headers;
use crate::utils::serde::duration_millis;
use crate::utils::url::is_absolute;

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base URL that relative request URLs are joined onto
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default per-request timeout (milliseconds on the wire)
    #[serde(default = "default_request_timeout", with = "duration_millis")]
    pub request_timeout: Duration,

    /// Statuses classified as authorization failures
    #[serde(default = "default_auth_failure_statuses")]
    pub auth_failure_statuses: Vec<u16>,

    /// Headers added to every request before caller headers
    #[serde(default = "default_headers")]
    pub default_headers: Headers,

    pub refresh: RefreshConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl PipelineConfig {
    /// Minimal configuration pointing at a refresh endpoint
    pub fn new(refresh_url: impl Into<String>) -> Self {
        Self {
            base_url: None,
            request_timeout: default_request_timeout(),
            auth_failure_statuses: default_auth_failure_statuses(),
            default_headers: default_headers(),
            refresh: RefreshConfig::new(refresh_url),
            storage: StorageConfig::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] or [`ConfigError::Missing`] describing
    /// the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(base_url) = &self.base_url {
            if !is_absolute(base_url) {
                return Err(ConfigError::Invalid(format!(
                    "base_url must be an absolute http(s) URL, got '{base_url}'"
                )));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be greater than zero".into()));
        }

        if self.auth_failure_statuses.is_empty() {
            return Err(ConfigError::Invalid(
                "auth_failure_statuses must contain at least one status".into(),
            ));
        }

        if let Some(status) =
            self.auth_failure_statuses.iter().find(|s| !(100..=599).contains(*s))
        {
            return Err(ConfigError::Invalid(format!(
                "invalid HTTP status in auth_failure_statuses: {status}"
            )));
        }

        self.refresh.validate()?;
        self.storage.validate()
    }
}

/// Wire encoding of the refresh request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshFormat {
    /// `{"refreshToken": "..."}`
    #[default]
    Json,
    /// `grant_type=refresh_token&refresh_token=...`
    #[serde(rename = "oauth_form")]
    OAuthForm,
}

impl_str_conversions!(RefreshFormat {
    Json => "json",
    OAuthForm => "oauth_form",
});

/// Refresh endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Absolute URL, or relative to `base_url`
    pub url: String,

    #[serde(default)]
    pub format: RefreshFormat,

    /// Sent as `client_id` with [`RefreshFormat::OAuthForm`]
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default = "default_refresh_timeout", with = "duration_millis")]
    pub timeout: Duration,
}

impl RefreshConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: RefreshFormat::default(),
            client_id: None,
            timeout: default_refresh_timeout(),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("refresh.url".into()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("refresh.timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Where the credential pair is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Keychain,
    File,
}

impl_str_conversions!(StorageBackend {
    Memory => "memory",
    Keychain => "keychain",
    File => "file",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Keychain service name
    #[serde(default = "default_service")]
    pub service: String,

    /// Keychain account name
    #[serde(default = "default_account")]
    pub account: String,

    /// Credential file, required for [`StorageBackend::File`]
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            service: default_service(),
            account: default_account(),
            path: None,
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::Keychain => {
                if self.service.is_empty() || self.account.is_empty() {
                    return Err(ConfigError::Invalid(
                        "storage.service and storage.account must not be empty".into(),
                    ));
                }
                Ok(())
            }
            StorageBackend::File => match &self.path {
                Some(_) => Ok(()),
                None => Err(ConfigError::Missing("storage.path".into())),
            },
        }
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
}

fn default_refresh_timeout() -> Duration {
    Duration::from_millis(DEFAULT_REFRESH_TIMEOUT_MS)
}

fn default_auth_failure_statuses() -> Vec<u16> {
    DEFAULT_AUTH_FAILURE_STATUSES.to_vec()
}

fn default_headers() -> Headers {
    [(ACCEPT_HEADER, JSON_CONTENT_TYPE)].into_iter().collect()
}

fn default_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

fn default_account() -> String {
    DEFAULT_KEYCHAIN_ACCOUNT.to_string()
}

//! Configuration loader
//!
//! Loads pipeline configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `AUTHPIPE_REFRESH_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `AUTHPIPE_REFRESH_URL`: Refresh endpoint (required)
//! - `AUTHPIPE_BASE_URL`: Base URL for relative request URLs
//! - `AUTHPIPE_REQUEST_TIMEOUT_MS`: Per-request timeout in milliseconds
//! - `AUTHPIPE_AUTH_FAILURE_STATUSES`: Comma separated status codes
//! - `AUTHPIPE_REFRESH_FORMAT`: `json` or `oauth_form`
//! - `AUTHPIPE_REFRESH_CLIENT_ID`: OAuth client id sent with form refreshes
//! - `AUTHPIPE_REFRESH_TIMEOUT_MS`: Refresh timeout in milliseconds
//! - `AUTHPIPE_STORAGE_BACKEND`: `memory`, `keychain` or `file`
//! - `AUTHPIPE_KEYCHAIN_SERVICE` / `AUTHPIPE_KEYCHAIN_ACCOUNT`: Keychain entry
//! - `AUTHPIPE_CREDENTIAL_FILE`: Path for the file backend
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./authpipe.json` or `./authpipe.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use authpipe_domain::constants::{
    ENV_AUTH_FAILURE_STATUSES, ENV_BASE_URL, ENV_CREDENTIAL_FILE, ENV_KEYCHAIN_ACCOUNT,
    ENV_KEYCHAIN_SERVICE, ENV_REFRESH_CLIENT_ID, ENV_REFRESH_FORMAT, ENV_REFRESH_TIMEOUT_MS,
    ENV_REFRESH_URL, ENV_REQUEST_TIMEOUT_MS, ENV_STORAGE_BACKEND,
};
use authpipe_domain::{ConfigError, ConfigResult, PipelineConfig};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["authpipe.json", "authpipe.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the refresh URL
/// is not set there, falls back to a config file.
///
/// # Errors
/// Returns [`ConfigError`] if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> ConfigResult<PipelineConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(ConfigError::Missing(var)) if var == ENV_REFRESH_URL => {
            tracing::debug!(missing = %var, "Environment incomplete, trying file");
            load_from_file(None)
        }
        Err(other) => Err(other),
    }
}

/// Load configuration from environment variables
///
/// Only `AUTHPIPE_REFRESH_URL` is required; every other value falls back to
/// its default.
///
/// # Errors
/// Returns [`ConfigError::Missing`] if the refresh URL is not set, and
/// [`ConfigError::Invalid`] if a value cannot be parsed or fails validation.
pub fn load_from_env() -> ConfigResult<PipelineConfig> {
    let mut config = PipelineConfig::new(env_var(ENV_REFRESH_URL)?);

    config.base_url = env_opt(ENV_BASE_URL);

    if let Some(timeout) = env_millis(ENV_REQUEST_TIMEOUT_MS)? {
        config.request_timeout = timeout;
    }
    if let Some(statuses) = env_opt(ENV_AUTH_FAILURE_STATUSES) {
        config.auth_failure_statuses = parse_status_list(&statuses)?;
    }

    if let Some(format) = env_parse(ENV_REFRESH_FORMAT)? {
        config.refresh.format = format;
    }
    config.refresh.client_id = env_opt(ENV_REFRESH_CLIENT_ID);
    if let Some(timeout) = env_millis(ENV_REFRESH_TIMEOUT_MS)? {
        config.refresh.timeout = timeout;
    }

    if let Some(backend) = env_parse(ENV_STORAGE_BACKEND)? {
        config.storage.backend = backend;
    }
    if let Some(service) = env_opt(ENV_KEYCHAIN_SERVICE) {
        config.storage.service = service;
    }
    if let Some(account) = env_opt(ENV_KEYCHAIN_ACCOUNT) {
        config.storage.account = account;
    }
    config.storage.path = env_opt(ENV_CREDENTIAL_FILE).map(PathBuf::from);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns [`ConfigError`] if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> ConfigResult<PipelineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::File(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConfigError::File("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConfigError::File(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> ConfigResult<PipelineConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("Invalid JSON format: {e}"))),
        _ => Err(ConfigError::Parse(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and grandparent, then
/// the same three levels relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns [`ConfigError::Missing`] if the variable is unset or blank.
fn env_var(key: &str) -> ConfigResult<String> {
    env_opt(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Optional environment variable; blank values count as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr<Err = String>,
{
    env_opt(key)
        .map(|raw| raw.parse::<T>().map_err(|e| ConfigError::Invalid(format!("{key}: {e}"))))
        .transpose()
}

fn env_millis(key: &str) -> ConfigResult<Option<Duration>> {
    env_opt(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::Invalid(format!("{key}: {e}")))
        })
        .transpose()
}

/// Parse a comma separated status list such as `401, 403`
fn parse_status_list(raw: &str) -> ConfigResult<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>().map_err(|e| {
                ConfigError::Invalid(format!("{ENV_AUTH_FAILURE_STATUSES}: '{s}': {e}"))
            })
        })
        .collect()
}

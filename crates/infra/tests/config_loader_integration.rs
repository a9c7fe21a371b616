//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! turning it into a pipeline.

use std::io::Write;
use std::time::Duration;

use authpipe_domain::{RefreshFormat, StorageBackend};
use authpipe_infra::{build_pipeline, config};
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "base_url": "https://api.example.com/v1",
        "request_timeout": 12000,
        "auth_failure_statuses": [401],
        "default_headers": { "Accept": "application/json", "X-Client": "integration" },
        "refresh": {
            "url": "/auth/refresh",
            "format": "json"
        },
        "storage": {
            "backend": "memory"
        }
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let result = config::load_from_file(Some(path.clone()));
    assert!(result.is_ok(), "Failed to load config from JSON file: {:?}", result.err());

    let config = result.unwrap();
    assert_eq!(config.base_url.as_deref(), Some("https://api.example.com/v1"));
    assert_eq!(config.request_timeout, Duration::from_secs(12));
    assert_eq!(config.auth_failure_statuses, vec![401]);
    assert_eq!(config.default_headers.get("x-client"), Some("integration"));
    assert_eq!(config.refresh.format, RefreshFormat::Json);
    assert_eq!(config.storage.backend, StorageBackend::Memory);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
base_url = "https://api.example.com"

[refresh]
url = "https://auth.example.com/oauth/token"
format = "oauth_form"
client_id = "desktop-app"
timeout = 5000

[storage]
backend = "keychain"
service = "com.example.app"
account = "ada@example.com"
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("toml");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let config = config::load_from_file(Some(path.clone())).expect("TOML config should load");

    assert_eq!(config.refresh.url, "https://auth.example.com/oauth/token");
    assert_eq!(config.refresh.format, RefreshFormat::OAuthForm);
    assert_eq!(config.refresh.client_id.as_deref(), Some("desktop-app"));
    assert_eq!(config.refresh.timeout, Duration::from_secs(5));
    assert_eq!(config.storage.backend, StorageBackend::Keychain);
    assert_eq!(config.storage.service, "com.example.app");
    assert_eq!(config.request_timeout, Duration::from_secs(30), "default applies");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_invalid_status_in_file_is_rejected() {
    let json_content = r#"{
        "auth_failure_statuses": [401, 999],
        "refresh": { "url": "https://auth.example.com/refresh" }
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");
    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert!(err.to_string().contains("999"));

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_loaded_config_builds_pipeline() -> anyhow::Result<()> {
    let json_content = r#"{
        "base_url": "https://api.example.com",
        "refresh": { "url": "/auth/refresh" }
    }"#;

    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(json_content.as_bytes())?;
    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path)?;

    let config = config::load_from_file(Some(path.clone()))?;
    let pipeline = build_pipeline(&config)?;

    assert_eq!(pipeline.options().base_url.as_deref(), Some("https://api.example.com"));
    assert!(!pipeline.is_authenticated().await);

    std::fs::remove_file(path)?;
    Ok(())
}

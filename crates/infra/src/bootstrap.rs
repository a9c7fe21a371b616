//! Pipeline assembly from configuration

use std::sync::Arc;

use authpipe_common::{
    AuthenticatedPipeline, CredentialStore, HttpRefreshExecutor, MemoryCredentialStore,
    PipelineOptions, TracingNotifier, Transport,
};
use authpipe_domain::{ConfigError, PipelineConfig, StorageBackend, StorageConfig};
use tracing::info;

use crate::errors::InfraError;
use crate::http::ReqwestTransport;
use crate::storage::{FileCredentialStore, KeychainCredentialStore};

/// Build a ready-to-use pipeline from validated configuration.
///
/// Wires a [`ReqwestTransport`] shared by requests and refreshes, the
/// configured credential store, an [`HttpRefreshExecutor`] and a
/// [`TracingNotifier`]. Applications that want to react to session expiry
/// should assemble the pipeline with
/// [`AuthenticatedPipeline::builder`] and their own notifier instead.
///
/// # Errors
/// Returns [`InfraError::Config`] if the configuration is invalid, or the
/// transport or store error if either cannot be created.
pub fn build_pipeline(config: &PipelineConfig) -> Result<AuthenticatedPipeline, InfraError> {
    config.validate()?;

    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
    let store = build_store(&config.storage)?;
    let refresher = Arc::new(HttpRefreshExecutor::from_config(Arc::clone(&transport), config)?);

    info!(
        refresh_url = %refresher.url(),
        storage = %config.storage.backend,
        "Assembled authenticated pipeline"
    );

    Ok(AuthenticatedPipeline::builder(transport, store, refresher)
        .notifier(Arc::new(TracingNotifier))
        .options(PipelineOptions::from(config))
        .build())
}

/// Open the credential store selected by `storage.backend`.
///
/// # Errors
/// Returns [`InfraError::Config`] if the file backend has no path, or
/// [`InfraError::Store`] if the keychain entry cannot be opened.
pub fn build_store(storage: &StorageConfig) -> Result<Arc<dyn CredentialStore>, InfraError> {
    let store: Arc<dyn CredentialStore> = match storage.backend {
        StorageBackend::Memory => Arc::new(MemoryCredentialStore::new()),
        StorageBackend::Keychain => {
            Arc::new(KeychainCredentialStore::new(&storage.service, &storage.account)?)
        }
        StorageBackend::File => {
            let path = storage
                .path
                .clone()
                .ok_or_else(|| ConfigError::Missing("storage.path".into()))?;
            Arc::new(FileCredentialStore::new(path))
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use authpipe_domain::Credential;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig::new("");
        let err = build_pipeline(&config).unwrap_err();
        assert!(matches!(err, InfraError::Config(ConfigError::Missing(_))));
    }

    #[test]
    fn relative_refresh_url_needs_base_url() {
        let config = PipelineConfig::new("/auth/refresh");
        let err = build_pipeline(&config).unwrap_err();
        assert!(matches!(err, InfraError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn memory_backend_starts_logged_out() {
        let config = PipelineConfig::new("https://auth.example.com/refresh");
        let pipeline = build_pipeline(&config).unwrap();

        assert!(!pipeline.is_authenticated().await);
        assert_eq!(pipeline.options().auth_failure_statuses, vec![401, 403]);
    }

    #[tokio::test]
    async fn file_backend_uses_configured_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");
        let storage = StorageConfig {
            backend: StorageBackend::File,
            path: Some(path.clone()),
            ..StorageConfig::default()
        };

        let store = build_store(&storage).unwrap();
        store.set(&Credential::new("a1", "r1")).await.unwrap();

        assert!(path.exists());
    }

    #[test]
    fn file_backend_without_path_is_missing() {
        let storage = StorageConfig { backend: StorageBackend::File, ..StorageConfig::default() };
        assert!(matches!(build_store(&storage), Err(InfraError::Config(ConfigError::Missing(_)))));
    }
}

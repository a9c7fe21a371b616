//! Credential storage in a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use authpipe_common::CredentialStore;
use authpipe_domain::{Credential, CredentialStoreError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// [`CredentialStore`] persisting the pair as JSON at a fixed path
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// reader never observes a partially written credential. On Unix the file is
/// created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(credential)?;
        let temp = self.temp_path();

        let mut file = open_private(&temp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(err) = fs::rename(&temp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!(
                    path = %temp.display(),
                    error = %cleanup,
                    "Failed to remove temp credential file"
                );
            }
            return Err(err.into());
        }

        debug!(path = %self.path.display(), "Credential file written");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Credential file removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

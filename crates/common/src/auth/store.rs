//! In-process credential store

use async_trait::async_trait;
use authpipe_domain::{Credential, CredentialStoreError};
use parking_lot::RwLock;

use super::traits::CredentialStore;

/// Credential held in memory for the lifetime of the process
///
/// Default backend when no persistent storage is configured.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `credential`
    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self { credential: RwLock::new(Some(credential)) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.credential.read().clone())
    }

    async fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *self.credential.write() = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.credential.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().await.unwrap(), None);

        let credential = Credential::new("access", "refresh");
        store.set(&credential).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(credential));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);

        // clearing twice is fine
        store.clear().await.unwrap();
    }
}

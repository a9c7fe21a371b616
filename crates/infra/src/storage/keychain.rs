//! Credential storage in the platform keychain.
//!
//! The pair is kept as two secrets under one service name so the refresh
//! token can outlive access-token rotations:
//!
//! - `access.<account>`
//! - `refresh.<account>`

use async_trait::async_trait;
use authpipe_common::CredentialStore;
use authpipe_domain::{Credential, CredentialStoreError};
use keyring::{Entry, Error as KeyringError};
use tracing::debug;

use crate::errors::IntoStoreError;

const ACCESS_PREFIX: &str = "access.";
const REFRESH_PREFIX: &str = "refresh.";

/// [`CredentialStore`] backed by the OS keychain
pub struct KeychainCredentialStore {
    service: String,
    account: String,
    access: Entry,
    refresh: Entry,
}

impl std::fmt::Debug for KeychainCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainCredentialStore")
            .field("service", &self.service)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl KeychainCredentialStore {
    /// Open the entries for `account` under `service`.
    ///
    /// # Errors
    /// Returns [`CredentialStoreError::Access`] if the platform rejects the
    /// entry attributes.
    pub fn new(
        service: impl Into<String>,
        account: impl Into<String>,
    ) -> Result<Self, CredentialStoreError> {
        let service = service.into();
        let account = account.into();

        let access = Entry::new(&service, &format!("{ACCESS_PREFIX}{account}"))
            .map_err(IntoStoreError::into_store_error)?;
        let refresh = Entry::new(&service, &format!("{REFRESH_PREFIX}{account}"))
            .map_err(IntoStoreError::into_store_error)?;

        Ok(Self { service, account, access, refresh })
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }
}

fn read_secret(entry: &Entry) -> Result<Option<String>, CredentialStoreError> {
    match entry.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(other) => Err(other.into_store_error()),
    }
}

fn delete_secret(entry: &Entry) -> Result<(), CredentialStoreError> {
    match entry.delete_credential() {
        Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
        Err(other) => Err(other.into_store_error()),
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let Some(access_token) = read_secret(&self.access)? else {
            return Ok(None);
        };
        let refresh_token = read_secret(&self.refresh)?.unwrap_or_default();

        Ok(Some(Credential { access_token, refresh_token }))
    }

    async fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service, account = %self.account, "Storing credential in keychain");

        self.access
            .set_password(&credential.access_token)
            .map_err(IntoStoreError::into_store_error)?;

        if credential.refresh_token.is_empty() {
            delete_secret(&self.refresh)
        } else {
            self.refresh
                .set_password(&credential.refresh_token)
                .map_err(IntoStoreError::into_store_error)
        }
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service, account = %self.account, "Deleting keychain credential");

        delete_secret(&self.access)?;
        delete_secret(&self.refresh)
    }
}

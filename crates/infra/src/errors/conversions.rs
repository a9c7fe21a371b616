//! Conversions from external infrastructure errors into domain errors.

use authpipe_domain::{ConfigError, CredentialStoreError, TransportError, TransportErrorKind};
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use thiserror::Error;

/// Failure while assembling infrastructure from configuration
#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] CredentialStoreError),
}

/// Extension trait to make the `reqwest` conversion explicit at call sites.
pub(crate) trait IntoTransportError {
    fn into_transport_error(self) -> TransportError;
}

/// Extension trait to make the `keyring` conversion explicit at call sites.
pub(crate) trait IntoStoreError {
    fn into_store_error(self) -> CredentialStoreError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → CredentialStoreError */
/* -------------------------------------------------------------------------- */

impl IntoStoreError for KeyringError {
    fn into_store_error(self) -> CredentialStoreError {
        let description = self.to_string();

        match self {
            Self::NoEntry => CredentialStoreError::Access("keychain entry not found".into()),
            Self::BadEncoding(_) => {
                CredentialStoreError::Serialization("keychain secret is not valid UTF-8".into())
            }
            Self::TooLong(name, limit) => CredentialStoreError::Access(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Self::Invalid(attr, reason) => CredentialStoreError::Access(format!(
                "keychain attribute '{attr}' is invalid: {reason}"
            )),
            Self::Ambiguous(entries) => CredentialStoreError::Access(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            Self::PlatformFailure(err) => {
                CredentialStoreError::Access(format!("keychain platform error: {err}"))
            }
            Self::NoStorageAccess(err) => {
                CredentialStoreError::Access(format!("unable to access secure storage: {err}"))
            }
            _ => CredentialStoreError::Access(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        Self::Store(value.into_store_error())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl IntoTransportError for HttpError {
    fn into_transport_error(self) -> TransportError {
        let message = self.to_string();

        if self.is_timeout() {
            return TransportError::new(TransportErrorKind::Timeout, message);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::new(TransportErrorKind::Connect, message);
        }

        if self.is_builder() {
            return TransportError::new(TransportErrorKind::InvalidUrl, message);
        }

        if self.is_body() || self.is_decode() {
            return TransportError::new(TransportErrorKind::Body, message);
        }

        TransportError::new(TransportErrorKind::Request, message)
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self::Transport(value.into_transport_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

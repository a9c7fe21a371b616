//! Collaborator traits for the pipeline
//!
//! These traits enable dependency injection and testing by abstracting the
//! pipeline's external dependencies (HTTP transport, credential persistence,
//! refresh endpoint, session event sink).

use async_trait::async_trait;
use authpipe_domain::{
    Credential, CredentialStoreError, RefreshError, Response, SessionEvent, TransportError,
    TransportRequest,
};

/// One HTTP exchange
///
/// Implementations perform exactly one request and never retry. The
/// request's `timeout` bounds the whole exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request
    ///
    /// # Errors
    /// Returns a [`TransportError`] when no status line was received
    /// (timeout, connection failure, unreadable body). Any received status,
    /// including 4xx/5xx, is an `Ok` response.
    async fn execute(&self, request: TransportRequest) -> Result<Response, TransportError>;
}

/// Persistence for the session credential pair
///
/// Each operation is a single atomic read or write of the whole pair.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `None` when no session exists
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be read
    async fn get(&self) -> Result<Option<Credential>, CredentialStoreError>;

    /// Replace the stored credential
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be written
    async fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Remove the stored credential; clearing an empty store succeeds
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be written
    async fn clear(&self) -> Result<(), CredentialStoreError>;
}

/// Exchanges a refresh token for a new credential pair
#[async_trait]
pub trait RefreshExecutor: Send + Sync {
    /// Perform one refresh
    ///
    /// A returned credential with an empty `refresh_token` means the endpoint
    /// did not rotate it; the caller keeps the previous one.
    ///
    /// # Errors
    /// Returns a [`RefreshError`] if the endpoint rejects the token or the
    /// exchange fails
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, RefreshError>;
}

/// Receives session lifecycle events
///
/// A refresh cycle reports at most one [`SessionEvent::SessionExpired`],
/// whether the refresh failed or any number of its replays were rejected.
/// A request retried outside a cycle, because an earlier cycle had already
/// replaced its credential, reports its own rejection.
///
/// Called from inside the pipeline, so implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: SessionEvent);
}

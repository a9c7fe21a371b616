//! Authenticated request pipeline
//!
//! Wraps a [`Transport`] and owns the request-side auth lifecycle:
//! - Attaches `Authorization: Bearer <access>` from the credential store
//! - Classifies authorization failures (401/403 by default)
//! - Runs at most one refresh at a time; concurrent failures join it
//! - Replays every deferred request once, in arrival order, after a refresh
//! - Clears the session when refresh fails; reports one expiry per cycle

use std::sync::Arc;
use std::time::Duration;

use authpipe_domain::constants::{
    AUTHORIZATION_HEADER, DEFAULT_AUTH_FAILURE_STATUSES, DEFAULT_REFRESH_TIMEOUT_MS,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
use authpipe_domain::utils::url::join_url;
use authpipe_domain::{
    Attempt, Credential, CredentialStoreError, Headers, PipelineConfig, PipelineError,
    RefreshError, RequestDescriptor, Response, SessionEvent, TransportError, TransportRequest,
    UnauthorizedReason,
};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::metrics::{MetricsSnapshot, PipelineMetrics};
use super::notifier::NoopNotifier;
use super::refresh_state::{
    Admission, Enlistment, PendingRequest, PipelineState, RefreshState, Ticket,
};
use super::traits::{CredentialStore, Notifier, RefreshExecutor, Transport};

/// Request-path settings for a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Base URL for relative request URLs
    pub base_url: Option<String>,
    /// Used when a request sets no timeout of its own
    pub request_timeout: Duration,
    /// Upper bound on one refresh executor call
    pub refresh_timeout: Duration,
    /// Statuses treated as authorization failures
    pub auth_failure_statuses: Vec<u16>,
    /// Applied to every request beneath the caller's headers
    pub default_headers: Headers,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            refresh_timeout: Duration::from_millis(DEFAULT_REFRESH_TIMEOUT_MS),
            auth_failure_statuses: DEFAULT_AUTH_FAILURE_STATUSES.to_vec(),
            default_headers: Headers::new(),
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
            refresh_timeout: config.refresh.timeout,
            auth_failure_statuses: config.auth_failure_statuses.clone(),
            default_headers: config.default_headers.clone(),
        }
    }
}

impl PipelineOptions {
    fn is_auth_failure(&self, status: u16) -> bool {
        self.auth_failure_statuses.contains(&status)
    }
}

/// Builder for [`AuthenticatedPipeline`]
pub struct PipelineBuilder {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn RefreshExecutor>,
    notifier: Arc<dyn Notifier>,
    options: PipelineOptions,
    refresh_state: RefreshState,
}

impl PipelineBuilder {
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.options.refresh_timeout = timeout;
        self
    }

    #[must_use]
    pub fn auth_failure_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.options.auth_failure_statuses = statuses.into();
        self
    }

    /// Use a specific refresh state, e.g. one inspected by a test harness
    #[must_use]
    pub fn refresh_state(mut self, refresh_state: RefreshState) -> Self {
        self.refresh_state = refresh_state;
        self
    }

    #[must_use]
    pub fn build(self) -> AuthenticatedPipeline {
        AuthenticatedPipeline {
            inner: Arc::new(PipelineInner {
                transport: self.transport,
                store: self.store,
                refresher: self.refresher,
                notifier: self.notifier,
                options: self.options,
                refresh_state: self.refresh_state,
                metrics: PipelineMetrics::new(),
            }),
        }
    }
}

/// HTTP pipeline that attaches credentials and refreshes them on demand
///
/// Cheap to clone; clones share one refresh state, one metrics set and the
/// same collaborators.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use authpipe_common::{AuthenticatedPipeline, MemoryCredentialStore, HttpRefreshExecutor, Transport};
/// # use authpipe_domain::RequestDescriptor;
/// # async fn demo(transport: Arc<dyn Transport>) -> Result<(), Box<dyn std::error::Error>> {
/// let refresher = HttpRefreshExecutor::new(transport.clone(), "https://api.example.com/auth/refresh");
/// let pipeline = AuthenticatedPipeline::builder(
///     transport,
///     Arc::new(MemoryCredentialStore::new()),
///     Arc::new(refresher),
/// )
/// .base_url("https://api.example.com")
/// .build();
///
/// let response = pipeline.send(RequestDescriptor::get("/users/me")).await?;
/// println!("{}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedPipeline {
    inner: Arc<PipelineInner>,
}

impl std::fmt::Debug for AuthenticatedPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedPipeline")
            .field("options", &self.inner.options)
            .field("state", &self.inner.refresh_state.state())
            .finish_non_exhaustive()
    }
}

struct PipelineInner {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn RefreshExecutor>,
    notifier: Arc<dyn Notifier>,
    options: PipelineOptions,
    refresh_state: RefreshState,
    metrics: PipelineMetrics,
}

/// Outcome of a first attempt
enum FirstAttempt {
    Complete(Response),
    AuthFailure,
}

impl AuthenticatedPipeline {
    /// Start building a pipeline from its three required collaborators
    pub fn builder(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn RefreshExecutor>,
    ) -> PipelineBuilder {
        PipelineBuilder {
            transport,
            store,
            refresher,
            notifier: Arc::new(NoopNotifier),
            options: PipelineOptions::default(),
            refresh_state: RefreshState::new(),
        }
    }

    /// Send a request with the current credential attached
    ///
    /// Authorization failures are handled internally: the first one starts
    /// (or joins) a refresh and the request is replayed once with the new
    /// credential. Requests made while a refresh is running wait for it and
    /// are then sent with the new credential.
    ///
    /// # Errors
    /// - [`PipelineError::NetworkFailure`] if the transport fails. Never
    ///   retried.
    /// - [`PipelineError::Unauthorized`] if the refresh fails or the replayed
    ///   request is rejected again.
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response, PipelineError> {
        let inner = &self.inner;

        let (request, generation) = match inner.refresh_state.admit(request) {
            Admission::Proceed { request, generation } => (request, generation),
            Admission::Queued(ticket) => {
                inner.metrics.record_queued();
                debug!(id = ticket.id, "Refresh in progress; request queued");
                return inner.wait(ticket).await;
            }
        };

        match inner.first_attempt(&request).await? {
            FirstAttempt::Complete(response) => Ok(response),
            FirstAttempt::AuthFailure => self.defer(request, generation).await,
        }
    }

    /// Persist a credential pair obtained from a login flow
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    pub async fn login(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        self.inner.store.set(&credential).await?;
        info!("Credential stored");
        Ok(())
    }

    /// Clear the session and emit [`SessionEvent::LoggedOut`]
    ///
    /// # Errors
    /// Returns error if the store cannot be cleared; no event is emitted then
    pub async fn logout(&self) -> Result<(), CredentialStoreError> {
        self.inner.store.clear().await?;
        info!("Credential cleared by logout");
        self.inner.notifier.notify(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Whether the store currently holds a credential
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.inner.store.get().await, Ok(Some(_)))
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.inner.refresh_state.state()
    }

    /// Requests waiting on the running refresh cycle
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.refresh_state.waiting()
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.inner.options
    }

    /// Park a request that failed authorization, starting a refresh if none
    /// is running
    async fn defer(
        &self,
        request: RequestDescriptor,
        generation: u64,
    ) -> Result<Response, PipelineError> {
        let inner = &self.inner;

        match inner.refresh_state.enlist(request, generation) {
            Enlistment::Leader { cycle, ticket } => {
                inner.metrics.record_refresh_started();
                info!(cycle, "Authorization failed; starting credential refresh");

                // Detached so a cancelled trigger never strands the waiters
                let cycle_inner = Arc::clone(inner);
                tokio::spawn(async move { cycle_inner.run_refresh_cycle(cycle).await });

                inner.wait(ticket).await
            }
            Enlistment::Joined { cycle, ticket } => {
                inner.metrics.record_queued();
                debug!(cycle, id = ticket.id, "Authorization failed; joined running refresh");
                inner.wait(ticket).await
            }
            Enlistment::Superseded(request) => inner.retry_superseded(&request).await,
        }
    }
}

/// Removes a queued waiter whose `send` future is dropped
struct QueueGuard<'a> {
    inner: &'a PipelineInner,
    id: u64,
    armed: bool,
}

impl Drop for QueueGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.inner.refresh_state.cancel(self.id) {
            self.inner.metrics.record_cancelled();
            debug!(id = self.id, "Queued request cancelled by caller");
        }
    }
}

impl PipelineInner {
    async fn wait(&self, ticket: Ticket) -> Result<Response, PipelineError> {
        let mut guard = QueueGuard { inner: self, id: ticket.id, armed: true };
        let outcome = ticket.receiver.await;
        guard.armed = false;

        outcome.unwrap_or_else(|_| {
            self.metrics.record_unauthorized();
            Err(PipelineError::Unauthorized(UnauthorizedReason::RefreshFailed(
                "refresh cycle ended without resolving the request".into(),
            )))
        })
    }

    async fn first_attempt(
        &self,
        request: &RequestDescriptor,
    ) -> Result<FirstAttempt, PipelineError> {
        let response = self.dispatch(request, Attempt::First, None).await?;

        if self.options.is_auth_failure(response.status) {
            self.metrics.record_auth_failure();
            debug!(url = %request.url, status = response.status, "First attempt unauthorized");
            return Ok(FirstAttempt::AuthFailure);
        }

        Ok(FirstAttempt::Complete(response))
    }

    /// Second and last attempt with `credential`; the caller reports
    /// rejections to the notifier
    async fn retry(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
    ) -> Result<Response, PipelineError> {
        self.metrics.record_retry();
        let response = self.dispatch(request, Attempt::Retry, Some(credential)).await?;

        if self.options.is_auth_failure(response.status) {
            self.metrics.record_auth_failure();
            self.metrics.record_unauthorized();
            warn!(url = %request.url, status = response.status, "Retry rejected after refresh");
            let reason = UnauthorizedReason::RetryRejected { status: response.status };
            return Err(PipelineError::Unauthorized(reason));
        }

        Ok(response)
    }

    /// Retry a request whose credential was replaced by a cycle that has
    /// already finished
    async fn retry_superseded(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Response, PipelineError> {
        let Some(credential) = self.current_credential().await else {
            self.metrics.record_unauthorized();
            debug!(url = %request.url, "Session ended while request was in flight");
            return Err(PipelineError::Unauthorized(UnauthorizedReason::RefreshFailed(
                "session ended while the request was in flight".into(),
            )));
        };

        debug!(url = %request.url, "Credential already refreshed; retrying without a new cycle");
        let outcome = self.retry(request, &credential).await;
        if let Err(PipelineError::Unauthorized(reason)) = &outcome {
            self.notifier.notify(SessionEvent::SessionExpired { reason: reason.clone() });
        }
        outcome
    }

    /// One transport call with the credential attached
    ///
    /// `credential` overrides the store read; replays use the credential
    /// the refresh just produced.
    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        attempt: Attempt,
        credential: Option<&Credential>,
    ) -> Result<Response, PipelineError> {
        let url = join_url(self.options.base_url.as_deref(), &request.url)?;

        let mut headers = self.options.default_headers.clone();
        headers.merge(&request.headers);
        headers.remove(AUTHORIZATION_HEADER);

        let bearer = match credential {
            Some(credential) => Some(credential.bearer()),
            None => self.current_credential().await.as_ref().map(Credential::bearer),
        };
        if let Some(bearer) = bearer {
            headers.insert(AUTHORIZATION_HEADER, bearer);
        }

        let timeout = request.timeout.unwrap_or(self.options.request_timeout);
        let transport_request = TransportRequest {
            method: request.method,
            url,
            headers,
            body: request.body.clone(),
            timeout,
        };

        self.metrics.record_dispatch();
        debug!(
            method = %request.method,
            url = %transport_request.url,
            ?attempt,
            "Dispatching request"
        );

        let response = tokio::time::timeout(timeout, self.transport.execute(transport_request))
            .await
            .map_err(|_| TransportError::timeout(timeout))?
            .map_err(|e| {
                debug!(url = %request.url, error = %e, "Transport failure");
                PipelineError::NetworkFailure(e)
            })?;

        debug!(url = %request.url, status = response.status, ?attempt, "Response received");
        Ok(response)
    }

    /// Credential for a new request; a failed read counts as no session
    async fn current_credential(&self) -> Option<Credential> {
        match self.store.get().await {
            Ok(credential) => credential.filter(|c| !c.access_token.is_empty()),
            Err(error) => {
                warn!(error = %error, "Credential store read failed; sending unauthenticated");
                None
            }
        }
    }

    async fn run_refresh_cycle(self: Arc<Self>, cycle: u64) {
        match self.refresh_credential().await {
            Ok(credential) => {
                let waiters = self.refresh_state.complete(cycle);
                info!(cycle, replays = waiters.len(), "Credential refresh succeeded");

                let rejections =
                    join_all(waiters.into_iter().map(|waiter| self.replay(waiter, &credential)))
                        .await;

                if let Some(reason) = rejections.into_iter().flatten().next() {
                    self.notifier.notify(SessionEvent::SessionExpired { reason });
                }
            }
            Err(error) => {
                self.metrics.record_refresh_failure();
                warn!(cycle, error = %error, "Credential refresh failed; clearing session");

                if let Err(clear_error) = self.store.clear().await {
                    warn!(error = %clear_error, "Failed to clear credential store");
                }

                let waiters = self.refresh_state.complete(cycle);
                let reason = UnauthorizedReason::RefreshFailed(error.to_string());
                self.notifier.notify(SessionEvent::SessionExpired { reason: reason.clone() });

                for waiter in waiters {
                    self.metrics.record_unauthorized();
                    let outcome = Err(PipelineError::Unauthorized(reason.clone()));
                    let _ = waiter.completion.send(outcome);
                }
            }
        }
    }

    async fn refresh_credential(&self) -> Result<Credential, RefreshError> {
        let current = self
            .store
            .get()
            .await?
            .filter(Credential::can_refresh)
            .ok_or(RefreshError::MissingRefreshToken)?;

        let timeout = self.options.refresh_timeout;
        let refreshed =
            tokio::time::timeout(timeout, self.refresher.refresh(&current.refresh_token))
                .await
                .map_err(|_| RefreshError::Timeout(timeout))??
                .rotated_from(&current.refresh_token);

        if let Err(error) = self.store.set(&refreshed).await {
            warn!(error = %error, "Failed to persist refreshed credential; replaying anyway");
        }

        Ok(refreshed)
    }

    /// Replay one waiter, giving up if its caller goes away first
    ///
    /// Returns the rejection reason when the replay was refused again.
    async fn replay(
        &self,
        waiter: PendingRequest,
        credential: &Credential,
    ) -> Option<UnauthorizedReason> {
        let PendingRequest { id, request, mut completion } = waiter;

        if completion.is_closed() {
            self.metrics.record_cancelled();
            debug!(id, "Caller gone; skipping replay");
            return None;
        }

        let outcome = tokio::select! {
            biased;
            outcome = self.retry(&request, credential) => Some(outcome),
            () = completion.closed() => None,
        };

        match outcome {
            Some(outcome) => {
                let rejection = match &outcome {
                    Err(PipelineError::Unauthorized(reason)) => Some(reason.clone()),
                    _ => None,
                };
                let _ = completion.send(outcome);
                rejection
            }
            None => {
                self.metrics.record_cancelled();
                debug!(id, "Caller gone; replay abandoned");
                None
            }
        }
    }
}

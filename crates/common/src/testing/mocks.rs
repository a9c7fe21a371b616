//! Mock implementations of the pipeline collaborators
//!
//! Every mock records what it was asked to do. `MockTransport` and
//! `MockRefreshExecutor` can be gated: a gated mock records the call, then
//! holds it until the test releases a permit, which lets tests line up
//! concurrent requests deterministically.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use authpipe_domain::constants::AUTHORIZATION_HEADER;
use authpipe_domain::{
    Credential, CredentialStoreError, Headers, Method, RefreshError, Response, SessionEvent,
    TransportError, TransportRequest,
};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::auth::{CredentialStore, MemoryCredentialStore, Notifier, RefreshExecutor, Transport};

/// Permits added when a gate is opened for good
const OPEN_GATE_PERMITS: usize = 1 << 20;

type Responder = Arc<dyn Fn(&TransportRequest) -> Result<Response, TransportError> + Send + Sync>;

/// Hold a gated call until a permit is released
async fn pass(gate: Option<&Arc<Semaphore>>) {
    if let Some(gate) = gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

/// A request captured by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION_HEADER)
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        self.body.as_deref().map(String::from_utf8_lossy).unwrap_or_default().into_owned()
    }
}

/// Mock transport answering from a responder closure
///
/// # Examples
///
/// ```
/// use authpipe_common::testing::MockTransport;
///
/// // 200 for requests carrying "Bearer fresh", 401 for everything else
/// let transport = MockTransport::accepting("fresh");
/// assert_eq!(transport.call_count(), 0);
/// ```
#[derive(Clone)]
pub struct MockTransport {
    responder: Responder,
    calls: Arc<Mutex<Vec<RecordedRequest>>>,
    gate: Option<Arc<Semaphore>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.calls.lock().len())
            .field("gated", &self.gate.is_some())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Self { responder: Arc::new(responder), calls: Arc::new(Mutex::new(Vec::new())), gate: None }
    }

    /// Answer every request with `status` and the request URL as body
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self::new(move |request| Ok(Response::new(status, request.url.clone())))
    }

    /// 200 with the request URL as body when the request carries
    /// `Bearer <token>`, 401 otherwise
    #[must_use]
    pub fn accepting(token: impl Into<String>) -> Self {
        let expected = format!("Bearer {}", token.into());
        Self::new(move |request| {
            let status = if request.header(AUTHORIZATION_HEADER) == Some(expected.as_str()) {
                200
            } else {
                401
            };
            Ok(Response::new(status, request.url.clone()))
        })
    }

    /// Hold every call until [`release`](Self::release) or
    /// [`open`](Self::open)
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held calls respond, oldest first
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Stop holding calls
    pub fn open(&self) {
        self.release(OPEN_GATE_PERMITS);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// `Authorization` header of every call, in call order
    #[must_use]
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.calls.lock().iter().map(|call| call.authorization().map(str::to_string)).collect()
    }

    /// URLs of calls made with `Bearer <token>`, in call order
    #[must_use]
    pub fn urls_sent_with(&self, token: &str) -> Vec<String> {
        let expected = format!("Bearer {token}");
        self.calls
            .lock()
            .iter()
            .filter(|call| call.authorization() == Some(expected.as_str()))
            .map(|call| call.url.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<Response, TransportError> {
        self.calls.lock().push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        pass(self.gate.as_ref()).await;
        (self.responder)(&request)
    }
}

/// Mock refresh executor with scripted results
#[derive(Debug)]
pub struct MockRefreshExecutor {
    scripted: Mutex<VecDeque<Result<Credential, RefreshError>>>,
    fallback: Mutex<Result<Credential, RefreshError>>,
    tokens: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl Default for MockRefreshExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRefreshExecutor {
    /// Succeeds with `("refreshed-access", "refreshed-refresh")`
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(Credential::new("refreshed-access", "refreshed-refresh"))),
            tokens: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Result returned once scripted results run out
    #[must_use]
    pub fn with_result(self, result: Result<Credential, RefreshError>) -> Self {
        *self.fallback.lock() = result;
        self
    }

    /// Queue a result for the next call
    pub fn push_result(&self, result: Result<Credential, RefreshError>) {
        self.scripted.lock().push_back(result);
    }

    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens received, in call order
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }
}

#[async_trait]
impl RefreshExecutor for MockRefreshExecutor {
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().push(refresh_token.to_string());

        pass(self.gate.as_ref()).await;

        let scripted = self.scripted.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.lock().clone())
    }
}

/// Notifier that keeps every event
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn expired_count(&self) -> usize {
        self.events.lock().iter().filter(|event| event.is_session_expired()).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}

/// In-memory credential store that counts operations and can fail on demand
#[derive(Debug, Default)]
pub struct CountingCredentialStore {
    inner: MemoryCredentialStore,
    gets: AtomicUsize,
    sets: AtomicUsize,
    clears: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self { inner: MemoryCredentialStore::with_credential(credential), ..Self::default() }
    }

    /// Make `get` fail until reset
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `set` fail until reset
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// Stored credential, bypassing counters and failure flags
    pub async fn snapshot(&self) -> Option<Credential> {
        self.inner.get().await.ok().flatten()
    }
}

#[async_trait]
impl CredentialStore for CountingCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialStoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::Access("simulated read failure".into()));
        }
        self.inner.get().await
    }

    async fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::Access("simulated write failure".into()));
        }
        self.inner.set(credential).await
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear().await
    }
}

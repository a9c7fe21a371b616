//! Testing utilities and helpers
//!
//! This module provides:
//! - **[`mocks`]**: Mock transport, refresh executor, notifier and credential
//!   store, with call recording and optional gates
//! - **[`async_utils`]**: Waiting on conditions driven by spawned tasks
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use authpipe_common::testing::{MockRefreshExecutor, MockTransport, RecordingNotifier};
//! use authpipe_common::{AuthenticatedPipeline, MemoryCredentialStore};
//!
//! let transport = Arc::new(MockTransport::accepting("refreshed-access"));
//! let notifier = Arc::new(RecordingNotifier::new());
//! let pipeline = AuthenticatedPipeline::builder(
//!     transport,
//!     Arc::new(MemoryCredentialStore::new()),
//!     Arc::new(MockRefreshExecutor::new()),
//! )
//! .notifier(notifier)
//! .build();
//! # let _ = pipeline;
//! ```

pub mod async_utils;
pub mod mocks;

// Re-export commonly used items
pub use async_utils::{poll_until, timeout_ok, wait_until};
pub use mocks::{
    CountingCredentialStore, MockRefreshExecutor, MockTransport, RecordedRequest,
    RecordingNotifier,
};

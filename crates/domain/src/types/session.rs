//! Session lifecycle events delivered to notifiers

use serde::{Deserialize, Serialize};

use crate::errors::UnauthorizedReason;

/// Events the pipeline reports to the surrounding application
///
/// `SessionExpired` means the user must re-authenticate; the application is
/// expected to route to its login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A request ended in a terminal authorization failure
    SessionExpired { reason: UnauthorizedReason },
    /// The credential was cleared on request
    LoggedOut,
}

impl SessionEvent {
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}

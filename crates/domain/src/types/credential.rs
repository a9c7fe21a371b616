//! Session credential pair

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access and refresh token pair identifying an authenticated session
///
/// The pair is owned by a credential store. The pipeline reads a fresh
/// snapshot before every request and never keeps its own copy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token attached to outbound requests
    pub access_token: String,

    /// Long-lived token exchanged for a new access token
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    /// Whether a refresh token is available for a refresh cycle
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Carry the previous refresh token forward when a refresh response did
    /// not rotate it
    #[must_use]
    pub fn rotated_from(mut self, previous_refresh_token: &str) -> Self {
        if self.refresh_token.is_empty() {
            self.refresh_token = previous_refresh_token.to_string();
        }
        self
    }

    /// `Authorization` header value for this credential
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("{}{}", crate::constants::BEARER_PREFIX, self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

fn redact(token: &str) -> &'static str {
    if token.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

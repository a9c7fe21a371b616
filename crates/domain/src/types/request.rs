//! Request descriptors
//!
//! [`RequestDescriptor`] is what callers hand to the pipeline. After URL
//! resolution and credential attachment it becomes a [`TransportRequest`],
//! which is what a transport executes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::headers::Headers;
use crate::constants::{CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE};
use crate::impl_str_conversions;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl_str_conversions!(Method {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
    Head => "HEAD",
    Options => "OPTIONS",
});

/// Which dispatch of a request this is
///
/// Threaded through each call by value. A request is dispatched at most
/// twice: once as `First`, and once as `Retry` after a credential refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt {
    First,
    Retry,
}

impl Attempt {
    #[must_use]
    pub const fn is_retry(self) -> bool {
        matches!(self, Self::Retry)
    }
}

/// A caller's HTTP request before the pipeline attaches credentials
///
/// `url` may be absolute or relative to the pipeline's base URL. Any
/// `Authorization` header set here is discarded when the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
    /// Overrides the pipeline's default request timeout
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Headers::new(), body: None, timeout: None }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type`
    ///
    /// # Errors
    /// Returns the serializer error if `value` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers.insert(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE);
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully resolved request ready for a single HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    /// Absolute URL
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl TransportRequest {
    /// Header value lookup shortcut used by transports and test doubles
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_string_forms() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!("delete".parse::<Method>(), Ok(Method::Delete));
        assert_eq!("  Options ".parse::<Method>(), Ok(Method::Options));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        #[derive(Serialize)]
        struct Login<'a> {
            email: &'a str,
        }

        let request =
            RequestDescriptor::post("/auth/login").json(&Login { email: "a@b.co" }).unwrap();

        assert_eq!(request.headers.get("Content-Type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(request.body.as_deref(), Some(br#"{"email":"a@b.co"}"#.as_slice()));
    }

    #[test]
    fn test_builder_sets_timeout_and_headers() {
        let request = RequestDescriptor::get("/profile")
            .header("X-Request-Id", "42")
            .timeout(Duration::from_secs(3));

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.headers.get("x-request-id"), Some("42"));
        assert_eq!(request.timeout, Some(Duration::from_secs(3)));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_attempt_is_retry() {
        assert!(!Attempt::First.is_retry());
        assert!(Attempt::Retry.is_retry());
    }
}

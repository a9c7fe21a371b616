//! Transport responses

use serde::de::DeserializeOwned;

use super::headers::Headers;

/// Status, headers and body of a completed HTTP exchange
///
/// Returned to callers exactly as the transport produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Headers::new(), body: body.into() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON
    ///
    /// # Errors
    /// Returns the deserializer error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn test_success_range() {
        assert!(Response::new(200, "").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(302, "").is_success());
        assert!(!Response::new(401, "").is_success());
    }

    #[test]
    fn test_json_body() {
        #[derive(Deserialize)]
        struct Profile {
            name: String,
        }

        let response = Response::new(200, r#"{"name":"Ada"}"#);
        let profile: Profile = response.json().unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(response.text(), r#"{"name":"Ada"}"#);
    }
}

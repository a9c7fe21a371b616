//! URL resolution for request descriptors

use url::Url;

use crate::errors::TransportError;

/// Whether `candidate` is an absolute http(s) URL
#[must_use]
pub fn is_absolute(candidate: &str) -> bool {
    Url::parse(candidate).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Resolve a request URL against an optional base URL
///
/// Absolute URLs pass through unchanged. Relative URLs are appended to the
/// base path, so `https://api.example.com/v1` + `/users` resolves to
/// `https://api.example.com/v1/users`.
///
/// # Errors
/// Returns an `InvalidUrl` transport error when `target` is relative and no
/// base is configured, or when the joined URL cannot be parsed.
pub fn join_url(base: Option<&str>, target: &str) -> Result<String, TransportError> {
    if is_absolute(target) {
        return Ok(target.to_string());
    }

    let Some(base) = base else {
        return Err(TransportError::invalid_url(format!(
            "relative URL '{target}' with no base URL configured"
        )));
    };

    let joined = format!("{}/{}", base.trim_end_matches('/'), target.trim_start_matches('/'));
    Url::parse(&joined)
        .map(String::from)
        .map_err(|e| TransportError::invalid_url(format!("cannot parse '{joined}': {e}")))
}

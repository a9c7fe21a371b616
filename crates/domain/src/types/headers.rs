//! Case-insensitive HTTP header collection

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Ordered header map keyed by lowercase header name
///
/// Names are normalised on insertion so lookups, removal and merging are
/// case-insensitive. Values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header, returning the previous value
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0.insert(normalize(name.as_ref()), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&normalize(name)).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&normalize(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalize(name))
    }

    /// Overlay `other` on top of `self`; headers in `other` win
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, String>::deserialize(deserializer).map(Self::from_iter)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");

        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn test_insert_replaces_differently_cased_name() {
        let mut headers = Headers::new();
        headers.insert("Authorization", "Bearer a");
        let previous = headers.insert("AUTHORIZATION", "Bearer b");

        assert_eq!(previous.as_deref(), Some("Bearer a"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("authorization"), Some("Bearer b"));
    }

    #[test]
    fn test_merge_overrides_existing_values() {
        let mut base: Headers = [("Accept", "application/json"), ("X-App", "mobile")]
            .into_iter()
            .collect();
        let overlay: Headers = [("accept", "text/plain")].into_iter().collect();

        base.merge(&overlay);

        assert_eq!(base.get("accept"), Some("text/plain"));
        assert_eq!(base.get("x-app"), Some("mobile"));
    }

    #[test]
    fn test_remove() {
        let mut headers: Headers = [("Authorization", "Bearer x")].into_iter().collect();
        assert_eq!(headers.remove("authorization").as_deref(), Some("Bearer x"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_deserialized_names_are_normalized() {
        let headers: Headers = serde_json::from_str(r#"{"X-Client":"cli"}"#).unwrap();
        assert_eq!(headers.get("x-client"), Some("cli"));
        assert_eq!(serde_json::to_string(&headers).unwrap(), r#"{"x-client":"cli"}"#);
    }
}

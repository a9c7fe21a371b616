//! HTTP refresh executor
//!
//! Exchanges a refresh token for a new credential pair with a single `POST`
//! through a [`Transport`]. The request goes straight to the transport and
//! never through the pipeline, so it carries no `Authorization` header and
//! cannot itself trigger a refresh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authpipe_domain::constants::{
    ACCEPT_HEADER, CONTENT_TYPE_HEADER, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
use authpipe_domain::utils::url::join_url;
use authpipe_domain::{
    ConfigError, ConfigResult, Credential, Headers, Method, PipelineConfig, RefreshError,
    RefreshFormat, TransportRequest,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{RefreshExecutor, Transport};

/// Maximum number of response body bytes kept in a `Rejected` error
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct JsonRefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

/// Refresh response body; accepts camelCase and snake_case field names
#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken", alias = "access_token")]
    access_token: String,
    #[serde(rename = "refreshToken", alias = "refresh_token", default)]
    refresh_token: Option<String>,
}

/// [`RefreshExecutor`] backed by an HTTP endpoint
pub struct HttpRefreshExecutor {
    transport: Arc<dyn Transport>,
    url: String,
    format: RefreshFormat,
    client_id: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for HttpRefreshExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRefreshExecutor")
            .field("url", &self.url)
            .field("format", &self.format)
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpRefreshExecutor {
    /// Executor posting JSON to the absolute `url`
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            format: RefreshFormat::Json,
            client_id: None,
            timeout: Duration::from_millis(
                authpipe_domain::constants::DEFAULT_REFRESH_TIMEOUT_MS,
            ),
        }
    }

    /// Build from pipeline configuration, resolving a relative refresh URL
    /// against `base_url`
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the refresh URL cannot be resolved
    pub fn from_config(
        transport: Arc<dyn Transport>,
        config: &PipelineConfig,
    ) -> ConfigResult<Self> {
        let url = join_url(config.base_url.as_deref(), &config.refresh.url)
            .map_err(|e| ConfigError::Invalid(format!("refresh.url: {}", e.message)))?;

        let mut executor = Self::new(transport, url)
            .with_format(config.refresh.format)
            .with_timeout(config.refresh.timeout);
        executor.client_id.clone_from(&config.refresh.client_id);
        Ok(executor)
    }

    #[must_use]
    pub fn with_format(mut self, format: RefreshFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn encode(&self, refresh_token: &str) -> Result<(Vec<u8>, &'static str), RefreshError> {
        match self.format {
            RefreshFormat::Json => {
                let body = serde_json::to_vec(&JsonRefreshRequest { refresh_token })
                    .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
                Ok((body, JSON_CONTENT_TYPE))
            }
            RefreshFormat::OAuthForm => {
                let mut form = url::form_urlencoded::Serializer::new(String::new());
                form.append_pair("grant_type", "refresh_token");
                form.append_pair("refresh_token", refresh_token);
                if let Some(client_id) = &self.client_id {
                    form.append_pair("client_id", client_id);
                }
                Ok((form.finish().into_bytes(), FORM_CONTENT_TYPE))
            }
        }
    }
}

#[async_trait]
impl RefreshExecutor for HttpRefreshExecutor {
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, RefreshError> {
        if refresh_token.is_empty() {
            return Err(RefreshError::MissingRefreshToken);
        }

        let (body, content_type) = self.encode(refresh_token)?;
        let mut headers = Headers::new();
        headers.insert(CONTENT_TYPE_HEADER, content_type);
        headers.insert(ACCEPT_HEADER, JSON_CONTENT_TYPE);

        let request = TransportRequest {
            method: Method::Post,
            url: self.url.clone(),
            headers,
            body: Some(body),
            timeout: self.timeout,
        };

        debug!(url = %self.url, format = %self.format, "Sending refresh request");
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            let mut body = response.text();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(RefreshError::Rejected { status: response.status, body });
        }

        let parsed: RefreshResponse =
            response.json().map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(RefreshError::InvalidResponse("empty access token".into()));
        }

        Ok(Credential::new(parsed.access_token, parsed.refresh_token.unwrap_or_default()))
    }
}

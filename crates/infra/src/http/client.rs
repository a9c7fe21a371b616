use std::time::Duration;

use async_trait::async_trait;
use authpipe_common::Transport;
use authpipe_domain::{
    Headers, Method, Response, TransportError, TransportErrorKind, TransportRequest,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;
use tracing::debug;

use crate::errors::IntoTransportError;

/// [`Transport`] performing one HTTP exchange per call with `reqwest`.
///
/// No retries happen here; every status, including 5xx, is handed back to
/// the pipeline unchanged.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<Response, TransportError> {
        let headers = to_header_map(&request.headers)?;
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .headers(headers)
            .timeout(request.timeout);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let method = request.method;
        let url = request.url;
        debug!(%method, %url, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            err.into_transport_error()
        })?;

        let status = response.status().as_u16();
        let headers = from_header_map(response.headers());
        let body = response.bytes().await.map_err(|err| {
            let mut converted = err.into_transport_error();
            if converted.kind == TransportErrorKind::Request {
                converted.kind = TransportErrorKind::Body;
            }
            converted
        })?;

        debug!(%method, %url, status, "received HTTP response");
        Ok(Response { status, headers, body: body.to_vec() })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn to_header_map(headers: &Headers) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            TransportError::new(
                TransportErrorKind::Request,
                format!("header name '{name}': {err}"),
            )
        })?;
        // Values are not echoed into the error; they may hold credentials.
        let value = HeaderValue::from_str(value).map_err(|_| {
            TransportError::new(
                TransportErrorKind::Request,
                format!("invalid value for header '{name}'"),
            )
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Non-UTF-8 header values are skipped.
fn from_header_map(map: &HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    user_agent: Option<String>,
    use_system_proxy: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: Some(format!("authpipe/{}", env!("CARGO_PKG_VERSION"))),
            use_system_proxy: false,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Upper bound on establishing a connection. The overall deadline comes
    /// from each request.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub fn use_system_proxy(mut self, enabled: bool) -> Self {
        self.use_system_proxy = enabled;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let mut builder = ReqwestClient::builder().connect_timeout(self.connect_timeout);

        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(IntoTransportError::into_transport_error)?;

        Ok(ReqwestTransport { client })
    }
}

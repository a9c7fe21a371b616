//! End-to-end tests over real HTTP
//!
//! A `wiremock` server plays both the API and the refresh endpoint; the
//! pipeline is assembled with `build_pipeline` exactly as an application
//! would.

use std::time::Duration;

use authpipe_common::AuthenticatedPipeline;
use authpipe_domain::{
    Credential, PipelineConfig, PipelineError, RefreshFormat, RequestDescriptor, StorageBackend,
    TransportErrorKind, UnauthorizedReason,
};
use authpipe_infra::build_pipeline;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn pipeline_for(server: &MockServer, config: PipelineConfig) -> AuthenticatedPipeline {
    let config = config.with_base_url(server.uri());
    let pipeline = build_pipeline(&config).expect("pipeline should build");
    pipeline.login(Credential::new("a1", "r1")).await.expect("login");
    pipeline
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"Ada"}"#))
        .mount(server)
        .await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2", "refreshToken": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server, PipelineConfig::new("/auth/refresh")).await;

    let response = pipeline.send(RequestDescriptor::get("/profile")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.text(), r#"{"name":"Ada"}"#);
    let metrics = pipeline.metrics();
    assert_eq!(metrics.refresh_started, 1);
    assert_eq!(metrics.retries, 1);
}

#[tokio::test]
async fn concurrent_failures_share_one_refresh() {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "a2", "refreshToken": "r2" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server, PipelineConfig::new("/auth/refresh")).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.send(RequestDescriptor::get("/profile")).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status, 200);
    }
}

#[tokio::test]
async fn oauth_form_refresh_is_sent_as_form() {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("grant_type=refresh_token&refresh_token=r1&client_id=cli"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "a2", "token_type": "Bearer" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = PipelineConfig::new("/oauth/token");
    config.refresh.format = RefreshFormat::OAuthForm;
    config.refresh.client_id = Some("cli".into());
    let pipeline = pipeline_for(&server, config).await;

    let response = pipeline.send(RequestDescriptor::get("/profile")).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server, PipelineConfig::new("/auth/refresh")).await;

    let err = pipeline.send(RequestDescriptor::get("/profile")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Unauthorized(UnauthorizedReason::RefreshFailed(_))));
    assert!(!pipeline.is_authenticated().await);

    pipeline.send(RequestDescriptor::get("/public")).await.unwrap();
    let requests = server.received_requests().await.unwrap();
    let public = requests.iter().find(|r| r.url.path() == "/public").unwrap();
    assert!(!public.headers.contains_key("authorization"));
}

#[tokio::test]
async fn retry_rejection_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2", "refreshToken": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_for(&server, PipelineConfig::new("/auth/refresh")).await;

    let err = pipeline.send(RequestDescriptor::get("/admin")).await.unwrap_err();
    assert_eq!(err, PipelineError::Unauthorized(UnauthorizedReason::RetryRejected { status: 403 }));
    assert!(pipeline.is_authenticated().await, "refreshed session is kept");
}

#[tokio::test]
async fn rotated_credential_is_persisted_to_file() {
    let server = MockServer::start().await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("credential.json");
    let mut config = PipelineConfig::new("/auth/refresh");
    config.storage.backend = StorageBackend::File;
    config.storage.path = Some(file.clone());
    let pipeline = pipeline_for(&server, config).await;

    pipeline.send(RequestDescriptor::get("/profile")).await.unwrap();

    let stored: Credential =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(stored, Credential::new("a2", "r1"), "refresh token carried forward");
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = PipelineConfig::new("/auth/refresh").with_base_url(format!("http://{addr}"));
    let pipeline = build_pipeline(&config).unwrap();

    let err = pipeline.send(RequestDescriptor::get("/profile")).await.unwrap_err();
    assert!(
        matches!(err, PipelineError::NetworkFailure(ref e) if e.kind == TransportErrorKind::Connect)
    );
}

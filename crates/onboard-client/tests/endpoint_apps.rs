//! HTTP-level tests for the endpoint application API.

use onboard_client::{OnboardingClient, OnboardingError};
use onboard_core::{CertificateInfo, EndpointApp, EndpointAppType, OnboardingService};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> OnboardingClient {
    OnboardingClient::builder(format!("{}/scim/v2", server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn list_reads_scim_resources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scim/v2/EndpointApps"))
        .and(header("accept", "application/scim+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
            "totalResults": 2,
            "Resources": [
                {"id": "a1", "applicationType": "deviceControl", "applicationName": "ctrl-1", "clientToken": "secret"},
                {"id": "a2", "applicationType": "telemetry", "applicationName": "tel-1"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let apps = client_for(&server)
        .await
        .list_endpoint_apps()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(apps.len(), 2);
    assert!(apps[0].matches("ctrl-1", EndpointAppType::DeviceControl));
    assert_eq!(apps[1].application_type, EndpointAppType::Telemetry);
}

#[tokio::test]
async fn list_with_empty_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scim/v2/EndpointApps"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let apps = client_for(&server).await.endpoint_apps().list().await.unwrap();
    assert!(apps.is_none());
}

#[tokio::test]
async fn create_posts_draft_without_nulls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scim/v2/EndpointApps"))
        .and(header("content-type", "application/scim+json"))
        .and(body_json(json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:EndpointApp"],
            "applicationName": "ctrl-1",
            "applicationType": "deviceControl",
            "certificateInfo": {"rootCN": "Example Root", "subjectName": "ctrl-1"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "a1",
            "applicationType": "deviceControl",
            "applicationName": "ctrl-1",
            "certificateInfo": {"rootCN": "Example Root", "subjectName": "ctrl-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = EndpointApp::draft("ctrl-1", EndpointAppType::DeviceControl)
        .with_certificate_info(CertificateInfo::new("Example Root", "ctrl-1"));
    let created = client_for(&server)
        .await
        .create_endpoint_app(&draft)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("a1"));
    assert!(created.uses_certificate());
}

#[tokio::test]
async fn conflict_maps_to_conflict_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scim/v2/EndpointApps"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
            "status": "409",
            "detail": "applicationName not unique"
        })))
        .mount(&server)
        .await;

    let draft = EndpointApp::draft("ctrl-1", EndpointAppType::DeviceControl);
    let err = client_for(&server)
        .await
        .create_endpoint_app(&draft)
        .await
        .unwrap_err();

    match err {
        OnboardingError::Conflict { message } => assert_eq!(message, "applicationName not unique"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_keep_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scim/v2/EndpointApps"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .list_endpoint_apps()
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(503));
    assert!(err.to_string().contains("maintenance"));
}

#[tokio::test]
async fn unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .list_endpoint_apps()
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn configured_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer onboarding-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Resources": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = OnboardingClient::builder(server.uri())
        .header("authorization", "Bearer onboarding-admin")
        .build()
        .unwrap();

    let apps = client.endpoint_apps().list().await.unwrap().unwrap();
    assert!(apps.is_empty());
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OnboardingClient::builder(format!("http://{addr}"))
        .build()
        .unwrap();
    let err = client.list_endpoint_apps().await.unwrap_err();
    assert!(matches!(err, OnboardingError::Connection(_)), "got {err:?}");
    assert!(err.is_retryable());
}

//! Wire behaviour of the HTTP agent against a mock Consul agent

use serde_json::json;
use service_registration::{
    AgentError, CheckStatus, ClientConfig, Error, FixedHostname, RegistrationClient,
};
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn client_for(config: &ClientConfig) -> RegistrationClient {
    RegistrationClient::from_config(config)
        .expect("Failed to create client")
        .with_hostname_provider(Arc::new(FixedHostname::new("worker-7.prod.internal")))
}

fn client(server: &MockServer) -> RegistrationClient {
    client_for(&ClientConfig::new(server.uri(), "10s", "1s"))
}

fn checks_body(status: &str) -> serde_json::Value {
    json!({
        "billing": {
            "Node": "node-1",
            "CheckID": "billing",
            "Name": "billing",
            "Status": status,
            "Notes": "",
            "Output": "dial tcp worker-7:8080: connection refused",
            "ServiceID": "billing:worker-7",
            "ServiceName": "billing",
            "ServiceTags": [],
            "Type": "tcp"
        }
    })
}

#[tokio::test]
async fn test_register_sends_agent_payloads() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .and(body_json(json!({
            "ID": "billing:worker-7",
            "Name": "billing",
            "Address": "worker-7.prod.internal",
            "Port": 8080,
            "Check": {
                "Interval": "10s",
                "Timeout": "1s",
                "TCP": "worker-7:8080"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/v1/agent/check/register"))
        .and(body_json(json!({
            "Name": "billing",
            "ServiceID": "billing:worker-7",
            "TCP": "worker-7:8080",
            "Interval": "10s",
            "Timeout": "1s",
            "Status": "passing"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/agent/checks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(checks_body("passing")))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .register("billing", 8080)
        .await
        .expect("Failed to register service");
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_check() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .respond_with(ResponseTemplate::new(500).set_body_string("rpc error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/check/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/checks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(checks_body("passing")))
        .mount(&server)
        .await;

    client(&server)
        .register("billing", 8080)
        .await
        .expect("Publish errors are not returned");
}

#[tokio::test]
async fn test_check_warning_is_not_passing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/checks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(checks_body("warning")))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).register("billing", 8080).await.unwrap_err();
    match err {
        Error::CheckNotPassing { status, output, .. } => {
            assert_eq!(status, CheckStatus::Warning);
            assert!(output.contains("connection refused"));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_check_register_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/check/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid check: TCP must be set"))
        .mount(&server)
        .await;

    let err = client(&server).register("billing", 8080).await.unwrap_err();
    match err {
        Error::Registration(AgentError::UnexpectedStatus { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body, "Invalid check: TCP must be set");
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_checks_lookup_failures() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/checks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).register("billing", 8080).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Lookup(AgentError::UnexpectedStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_undecodable_checks_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/checks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).register("billing", 8080).await.unwrap_err();
    assert!(matches!(err, Error::Lookup(AgentError::Decode(_))));
}

#[tokio::test]
async fn test_missing_check_in_listing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/agent/checks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).register("billing", 8080).await.unwrap_err();
    assert!(matches!(err, Error::MissingCheck(name) if name == "billing"));
}

#[tokio::test]
async fn test_deregister_uses_instance_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/billing:worker-7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .deregister("billing")
        .await
        .expect("Failed to deregister");
}

#[tokio::test]
async fn test_deregister_escapes_reserved_characters() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/billing%3Fv=2:worker-7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/billing%23blue:worker-7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/billing"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .deregister("billing?v=2")
        .await
        .expect("Failed to deregister name with '?'");
    client
        .deregister("billing#blue")
        .await
        .expect("Failed to deregister name with '#'");
}

#[tokio::test]
async fn test_deregister_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/billing:worker-7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Unknown service ID"))
        .mount(&server)
        .await;

    let err = client(&server).deregister("billing").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Deregistration {
            source: AgentError::UnexpectedStatus { status: 404, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_token_and_datacenter_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/billing:worker-7"))
        .and(header("X-Consul-Token", "secret"))
        .and(query_param("dc", "dc2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri(), "10s", "1s")
        .with_token("secret")
        .with_datacenter("dc2");
    client_for(&config)
        .deregister("billing")
        .await
        .expect("Failed to deregister");
}

#[tokio::test]
async fn test_unreachable_agent_is_a_transport_error() {
    // Nothing listens on port 1
    let client = client_for(&ClientConfig::new("127.0.0.1:1", "10s", "1s"));
    let err = client.deregister("billing").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Deregistration {
            source: AgentError::Http(_),
            ..
        }
    ));
}

/// The HTTP agent reports a missing Tokio runtime instead of panicking
#[smol_potat::test]
async fn test_http_agent_outside_tokio_runtime() {
    let client = client_for(&ClientConfig::new("127.0.0.1:1", "10s", "1s"));
    let err = client.deregister("billing").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Deregistration {
            source: AgentError::NoRuntime,
            ..
        }
    ));
}

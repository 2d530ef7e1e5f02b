use std::time::Duration;

use forwarder_core::SinkConfig;
use forwarder_engine::{DeliveryError, DifyProducer, DocumentSink};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sink_config(endpoint: &str) -> SinkConfig {
    SinkConfig {
        endpoint: endpoint.to_string(),
        api_key: "test-key".to_string(),
        dataset_id: "ds-42".to_string(),
        timeout_secs: 1,
        indexing_technique: "high_quality".to_string(),
    }
}

#[tokio::test]
async fn produce_posts_document_with_auth_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/datasets/ds-42/document/create-by-text"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "name": "Title",
            "text": "# Title\n\nbody\n",
            "indexing_technique": "high_quality",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let producer = DifyProducer::new(sink_config(&server.uri()));
    producer
        .produce("Title", "# Title\n\nbody\n")
        .await
        .expect("delivery ok");
}

#[tokio::test]
async fn rejected_credentials_map_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let producer = DifyProducer::new(sink_config(&server.uri()));
    let err = producer.produce("t", "b").await.unwrap_err();
    match err {
        DeliveryError::Auth { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid api key"));
        }
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let producer = DifyProducer::new(sink_config(&server.uri()));
    let err = producer.produce("t", "b").await.unwrap_err();
    match err {
        DeliveryError::Status { status, .. } => assert_eq!(status, 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_sink_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let producer = DifyProducer::new(sink_config(&server.uri()));
    let err = producer.produce("t", "b").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_network_error() {
    // Nothing listens on this port; construction still succeeds and the
    // failure is deferred to the first produce call.
    let producer = DifyProducer::new(sink_config("http://127.0.0.1:9"));
    let err = producer.produce("t", "b").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Network(_)), "got {err:?}");
}

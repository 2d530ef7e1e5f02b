use std::io::Write;
use std::time::Duration;

use forwarder_core::{RawMessage, ServiceConfig};
use forwarder_engine::{create_source, SourceError};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

#[test]
fn unknown_source_type_is_a_configuration_error() {
    let config = ServiceConfig::default();
    let err = create_source("kafka", &config).unwrap_err();
    match err {
        SourceError::UnknownType { kind } => assert_eq!(kind, "kafka"),
        other => panic!("expected UnknownType, got {other:?}"),
    }
}

#[test]
fn tail_source_requires_an_existing_file() {
    let mut config = ServiceConfig::default();
    config.source.kind = "tail".to_string();
    let err = create_source("tail", &config).unwrap_err();
    assert!(matches!(err, SourceError::Init { .. }), "got {err:?}");

    config.source.path = Some("/nonexistent/messages.jsonl".into());
    let err = create_source("tail", &config).unwrap_err();
    assert!(matches!(err, SourceError::Init { .. }), "got {err:?}");
}

#[test]
fn poll_source_rejects_an_invalid_url() {
    let mut config = ServiceConfig::default();
    config.source.url = Some("not a url".to_string());
    let err = create_source("poll", &config).unwrap_err();
    assert!(matches!(err, SourceError::Init { .. }), "got {err:?}");
}

#[tokio::test]
async fn tail_source_emits_json_lines_and_skips_malformed_ones() {
    forwarder_logging::initialize_for_tests();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"type":"html","content":"<p>one</p>"}}"#).unwrap();
    writeln!(file, "this is not json").unwrap();
    writeln!(file, r#"{{"type":"html","content":"<p>two</p>"}}"#).unwrap();
    file.flush().unwrap();

    let mut config = ServiceConfig::default();
    config.source.path = Some(file.path().to_path_buf());
    let source = create_source("tail", &config).unwrap();

    let cancel = CancellationToken::new();
    let mut messages = source.consume(cancel.clone());

    let first = tokio::time::timeout(RECV_TIMEOUT, messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, RawMessage::new("html", "<p>one</p>"));

    let second = tokio::time::timeout(RECV_TIMEOUT, messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second, RawMessage::new("html", "<p>two</p>"));

    // The tail keeps waiting for appended lines until cancelled.
    cancel.cancel();
    let closed = tokio::time::timeout(RECV_TIMEOUT, messages.recv())
        .await
        .unwrap();
    assert_eq!(closed, None);
}

#[tokio::test]
async fn poll_source_tags_fetched_payloads_with_the_configured_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<h1>Feed</h1>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let mut config = ServiceConfig::default();
    config.source.url = Some(server.uri());
    config.source.poll_interval_secs = 1;
    let source = create_source("poll", &config).unwrap();

    let cancel = CancellationToken::new();
    let mut messages = source.consume(cancel.clone());

    let message = tokio::time::timeout(RECV_TIMEOUT, messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message, RawMessage::new("html", "<h1>Feed</h1>"));

    cancel.cancel();
    let closed = tokio::time::timeout(RECV_TIMEOUT, messages.recv())
        .await
        .unwrap();
    assert_eq!(closed, None);
}

#[tokio::test]
async fn poll_source_keeps_polling_after_a_failed_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>ok</p>", "text/html"))
        .mount(&server)
        .await;

    let mut config = ServiceConfig::default();
    config.source.url = Some(server.uri());
    config.source.poll_interval_secs = 1;
    let source = create_source("poll", &config).unwrap();

    let cancel = CancellationToken::new();
    let mut messages = source.consume(cancel.clone());

    // First poll hits the 500 and is skipped; the next cycle succeeds.
    let message = tokio::time::timeout(Duration::from_secs(5), messages.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message, RawMessage::new("html", "<p>ok</p>"));
    cancel.cancel();
}

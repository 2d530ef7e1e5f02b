use std::time::Duration;

use async_trait::async_trait;
use forwarder_core::SinkConfig;
use reqwest::StatusCode;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("sink rejected credentials ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("sink returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("sink request timed out: {0}")]
    Timeout(String),
    #[error("network error talking to sink: {0}")]
    Network(String),
}

/// Destination for rendered documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn produce(&self, title: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Delivers documents to a Dify knowledge dataset via its
/// `document/create-by-text` endpoint.
///
/// Construction never fails; connection and auth problems surface on the
/// first `produce` call. No retry is attempted here.
pub struct DifyProducer {
    config: SinkConfig,
}

impl DifyProducer {
    pub fn new(config: SinkConfig) -> Self {
        Self { config }
    }

    fn build_client(&self) -> Result<reqwest::Client, DeliveryError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|err| DeliveryError::Network(err.to_string()))
    }

    fn document_url(&self) -> String {
        format!(
            "{}/v1/datasets/{}/document/create-by-text",
            self.config.endpoint.trim_end_matches('/'),
            self.config.dataset_id
        )
    }
}

#[async_trait]
impl DocumentSink for DifyProducer {
    async fn produce(&self, title: &str, body: &str) -> Result<(), DeliveryError> {
        let client = self.build_client()?;
        let response = client
            .post(self.document_url())
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "name": title,
                "text": body,
                "indexing_technique": self.config.indexing_technique,
                "process_rule": { "mode": "automatic" },
            }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_else(|_| String::new());
        let message = truncate(&message, 200);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DeliveryError::Auth {
                status: status.as_u16(),
                message,
            });
        }
        Err(DeliveryError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        return DeliveryError::Timeout(err.to_string());
    }
    DeliveryError::Network(err.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

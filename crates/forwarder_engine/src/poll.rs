use std::time::Duration;

use forwarder_core::{RawMessage, SourceConfig};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_payload;
use crate::source::{MessageSource, SourceError, CHANNEL_CAPACITY};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Polling-HTTP source.
///
/// Periodically GETs the configured URL and emits one message per successful
/// fetch, tagged with the configured `message_type`. A failed poll is logged
/// and the next cycle proceeds normally.
pub struct PollSource {
    url: url::Url,
    interval: Duration,
    message_type: String,
}

impl PollSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let raw = config
            .url
            .as_deref()
            .ok_or_else(|| SourceError::init("poll", "source.url is required"))?;
        let url = url::Url::parse(raw)
            .map_err(|err| SourceError::init("poll", format!("invalid url {raw:?}: {err}")))?;
        Ok(Self {
            url,
            interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            message_type: config.message_type.clone(),
        })
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<RawMessage, String> {
        let response = client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| err.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("unexpected status {status}"));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await.map_err(|err| err.to_string())?;
        let decoded =
            decode_payload(&bytes, content_type.as_deref()).map_err(|err| err.to_string())?;

        Ok(RawMessage::new(self.message_type.clone(), decoded.text))
    }
}

impl MessageSource for PollSource {
    fn consume(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<RawMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let client = match reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
            {
                Ok(client) => client,
                Err(err) => {
                    log::error!("poll source failed to build http client: {err}");
                    return;
                }
            };

            loop {
                match self.fetch(&client).await {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => log::error!("poll of {} failed: {err}", self.url),
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        });
        rx
    }
}

use std::path::PathBuf;
use std::time::Duration;

use forwarder_core::{RawMessage, SourceConfig};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::source::{MessageSource, SourceError, CHANNEL_CAPACITY};

const IDLE_POLL: Duration = Duration::from_millis(500);

/// File-tailing source.
///
/// Reads newline-delimited JSON messages (`{"type": ..., "content": ...}`)
/// from the configured file, then keeps polling for appended lines.
/// Malformed lines are logged and skipped, matching the pipeline's
/// per-message isolation policy.
pub struct TailSource {
    path: PathBuf,
}

impl TailSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let path = config
            .path
            .clone()
            .ok_or_else(|| SourceError::init("tail", "source.path is required"))?;
        if !path.is_file() {
            return Err(SourceError::init(
                "tail",
                format!("no such file: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }
}

impl MessageSource for TailSource {
    fn consume(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<RawMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let file = match File::open(&self.path).await {
                Ok(file) => file,
                Err(err) => {
                    log::error!("tail source failed to open {}: {err}", self.path.display());
                    return;
                }
            };
            let mut lines = BufReader::new(file).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let Some(message) = parse_line(&line) else {
                                continue;
                            };
                            if tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        // At end of file: wait for appended lines.
                        Ok(None) => tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(IDLE_POLL) => {}
                        },
                        Err(err) => {
                            log::error!("tail source read error on {}: {err}", self.path.display());
                            break;
                        }
                    }
                }
            }
        });
        rx
    }
}

pub(crate) fn parse_line(line: &str) -> Option<RawMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<RawMessage>(trimmed) {
        Ok(message) => Some(message),
        Err(err) => {
            log::error!("skipping malformed message line: {err}");
            None
        }
    }
}

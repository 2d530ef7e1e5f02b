use forwarder_core::{RawMessage, ServiceConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::poll::PollSource;
use crate::stdin::StdinSource;
use crate::tail::TailSource;

/// Capacity of the channel between a source's producer task and the driver.
/// Small on purpose: the driver's processing rate gates how far ahead a
/// source may fetch, so a slow consumer delays production instead of
/// accumulating an unbounded backlog.
pub const CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("unknown source type \"{kind}\"")]
    UnknownType { kind: String },
    #[error("failed to initialize \"{kind}\" source: {message}")]
    Init { kind: String, message: String },
}

impl SourceError {
    pub(crate) fn init(kind: &str, message: impl Into<String>) -> Self {
        SourceError::Init {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

/// A producer of raw messages.
///
/// `consume` spawns the producing task and hands back the pull side of a
/// bounded channel. The channel closes when the cancellation token fires or
/// the upstream reaches end-of-stream; no messages are dropped in between.
pub trait MessageSource: Send {
    fn consume(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<RawMessage>;
}

impl std::fmt::Debug for dyn MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad("dyn MessageSource")
    }
}

/// Build the source named by `kind` from the service configuration.
///
/// Both error cases are fatal at startup: an unregistered tag is a
/// configuration mistake, and an `Init` failure means the source cannot
/// reach its upstream.
pub fn create_source(
    kind: &str,
    config: &ServiceConfig,
) -> Result<Box<dyn MessageSource>, SourceError> {
    match kind {
        "tail" => Ok(Box::new(TailSource::new(&config.source)?)),
        "poll" => Ok(Box::new(PollSource::new(&config.source)?)),
        "stdin" => Ok(Box::new(StdinSource::new())),
        other => Err(SourceError::UnknownType {
            kind: other.to_string(),
        }),
    }
}

/// In-process queue source: emits the given messages in order, then closes.
/// Used by embedding callers and tests that drive the pipeline directly.
pub fn channel_source(messages: Vec<RawMessage>) -> Box<dyn MessageSource> {
    Box::new(QueueSource { messages })
}

struct QueueSource {
    messages: Vec<RawMessage>,
}

impl MessageSource for QueueSource {
    fn consume(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<RawMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for message in self.messages {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = tx.send(message) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        rx
    }
}

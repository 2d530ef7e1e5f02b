use forwarder_core::RawMessage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::source::{MessageSource, CHANNEL_CAPACITY};
use crate::tail::parse_line;

/// Standard-input source: newline-delimited JSON messages until EOF.
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
    pub fn new() -> Self {
        Self
    }
}

impl MessageSource for StdinSource {
    fn consume(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<RawMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
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
                        Ok(None) => break,
                        Err(err) => {
                            log::error!("stdin source read error: {err}");
                            break;
                        }
                    }
                }
            }
        });
        rx
    }
}

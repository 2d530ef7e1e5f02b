use forwarder_core::{RawMessage, RenderedDocument};
use tokio_util::sync::CancellationToken;

use crate::extract::extract;
use crate::sink::DocumentSink;
use crate::source::MessageSource;
use crate::transform::MarkdownTransform;

/// Terminal state of one message's pass through the pipeline. Every failure
/// state is terminal for that message only; the stream continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    ExtractFailed,
    TransformFailed,
    DeliverFailed,
}

/// Per-run outcome counters. The only visibility the pipeline keeps for
/// skipped messages beyond the error log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub delivered: usize,
    pub extract_failed: usize,
    pub transform_failed: usize,
    pub deliver_failed: usize,
}

impl PipelineSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::ExtractFailed => self.extract_failed += 1,
            Outcome::TransformFailed => self.transform_failed += 1,
            Outcome::DeliverFailed => self.deliver_failed += 1,
        }
    }
}

/// The driver: drains a source in emission order and runs
/// extract -> transform -> deliver for each message, logging and skipping
/// on any stage failure. Holds no cross-message state.
pub struct Pipeline<S: DocumentSink> {
    transformer: MarkdownTransform,
    sink: S,
}

impl<S: DocumentSink> Pipeline<S> {
    pub fn new(transformer: MarkdownTransform, sink: S) -> Self {
        Self { transformer, sink }
    }

    /// Run until the source's channel closes (cancellation or upstream
    /// end-of-stream). The in-flight message finishes its stages before the
    /// loop observes the closed channel.
    pub async fn run(
        &self,
        source: Box<dyn MessageSource>,
        cancel: CancellationToken,
    ) -> PipelineSummary {
        let mut messages = source.consume(cancel);
        let mut summary = PipelineSummary::default();
        while let Some(message) = messages.recv().await {
            summary.record(self.process(&message).await);
        }
        summary
    }

    /// One message through all stages; never propagates a per-message error.
    pub async fn process(&self, message: &RawMessage) -> Outcome {
        let extracted = match extract(&message.message_type, &message.content) {
            Ok(extracted) => extracted,
            Err(err) => {
                log::error!(
                    "extraction failed for \"{}\" message: {err}",
                    message.message_type
                );
                return Outcome::ExtractFailed;
            }
        };
        log::debug!(
            "extracted \"{}\" with {} blocks",
            extracted.title,
            extracted.blocks.len()
        );

        let body = match self.transformer.transform(&extracted.blocks) {
            Ok(body) => body,
            Err(err) => {
                log::error!(
                    "transform failed for \"{}\" message: {err}",
                    message.message_type
                );
                return Outcome::TransformFailed;
            }
        };
        let document = RenderedDocument {
            title: extracted.title,
            body,
        };

        match self.sink.produce(&document.title, &document.body).await {
            Ok(()) => {
                log::debug!("delivered \"{}\"", document.title);
                Outcome::Delivered
            }
            Err(err) => {
                log::error!("delivery failed for \"{}\": {err}", document.title);
                Outcome::DeliverFailed
            }
        }
    }
}

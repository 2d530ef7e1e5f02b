//! Forwarder engine: message sources, extraction, transformation, delivery.
mod decode;
mod extract;
mod pipeline;
mod poll;
mod sink;
mod source;
mod stdin;
mod tail;
mod transform;

pub use decode::{decode_payload, DecodeError, DecodedPayload};
pub use extract::{extract, ExtractError};
pub use pipeline::{Outcome, Pipeline, PipelineSummary};
pub use poll::PollSource;
pub use sink::{DeliveryError, DifyProducer, DocumentSink};
pub use source::{channel_source, create_source, MessageSource, SourceError, CHANNEL_CAPACITY};
pub use stdin::StdinSource;
pub use tail::TailSource;
pub use transform::{MarkdownTransform, RenderError};

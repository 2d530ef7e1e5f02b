//! Forwarder core: message and document data model plus service configuration.
mod config;
mod types;

pub use config::{ConfigError, LoggerConfig, ServiceConfig, SinkConfig, SourceConfig};
pub use types::{ContentBlock, ExtractedDocument, Inline, ListItem, RawMessage, RenderedDocument};

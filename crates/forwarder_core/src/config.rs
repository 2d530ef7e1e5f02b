//! Service configuration, loaded from `app.yml` (or `.toml`/`.json`) layered
//! over built-in defaults. The pipeline only ever reads these values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_CONFIG: &str = r#"
[source]
kind = "stdin"
poll_interval_secs = 60
message_type = "html"

[sink]
endpoint = "http://localhost"
api_key = ""
dataset_id = ""
timeout_secs = 30
indexing_technique = "high_quality"

[logger]
mode = "prod"
"#;

/// Top-level configuration: which source to run, where to deliver, how to log.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// `[source]` section: the registry tag plus per-implementation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: String,
    /// File to tail (`kind = "tail"`).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Endpoint to poll (`kind = "poll"`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Dialect tag attached to messages from sources that produce untagged
    /// payloads (the HTTP poller).
    #[serde(default = "default_message_type")]
    pub message_type: String,
}

fn default_source_kind() -> String {
    "stdin".to_string()
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_message_type() -> String {
    "html".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            path: None,
            url: None,
            poll_interval_secs: default_poll_interval_secs(),
            message_type: default_message_type(),
        }
    }
}

/// `[sink]` section: the Dify knowledge endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_indexing_technique")]
    pub indexing_technique: String,
}

fn default_endpoint() -> String {
    "http://localhost".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_indexing_technique() -> String {
    "high_quality".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            dataset_id: String::new(),
            timeout_secs: default_timeout_secs(),
            indexing_technique: default_indexing_technique(),
        }
    }
}

/// `[logger]` section. `mode` is one of `dev`, `prod`, `file`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_logger_mode")]
    pub mode: String,
}

fn default_logger_mode() -> String {
    "prod".to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            mode: default_logger_mode(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] config::ConfigError),
}

impl ServiceConfig {
    /// Load from `path`, layered on top of the built-in defaults. The file
    /// format is inferred from the extension (yaml, toml, or json).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()
            .map_err(ConfigError::Read)
    }

    /// Built-in defaults without touching the filesystem (useful in tests).
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

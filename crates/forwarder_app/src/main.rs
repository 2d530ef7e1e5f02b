//! Forwarder binary: load configuration, pick a source, and pump messages
//! through extract -> transform -> deliver until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use forwarder_core::ServiceConfig;
use forwarder_engine::{create_source, DifyProducer, MarkdownTransform, Pipeline};
use forwarder_logging::Mode;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The logger may not be up yet; stderr is the reliable channel
            // for startup failures.
            eprintln!("forwarder: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config_dir = std::env::var("CONFIG_PATH").unwrap_or_else(|_| ".".to_string());
    let config_path = PathBuf::from(config_dir).join("app.yml");
    let config = ServiceConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    forwarder_logging::init(Mode::parse(&config.logger.mode));

    let source = create_source(&config.source.kind, &config).map_err(|err| {
        log::error!("failed to create source \"{}\": {err}", config.source.kind);
        anyhow::anyhow!("source setup failed: {err}")
    })?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown requested");
            shutdown.cancel();
        }
    });

    let pipeline = Pipeline::new(MarkdownTransform::new(), DifyProducer::new(config.sink.clone()));
    log::info!("processing messages from \"{}\" source", config.source.kind);
    let summary = pipeline.run(source, cancel).await;
    log::info!(
        "pipeline stopped: {} delivered, {} extract failures, {} transform failures, {} delivery failures",
        summary.delivered,
        summary.extract_failed,
        summary.transform_failed,
        summary.deliver_failed
    );
    Ok(())
}

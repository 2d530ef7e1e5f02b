#![deny(missing_docs)]
//! Logger initialization for the forwarder workspace.
//!
//! All crates log through the `log` facade; this crate wires that facade to
//! `simplelog` according to the `logger.mode` configuration value. If no
//! logger is ever initialized the facade no-ops, which is a valid (silent)
//! configuration rather than an error.

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Logging mode, parsed from the `logger.mode` config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Terminal output at debug level.
    Dev,
    /// Terminal output at info level.
    Prod,
    /// Terminal plus `./forwarder.log` at info level.
    File,
}

impl Mode {
    /// Parse a mode string, falling back to `Prod` for unknown values.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "dev" | "debug" => Mode::Dev,
            "file" => Mode::File,
            _ => Mode::Prod,
        }
    }
}

/// Initialize the global logger for the given mode.
///
/// Safe to call once per process; a second call is ignored by simplelog.
/// A failure to create the log file degrades to terminal-only logging.
pub fn init(mode: Mode) {
    let level = match mode {
        Mode::Dev => LevelFilter::Debug,
        Mode::Prod | Mode::File => LevelFilter::Info,
    };
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if mode == Mode::File {
        if let Some(file_logger) = create_file_logger(level, config) {
            loggers.push(file_logger);
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from("./forwarder.log");
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!(
                "Warning: Could not create log file at {:?}: {}",
                log_path, err
            );
            None
        }
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing_defaults_to_prod() {
        assert_eq!(Mode::parse("dev"), Mode::Dev);
        assert_eq!(Mode::parse("file"), Mode::File);
        assert_eq!(Mode::parse("prod"), Mode::Prod);
        assert_eq!(Mode::parse("verbose"), Mode::Prod);
    }
}

#![deny(missing_docs)]
//! Shared logging setup for the Sirene workspace.
//!
//! The app initializes the global `log` facade through [`initialize`]; test
//! binaries use [`initialize_for_tests`], which safely no-ops when another
//! test already installed a logger.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
pub enum LogDestination<'a> {
    /// Write to the given log file only.
    File(&'a Path),
    /// Write to the terminal (stderr/stdout mixed).
    Terminal,
    /// Write to both the terminal and the given log file.
    Both(&'a Path),
}

/// Initialize the global logger with the specified destination and level.
///
/// A file destination that cannot be created degrades to whatever remains
/// (terminal, or nothing) with a warning on stderr.
pub fn initialize(destination: LogDestination<'_>, level: LevelFilter) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    match destination {
        LogDestination::File(path) => {
            if let Some(file_logger) = create_file_logger(level, config, path) {
                loggers.push(file_logger);
            }
        }
        LogDestination::Terminal => {
            loggers.push(term_logger(level, config));
        }
        LogDestination::Both(path) => {
            loggers.push(term_logger(level, config.clone()));
            if let Some(file_logger) = create_file_logger(level, config, path) {
                loggers.push(file_logger);
            }
        }
    }

    if loggers.is_empty() {
        return;
    }
    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in tests.
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

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn term_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: could not create log file at {path:?}: {err}");
            None
        }
    }
}

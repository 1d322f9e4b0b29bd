//! Logger setup for the terminal front end.
//!
//! Stdout carries the conversation, so terminal logging goes to stderr.
//! File logging writes `./askdesk.log` in the current working directory.

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILENAME: &str = "./askdesk.log";

/// Destination for log output.
pub enum LogDestination {
    /// Write to ./askdesk.log in current directory.
    File,
    /// Write to the terminal (stderr).
    Terminal,
}

impl LogDestination {
    pub fn from_flag(log_to_file: bool) -> Self {
        if log_to_file {
            LogDestination::File
        } else {
            LogDestination::Terminal
        }
    }
}

/// Initialize the logger with the specified destination and level.
///
/// Only records under the askdesk target are kept; HTTP client internals are
/// filtered out.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => match create_file_logger(level, config.clone()) {
            Some(file_logger) => vec![file_logger],
            None => vec![terminal_logger(level, config)],
        },
        LogDestination::Terminal => vec![terminal_logger(level, config)],
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str(desk_logging::TARGET)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from(LOG_FILENAME);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}

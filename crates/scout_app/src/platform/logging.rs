//! Logger setup for the `scout` binary.

use std::fs::File;
use std::path::Path;

use clap::ValueEnum;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Created (truncated) in the working directory when file output is on.
const LOG_FILE: &str = "scout.log";

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogDestination {
    /// `./scout.log` only.
    File,
    /// Stderr only; stdout is reserved for progress output.
    Terminal,
    /// Stderr and `./scout.log`.
    Both,
}

impl LogDestination {
    fn to_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }
}

/// Installs the global logger. Failing to open the log file only drops that
/// destination.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = scout_records_only();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);

    if destination.to_terminal() {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if destination.to_file() {
        match File::create(Path::new(LOG_FILE)) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => eprintln!("Aviso: não foi possível criar {LOG_FILE}: {err}"),
        }
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// Hides reqwest/hyper internals, which are noisy at debug level.
fn scout_records_only() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("scout")
        .build()
}

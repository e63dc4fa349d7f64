#![deny(missing_docs)]
//! Logging glue shared by the scout crates.
//!
//! The `scout_*` macros forward to the `log` facade at a fixed level, so any
//! crate using them must depend on `log` as well. Which backend receives the
//! records is decided once by the binary (see `scout_app`), or by
//! [`initialize_for_tests`] inside test binaries.

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

/// Logs at trace level.
#[macro_export]
macro_rules! scout_trace {
    ($($arg:tt)*) => {
        log::log!(log::Level::Trace, $($arg)*)
    };
}

/// Logs at debug level.
#[macro_export]
macro_rules! scout_debug {
    ($($arg:tt)*) => {
        log::log!(log::Level::Debug, $($arg)*)
    };
}

/// Logs at info level.
#[macro_export]
macro_rules! scout_info {
    ($($arg:tt)*) => {
        log::log!(log::Level::Info, $($arg)*)
    };
}

/// Logs at warn level.
#[macro_export]
macro_rules! scout_warn {
    ($($arg:tt)*) => {
        log::log!(log::Level::Warn, $($arg)*)
    };
}

/// Logs at error level.
#[macro_export]
macro_rules! scout_error {
    ($($arg:tt)*) => {
        log::log!(log::Level::Error, $($arg)*)
    };
}

/// Level for a count of `-v` flags: none is `Info`, one `Debug`, more `Trace`.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs a terminal logger for test binaries.
///
/// Only the first call in a test binary installs the logger; later calls are
/// no-ops.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("scout")
        .build();
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

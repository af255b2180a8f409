//! Logging infrastructure

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogLevel};

fn level_for(log_level: LogLevel) -> Option<Level> {
    match log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    }
}

/// Initialize the logging system based on configuration
pub fn init(config: &Config) {
    let Some(level) = level_for(config.debug.log_level) else {
        return;
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true),
    );

    if config.debug.log_to_file {
        match std::fs::File::create(&config.debug.log_path) {
            Ok(file) => {
                let file_layer = fmt::layer().with_writer(file).with_ansi(false);
                let _ = subscriber.with(file_layer).try_init();
            }
            Err(e) => {
                let _ = subscriber.try_init();
                tracing::warn!(
                    "Could not open log file {}: {}",
                    config.debug.log_path.display(),
                    e
                );
            }
        }
    } else {
        let _ = subscriber.try_init();
    }
}

/// Initialize logging with default settings (for tools and tests)
pub fn init_default() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

// Convenience macros for component-specific logging

/// Log an interpreter trace message
#[macro_export]
macro_rules! ppc_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "ppc", $($arg)*)
    };
}

/// Log an interpreter debug message
#[macro_export]
macro_rules! ppc_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "ppc", $($arg)*)
    };
}

/// Log a call-bridge debug message
#[macro_export]
macro_rules! bridge_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "bridge", $($arg)*)
    };
}

/// Log a memory debug message
#[macro_export]
macro_rules! memory_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "memory", $($arg)*)
    };
}

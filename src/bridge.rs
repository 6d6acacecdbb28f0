//! Bridge from the `log` crate facade
//!
//! Records emitted through `log::info!` and friends are routed to the logger
//! named after the record's target, with `::` replaced by `.`. Messages arrive
//! already formatted and are logged verbatim.
//!
//! ```
//! use hierarchical_logger::bridge::logger_name_for_target;
//!
//! assert_eq!(logger_name_for_target("my_app::db::pool"), "my_app.db.pool");
//! ```

use crate::core::{CallSite, LogLevel, LoggerError, Registry, Result};
use std::borrow::Cow;

/// `log::Log` implementation backed by a [`Registry`]
#[derive(Debug, Clone)]
pub struct LogBridge {
    registry: Registry,
}

impl LogBridge {
    /// Bridge into the global registry
    pub fn new() -> Self {
        Self::with_registry(Registry::global().clone())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }
}

impl Default for LogBridge {
    fn default() -> Self {
        Self::new()
    }
}

pub fn level_from_log(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

pub fn logger_name_for_target(target: &str) -> String {
    target.replace("::", ".")
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.registry.is_enabled_for(
            &logger_name_for_target(metadata.target()),
            level_from_log(metadata.level()),
        )
    }

    fn log(&self, record: &log::Record<'_>) {
        let logger = self
            .registry
            .get_logger(&logger_name_for_target(record.target()));
        let level = level_from_log(record.level());
        if !logger.is_enabled_for(level) {
            return;
        }

        let location = CallSite {
            file: record.file_static(),
            line: record.line(),
            module_path: record.module_path_static(),
            function: None,
        };
        let message = match record.args().as_str() {
            Some(message) => Cow::Borrowed(message),
            None => Cow::Owned(record.args().to_string()),
        };
        logger.emit(level, location, &message, &[]);
    }

    fn flush(&self) {
        if let Err(e) = self.registry.flush() {
            eprintln!("[LOGGER ERROR] Flush through log bridge failed: {}", e);
        }
    }
}

/// Install a [`LogBridge`] as the `log` crate's global logger
///
/// Filtering is left to the registry, so the `log` max level is set to trace.
pub fn init_log_bridge() -> Result<()> {
    log::set_boxed_logger(Box::new(LogBridge::new()))
        .map_err(|e| LoggerError::config("log bridge", e.to_string()))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

//! Appender trait for log output destinations

use super::{error::Result, log_level::LogLevel};

/// A sink for fully formatted log lines
///
/// Appenders are shared between threads, so `append` takes `&self` and must
/// write each line as a unit: concurrent calls never interleave partial lines.
/// The level is passed along for sinks that route or decorate by severity.
pub trait Appender: Send + Sync {
    fn append(&self, level: LogLevel, line: &str) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
}

//! Name-based entry points for bridges and embedding code
//!
//! Everything here works on the global registry and addresses loggers by
//! their dotted name, so a foreign logging front end can forward records
//! without holding [`Logger`] handles.

use crate::core::{
    context, lwp_id as thread_lwp_id, CallSite, FormatArg, LogLevel, Logger, Registry,
    ROOT_LOGGER_NAME,
};

/// Name of the default logger, the root
pub fn default_logger_name() -> &'static str {
    ROOT_LOGGER_NAME
}

/// Lightweight identifier of the calling thread
pub fn lwp_id() -> u64 {
    thread_lwp_id()
}

/// Log to the logger `name`
///
/// With no arguments `message` is logged verbatim.
///
/// # Example
///
/// ```
/// use hierarchical_logger::{facade, FormatArg, LogLevel};
///
/// facade::log("bridge.example", LogLevel::Info, "%d records", &[FormatArg::from(3)]);
/// facade::log("bridge.example", LogLevel::Info, "100% verbatim", &[]);
/// ```
#[track_caller]
pub fn log(name: &str, level: LogLevel, message: &str, args: &[FormatArg]) {
    let logger = Registry::global().get_logger(name);
    if logger.is_enabled_for(level) {
        logger.emit(level, CallSite::caller(), message, args);
    }
}

/// Log with a call site supplied by the caller
pub fn log_at(name: &str, level: LogLevel, location: CallSite, message: &str) {
    let logger = Registry::global().get_logger(name);
    if logger.is_enabled_for(level) {
        logger.emit(level, location, message, &[]);
    }
}

pub fn set_level(name: &str, level: impl Into<Option<LogLevel>>) {
    Registry::global().set_level(name, level);
}

/// Explicit level of `name`, `None` when unset
pub fn get_level(name: &str) -> Option<LogLevel> {
    Registry::global().level(name)
}

pub fn effective_level(name: &str) -> LogLevel {
    Registry::global().effective_level(name)
}

pub fn is_enabled_for(name: &str, level: LogLevel) -> bool {
    Registry::global().is_enabled_for(name, level)
}

/// Logger for the calling thread's context path
pub fn current_logger() -> Logger {
    Logger::current()
}

/// Context path of the calling thread
pub fn current_context() -> String {
    context::current_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogContext;

    #[test]
    fn test_default_logger_is_root() {
        assert_eq!(default_logger_name(), "");
        assert!(Logger::get(default_logger_name()).is_root());
    }

    #[test]
    fn test_levels_by_name() {
        assert_eq!(get_level("facade_test.levels"), None);
        set_level("facade_test", LogLevel::Error);
        assert_eq!(get_level("facade_test"), Some(LogLevel::Error));
        assert_eq!(effective_level("facade_test.levels"), LogLevel::Error);
        assert!(!is_enabled_for("facade_test.levels", LogLevel::Warn));

        set_level("facade_test", None);
        assert_eq!(get_level("facade_test"), None);
    }

    #[test]
    fn test_lwp_id_is_stable_per_thread() {
        let here = lwp_id();
        assert_eq!(here, lwp_id());
        let other = std::thread::spawn(lwp_id).join().unwrap();
        assert_ne!(here, other);
    }

    #[test]
    fn test_current_logger_follows_context() {
        let _ctx = LogContext::push("facade_ctx", None);
        assert_eq!(current_context(), "facade_ctx");
        assert_eq!(current_logger().name(), "facade_ctx");
    }
}

//! Named logger handles

use super::{
    interpolate::FormatArg,
    log_event::CallSite,
    log_level::LogLevel,
    registry::{LoggerNode, Registry},
};
use std::fmt;
use std::sync::Arc;

/// Handle to a node of a [`Registry`]
///
/// Handles are cheap to clone and compare equal when they refer to the same
/// node. Level changes made through one handle are visible through every
/// other handle for the same name.
///
/// # Example
///
/// ```
/// use hierarchical_logger::{LogLevel, Logger};
///
/// let logger = Logger::get("docs.logger.example");
/// logger.set_level(LogLevel::Debug);
/// assert!(logger.is_enabled_for(LogLevel::Debug));
/// assert!(!logger.is_enabled_for(LogLevel::Trace));
///
/// logger.set_level(None);
/// assert_eq!(logger.level(), None);
/// ```
#[derive(Clone)]
pub struct Logger {
    registry: Registry,
    node: Arc<LoggerNode>,
}

impl Logger {
    pub(crate) fn from_parts(registry: Registry, node: Arc<LoggerNode>) -> Self {
        Self { registry, node }
    }

    /// Logger `name` from the global registry
    pub fn get(name: &str) -> Self {
        Registry::global().get_logger(name)
    }

    /// Root logger of the global registry
    pub fn root() -> Self {
        Registry::global().root()
    }

    /// Logger for the calling thread's context path
    pub fn current() -> Self {
        Registry::global().current_logger()
    }

    /// Full dotted name; empty for the root
    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn is_root(&self) -> bool {
        self.node.parent().is_none()
    }

    pub fn parent(&self) -> Option<Logger> {
        self.node
            .parent()
            .map(|parent| Logger::from_parts(self.registry.clone(), Arc::clone(parent)))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Explicit level, `None` when inherited
    pub fn level(&self) -> Option<LogLevel> {
        self.node.level()
    }

    /// Set or clear the explicit level
    pub fn set_level(&self, level: impl Into<Option<LogLevel>>) {
        self.registry.replace_level(&self.node, level.into());
    }

    /// Install a level and hand back the one it replaced
    pub(crate) fn replace_level(&self, level: Option<LogLevel>) -> Option<LogLevel> {
        self.registry.replace_level(&self.node, level)
    }

    #[inline]
    pub fn effective_level(&self) -> LogLevel {
        self.node.effective_level()
    }

    #[inline]
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        level >= self.node.effective_level()
    }

    /// Emit a record with an explicit call site
    ///
    /// With no arguments the template is the message, verbatim. Otherwise it
    /// is interpolated printf-style; a mismatched template is logged raw.
    pub fn emit(&self, level: LogLevel, location: CallSite, template: &str, args: &[FormatArg]) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.registry
            .dispatch(&self.node, level, location, template, args);
    }

    /// Log a message verbatim
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if self.is_enabled_for(level) {
            self.emit(level, CallSite::caller(), message.as_ref(), &[]);
        }
    }

    /// Log a printf-style template with arguments
    #[track_caller]
    pub fn logf(&self, level: LogLevel, template: &str, args: &[FormatArg]) {
        if self.is_enabled_for(level) {
            self.emit(level, CallSite::caller(), template, args);
        }
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Logger {}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("effective_level", &self.effective_level())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::appender::Appender;
    use crate::core::error::Result;
    use crate::core::layout::Layout;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl Appender for Capture {
        fn append(&self, _level: LogLevel, line: &str) -> Result<()> {
            self.0.lock().push(line.to_string());
            Ok(())
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "capture"
        }
    }

    #[test]
    fn test_parent_chain() {
        let registry = Registry::new();
        let logger = registry.get_logger("a.b.c");
        let parent = logger.parent().unwrap();
        assert_eq!(parent.name(), "a.b");
        assert_eq!(parent.parent().unwrap().name(), "a");
        assert!(parent.parent().unwrap().parent().unwrap().is_root());
        assert!(registry.root().parent().is_none());
    }

    #[test]
    fn test_threshold_filtering() {
        let registry = Registry::new();
        let capture = std::sync::Arc::new(Capture::default());
        registry.add_appender("", capture.clone(), Layout::pattern("%p %m").unwrap());

        let logger = registry.get_logger("filtering");
        logger.set_level(LogLevel::Warn);
        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");
        logger.fatal("shown too");

        assert_eq!(*capture.0.lock(), vec!["WARN shown", "FATAL shown too"]);
    }

    #[test]
    fn test_message_without_args_is_verbatim() {
        let registry = Registry::new();
        let capture = std::sync::Arc::new(Capture::default());
        registry.add_appender("", capture.clone(), Layout::pattern("%m").unwrap());

        let logger = registry.get_logger("verbatim");
        logger.info("This is '%s' %d");
        logger.logf(LogLevel::Info, "%d%% done", &[FormatArg::from(50)]);

        assert_eq!(*capture.0.lock(), vec!["This is '%s' %d", "50% done"]);
    }

    #[test]
    fn test_call_site_is_captured() {
        let registry = Registry::new();
        let capture = std::sync::Arc::new(Capture::default());
        registry.add_appender("", capture.clone(), Layout::pattern("%F").unwrap());

        registry.get_logger("location").info("here");
        assert_eq!(*capture.0.lock(), vec!["logger.rs"]);
    }
}

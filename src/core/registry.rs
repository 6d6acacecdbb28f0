//! Process-wide namespace of loggers
//!
//! Loggers are identified by dotted names (`"a.b.c"`); the empty name is the
//! root. The registry hands out exactly one node per name, creating it and its
//! ancestors on first request, and never removes nodes.
//!
//! Each node stores its explicit level in an atomic and keeps a strong
//! reference to its parent, so resolving the effective level is a lock-free
//! walk towards the root. Changes to levels and appender bindings are
//! serialized through the registry's wiring lock; emitters take that lock
//! (shared) only after the lock-free check said the record is enabled, so a
//! reconfiguration is observed either entirely or not at all.

use super::{
    appender::Appender,
    context,
    error::Result,
    interpolate::{interpolate, FormatArg},
    layout::Layout,
    log_event::{self, CallSite, LogEvent},
    log_level::{AtomicLevel, LogLevel},
    logger::Logger,
    metrics::LoggerMetrics,
    pattern::ROOT_LOGGER_DISPLAY_NAME,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Threshold applied when no logger on the path to the root has a level
pub const DEFAULT_LEVEL: LogLevel = LogLevel::Info;

/// Name of the root logger
pub const ROOT_LOGGER_NAME: &str = "";

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Parent name of a dotted logger name; the root's children have `""` as parent
pub fn parent_name(name: &str) -> Option<&str> {
    if name.is_empty() {
        return None;
    }
    Some(name.rfind('.').map_or(ROOT_LOGGER_NAME, |index| &name[..index]))
}

/// An appender attached to a logger, with the layout used to render for it
#[derive(Clone)]
pub struct AppenderBinding {
    pub appender: Arc<dyn Appender>,
    pub layout: Arc<Layout>,
}

impl AppenderBinding {
    pub fn new(appender: Arc<dyn Appender>, layout: Layout) -> Self {
        Self {
            appender,
            layout: Arc::new(layout),
        }
    }
}

impl fmt::Debug for AppenderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderBinding")
            .field("appender", &self.appender.name())
            .field("layout", &self.layout)
            .finish()
    }
}

pub(crate) struct LoggerNode {
    name: String,
    parent: Option<Arc<LoggerNode>>,
    level: AtomicLevel,
    bindings: RwLock<Vec<AppenderBinding>>,
}

impl LoggerNode {
    fn new(name: String, parent: Option<Arc<LoggerNode>>) -> Self {
        Self {
            name,
            parent,
            level: AtomicLevel::unset(),
            bindings: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parent(&self) -> Option<&Arc<LoggerNode>> {
        self.parent.as_ref()
    }

    pub(crate) fn level(&self) -> Option<LogLevel> {
        self.level.load()
    }

    /// Nearest explicit level walking towards the root
    #[inline]
    pub(crate) fn effective_level(&self) -> LogLevel {
        let mut node = self;
        loop {
            if let Some(level) = node.level.load() {
                return level;
            }
            match &node.parent {
                Some(parent) => node = parent,
                None => return DEFAULT_LEVEL,
            }
        }
    }

    /// Bindings of the nearest logger (self included) that has any
    fn resolve_bindings(&self) -> Vec<AppenderBinding> {
        let mut node = self;
        loop {
            let bindings = node.bindings.read();
            if !bindings.is_empty() {
                return bindings.clone();
            }
            drop(bindings);
            match &node.parent {
                Some(parent) => node = parent,
                None => return Vec::new(),
            }
        }
    }
}

impl fmt::Debug for LoggerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerNode")
            .field("name", &self.name)
            .field("level", &self.level.load())
            .finish()
    }
}

/// Levels and appender bindings to install in one step
///
/// Produced by the configuration layer and installed with [`Registry::apply`].
#[derive(Debug, Default, Clone)]
pub struct Wiring {
    pub root_level: Option<LogLevel>,
    pub levels: Vec<(String, LogLevel)>,
    pub bindings: Vec<(String, AppenderBinding)>,
}

struct RegistryInner {
    root: Arc<LoggerNode>,
    loggers: RwLock<HashMap<String, Arc<LoggerNode>>>,
    wiring: RwLock<()>,
    metrics: LoggerMetrics,
    warned_unrouted: AtomicBool,
}

/// Shared, thread-safe namespace of loggers
///
/// Cloning is cheap and yields a handle to the same namespace. Most code uses
/// [`Registry::global`]; separate registries are useful for embedding and
/// tests.
///
/// # Example
///
/// ```
/// use hierarchical_logger::{LogLevel, Registry};
///
/// let registry = Registry::new();
/// registry.set_level("a.b", LogLevel::Warn);
///
/// let logger = registry.get_logger("a.b.c");
/// assert_eq!(logger.level(), None);
/// assert_eq!(logger.effective_level(), LogLevel::Warn);
/// assert_eq!(logger, registry.get_logger("a.b.c"));
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        log_event::mark_process_start();
        Self {
            inner: Arc::new(RegistryInner {
                root: Arc::new(LoggerNode::new(ROOT_LOGGER_NAME.to_string(), None)),
                loggers: RwLock::new(HashMap::new()),
                wiring: RwLock::new(()),
                metrics: LoggerMetrics::new(),
                warned_unrouted: AtomicBool::new(false),
            }),
        }
    }

    /// The process-wide registry, created on first use
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Logger for `name`, created with its ancestors on first request
    pub fn get_logger(&self, name: &str) -> Logger {
        Logger::from_parts(self.clone(), self.node(name))
    }

    /// The root logger
    pub fn root(&self) -> Logger {
        Logger::from_parts(self.clone(), Arc::clone(&self.inner.root))
    }

    /// Logger for the calling thread's current context path
    ///
    /// Served from the innermost context frame when that frame was pushed in
    /// this registry, so no name lookup happens on the common path.
    pub fn current_logger(&self) -> Logger {
        context::current_logger(self).unwrap_or_else(|| self.get_logger(&context::current_path()))
    }

    /// Whether both handles refer to the same namespace
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn node(&self, name: &str) -> Arc<LoggerNode> {
        if name.is_empty() {
            return Arc::clone(&self.inner.root);
        }
        if let Some(node) = self.inner.loggers.read().get(name) {
            return Arc::clone(node);
        }

        // Resolve the parent before taking the write lock
        let parent = self.node(parent_name(name).unwrap_or(ROOT_LOGGER_NAME));
        let mut loggers = self.inner.loggers.write();
        let node = loggers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LoggerNode::new(name.to_string(), Some(parent))));
        Arc::clone(node)
    }

    /// Whether a logger with this name has been created
    pub fn contains(&self, name: &str) -> bool {
        name.is_empty() || self.inner.loggers.read().contains_key(name)
    }

    /// Names of every logger created so far, root first, sorted
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.loggers.read().keys().cloned().collect();
        names.sort();
        names.insert(0, ROOT_LOGGER_NAME.to_string());
        names
    }

    /// Explicit level of `name`, `None` when unset or when the logger does not exist
    pub fn level(&self, name: &str) -> Option<LogLevel> {
        if name.is_empty() {
            return self.inner.root.level();
        }
        self.inner
            .loggers
            .read()
            .get(name)
            .and_then(|node| node.level())
    }

    /// Set or clear (`None`) the explicit level of `name`
    pub fn set_level(&self, name: &str, level: impl Into<Option<LogLevel>>) {
        let node = self.node(name);
        self.replace_level(&node, level.into());
    }

    /// Install `level` on `node`, returning the explicit level it replaced
    pub(crate) fn replace_level(
        &self,
        node: &LoggerNode,
        level: Option<LogLevel>,
    ) -> Option<LogLevel> {
        let _wiring = self.inner.wiring.write();
        node.level.swap(level)
    }

    pub fn effective_level(&self, name: &str) -> LogLevel {
        self.node(name).effective_level()
    }

    pub fn is_enabled_for(&self, name: &str, level: LogLevel) -> bool {
        level >= self.effective_level(name)
    }

    /// Attach an appender to `name`
    pub fn add_appender(&self, name: &str, appender: Arc<dyn Appender>, layout: Layout) {
        let node = self.node(name);
        let _wiring = self.inner.wiring.write();
        node.bindings
            .write()
            .push(AppenderBinding::new(appender, layout));
    }

    /// Detach every appender from `name`
    pub fn clear_appenders(&self, name: &str) {
        let node = self.node(name);
        let _wiring = self.inner.wiring.write();
        node.bindings.write().clear();
    }

    /// Replace the whole level and appender wiring
    ///
    /// Every explicit level and binding is cleared, then `wiring` is installed,
    /// all under the wiring lock.
    pub fn apply(&self, wiring: Wiring) {
        // Node creation takes the map lock, never the wiring lock
        let levels: Vec<(Arc<LoggerNode>, LogLevel)> = wiring
            .levels
            .iter()
            .map(|(name, level)| (self.node(name), *level))
            .collect();
        let bindings: Vec<(Arc<LoggerNode>, AppenderBinding)> = wiring
            .bindings
            .into_iter()
            .map(|(name, binding)| (self.node(&name), binding))
            .collect();

        let _wiring = self.inner.wiring.write();
        for node in self.all_nodes() {
            node.level.store(None);
            node.bindings.write().clear();
        }
        self.inner.root.level.store(wiring.root_level);
        for (node, level) in levels {
            node.level.store(Some(level));
        }
        for (node, binding) in bindings {
            node.bindings.write().push(binding);
        }
        self.inner.warned_unrouted.store(false, Ordering::Relaxed);
    }

    /// Clear every explicit level and appender binding
    pub fn reset(&self) {
        self.apply(Wiring::default());
    }

    /// Flush every bound appender, returning the first error
    pub fn flush(&self) -> Result<()> {
        let mut seen: Vec<*const ()> = Vec::new();
        let mut first_error = None;
        for node in self.all_nodes() {
            for binding in node.bindings.read().iter() {
                let key = Arc::as_ptr(&binding.appender) as *const ();
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);
                if let Err(e) = binding.appender.flush() {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    fn all_nodes(&self) -> Vec<Arc<LoggerNode>> {
        let loggers = self.inner.loggers.read();
        let mut nodes = Vec::with_capacity(loggers.len() + 1);
        nodes.push(Arc::clone(&self.inner.root));
        nodes.extend(loggers.values().cloned());
        nodes
    }

    /// Render and write a record that passed the caller's level check
    pub(crate) fn dispatch(
        &self,
        node: &LoggerNode,
        level: LogLevel,
        location: CallSite,
        template: &str,
        args: &[FormatArg],
    ) {
        let bindings = {
            // Recursive read: an appender that logs must not deadlock behind a
            // queued writer
            let _wiring = self.inner.wiring.read_recursive();
            if level < node.effective_level() {
                return;
            }
            node.resolve_bindings()
        };

        if bindings.is_empty() {
            self.inner.metrics.record_unrouted();
            if !self.inner.warned_unrouted.swap(true, Ordering::Relaxed) {
                let name = if node.name().is_empty() {
                    ROOT_LOGGER_DISPLAY_NAME
                } else {
                    node.name()
                };
                eprintln!(
                    "[LOGGER WARNING] No appenders could be found for logger '{}'. \
                     Please configure the logging system.",
                    name
                );
            }
            return;
        }

        let message = self.render_message(template, args);
        let event = LogEvent::capture(level, node.name(), message, location);
        self.write_event(&event, &bindings);
    }

    fn render_message(&self, template: &str, args: &[FormatArg]) -> String {
        if args.is_empty() {
            return template.to_string();
        }
        match interpolate(template, args) {
            Ok(message) => message,
            Err(e) => {
                self.inner.metrics.record_format_error();
                eprintln!("[LOGGER ERROR] {}. Logging the raw template instead.", e);
                template.to_string()
            }
        }
    }

    /// Write one event to each binding with per-appender panic isolation
    fn write_event(&self, event: &LogEvent, bindings: &[AppenderBinding]) {
        let mut has_error = false;

        for binding in bindings {
            let line = binding.layout.format(event);
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                binding.appender.append(event.level, &line)
            }));

            match append_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Appender '{}' failed: {}",
                        binding.appender.name(),
                        e
                    );
                    has_error = true;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Appender '{}' panicked: {}. \
                         Other appenders continue to function.",
                        binding.appender.name(),
                        panic_message(&panic_info)
                    );
                    has_error = true;
                }
            }
        }

        if has_error {
            self.inner.metrics.record_dropped();
        } else {
            self.inner.metrics.record_logged();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("loggers", &(self.inner.loggers.read().len() + 1))
            .finish()
    }
}

fn panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Capture {
        lines: Mutex<Vec<String>>,
    }

    impl Appender for Capture {
        fn append(&self, _level: LogLevel, line: &str) -> Result<()> {
            self.lines.lock().push(line.to_string());
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn capture(registry: &Registry, name: &str, pattern: &str) -> Arc<Capture> {
        let capture = Arc::new(Capture::default());
        registry.add_appender(name, capture.clone(), Layout::pattern(pattern).unwrap());
        capture
    }

    #[test]
    fn test_parent_name() {
        assert_eq!(parent_name("a.b.c"), Some("a.b"));
        assert_eq!(parent_name("a"), Some(""));
        assert_eq!(parent_name(""), None);
    }

    #[test]
    fn test_singleton_per_name() {
        let registry = Registry::new();
        let first = registry.get_logger("a.b");
        let second = registry.get_logger("a.b");
        assert_eq!(first, second);
        assert!(registry.contains("a"));
        assert_eq!(registry.logger_names(), vec!["", "a", "a.b"]);
    }

    #[test]
    fn test_concurrent_first_access_creates_one_node() {
        let registry = Registry::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.get_logger("x.y.z"))
            })
            .collect();
        let loggers: Vec<Logger> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(loggers.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(registry.logger_names().len(), 4);
    }

    #[test]
    fn test_inheritance() {
        let registry = Registry::new();
        assert_eq!(registry.effective_level("a.b.c"), DEFAULT_LEVEL);

        registry.set_level("a.b", LogLevel::Info);
        assert_eq!(registry.effective_level("a.b.c"), LogLevel::Info);
        assert_eq!(registry.level("a.b.c"), None);

        registry.set_level("a.b.c", LogLevel::Debug);
        registry.set_level("a.b", LogLevel::Error);
        assert_eq!(registry.effective_level("a.b.c"), LogLevel::Debug);

        registry.set_level("a.b.c", None);
        assert_eq!(registry.effective_level("a.b.c"), LogLevel::Error);
    }

    #[test]
    fn test_level_of_unknown_logger_does_not_create_it() {
        let registry = Registry::new();
        assert_eq!(registry.level("never.created"), None);
        assert!(!registry.contains("never.created"));
    }

    #[test]
    fn test_appenders_resolve_to_nearest_ancestor() {
        let registry = Registry::new();
        registry.set_level("", LogLevel::Trace);
        let root = capture(&registry, "", "root:%c:%m");
        let svc = capture(&registry, "svc", "svc:%c:%m");

        registry.get_logger("svc.db").info("query");
        registry.get_logger("other").info("hello");

        assert_eq!(*svc.lines.lock(), vec!["svc:svc.db:query"]);
        assert_eq!(*root.lines.lock(), vec!["root:other:hello"]);
        assert_eq!(registry.metrics().total_logged(), 2);
    }

    #[test]
    fn test_apply_replaces_wiring() {
        let registry = Registry::new();
        registry.set_level("old", LogLevel::Fatal);
        let old = capture(&registry, "", "%m");

        let new = Arc::new(Capture::default());
        registry.apply(Wiring {
            root_level: Some(LogLevel::Debug),
            levels: vec![("quiet".to_string(), LogLevel::Error)],
            bindings: vec![(
                String::new(),
                AppenderBinding::new(new.clone(), Layout::pattern("%p %m").unwrap()),
            )],
        });

        assert_eq!(registry.level("old"), None);
        assert_eq!(registry.effective_level("quiet.child"), LogLevel::Error);
        registry.get_logger("old").debug("after");
        registry.get_logger("quiet").warn("hidden");

        assert!(old.lines.lock().is_empty());
        assert_eq!(*new.lines.lock(), vec!["DEBUG after"]);
    }

    #[test]
    fn test_unrouted_records_are_counted() {
        let registry = Registry::new();
        registry.get_logger("nowhere").error("lost");
        assert_eq!(registry.metrics().unrouted(), 1);
        assert_eq!(registry.metrics().total_logged(), 0);
    }

    #[test]
    fn test_failing_and_panicking_appenders_are_isolated() {
        struct Failing;
        impl Appender for Failing {
            fn append(&self, _level: LogLevel, _line: &str) -> Result<()> {
                Err(LoggerError::other("Simulated failure"))
            }
            fn flush(&self) -> Result<()> {
                Ok(())
            }
            fn name(&self) -> &str {
                "failing"
            }
        }

        struct Panicking(AtomicUsize);
        impl Appender for Panicking {
            fn append(&self, _level: LogLevel, _line: &str) -> Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                panic!("appender exploded");
            }
            fn flush(&self) -> Result<()> {
                Ok(())
            }
            fn name(&self) -> &str {
                "panicking"
            }
        }

        let registry = Registry::new();
        let panicking = Arc::new(Panicking(AtomicUsize::new(0)));
        registry.add_appender("", Arc::new(Failing), Layout::Simple);
        registry.add_appender("", panicking.clone(), Layout::Simple);
        let good = capture(&registry, "", "%m");

        for _ in 0..3 {
            registry.root().warn("still delivered");
        }

        assert_eq!(good.lines.lock().len(), 3);
        assert_eq!(panicking.0.load(Ordering::SeqCst), 3);
        assert_eq!(registry.metrics().dropped_count(), 3);
    }

    #[test]
    fn test_current_logger_follows_context() {
        let registry = Registry::new();
        let other = Registry::new();
        assert!(registry.current_logger().is_root());
        {
            let _a = crate::core::LogContext::push_in(&registry, "a", None);
            let _b = crate::core::LogContext::push_in(&other, "b", None);
            // The innermost frame belongs to `other`, so `registry` looks the path up
            assert_eq!(registry.current_logger(), registry.get_logger("a.b"));
            assert_eq!(other.current_logger(), other.get_logger("a.b"));
            assert!(!registry.ptr_eq(&other));
            assert!(registry.ptr_eq(&registry.clone()));
        }
        assert!(registry.current_logger().is_root());
    }

    #[test]
    fn test_interpolation_failure_falls_back_to_template() {
        let registry = Registry::new();
        let lines = capture(&registry, "", "%m");
        registry
            .root()
            .logf(LogLevel::Error, "value %d and %d", &[FormatArg::from(5)]);

        assert_eq!(*lines.lines.lock(), vec!["value %d and %d"]);
        assert_eq!(registry.metrics().format_errors(), 1);

        // Oversized runtime widths and precisions fail the same way
        let root = registry.root();
        root.logf(
            LogLevel::Info,
            "[%*d]",
            &[FormatArg::from(i64::MAX), FormatArg::from(1)],
        );
        root.logf(
            LogLevel::Info,
            "%.*f",
            &[FormatArg::from(70000), FormatArg::from(1.5)],
        );
        assert_eq!(
            *lines.lines.lock(),
            vec!["value %d and %d", "[%*d]", "%.*f"]
        );
        assert_eq!(registry.metrics().format_errors(), 3);
        assert_eq!(registry.metrics().total_logged(), 3);
    }
}

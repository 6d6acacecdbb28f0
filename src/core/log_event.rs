//! Log event structure and call-site metadata

use super::log_level::LogLevel;
use super::mdc::{self, MdcSnapshot};
use super::ndc;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);
static NEXT_LWP_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
    static LWP_ID: u64 = NEXT_LWP_ID.fetch_add(1, Ordering::Relaxed);
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE
        .try_with(|cache| {
            cache
                .borrow_mut()
                .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
                .clone()
        })
        .unwrap_or_else(|_| format!("{:?}", std::thread::current().id()))
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE
        .try_with(|cache| {
            cache
                .borrow_mut()
                .get_or_insert_with(|| std::thread::current().name().map(String::from))
                .clone()
        })
        .unwrap_or(None)
}

/// Lightweight identifier of the calling thread
///
/// Stable for the lifetime of the thread and never reused within a process.
/// Only meant for diagnostics.
pub fn lwp_id() -> u64 {
    LWP_ID.try_with(|id| *id).unwrap_or(0)
}

/// Pin the reference point used by `%r` (milliseconds since start)
pub(crate) fn mark_process_start() {
    Lazy::force(&PROCESS_START);
}

/// Where a log statement was issued
///
/// Every field is optional; layouts render missing values as placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSite {
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub module_path: Option<&'static str>,
    /// Fully qualified path of the enclosing function
    pub function: Option<&'static str>,
}

impl CallSite {
    pub const fn unknown() -> Self {
        Self {
            file: None,
            line: None,
            module_path: None,
            function: None,
        }
    }

    pub const fn new(
        file: &'static str,
        line: u32,
        module_path: &'static str,
        function: &'static str,
    ) -> Self {
        Self {
            file: Some(file),
            line: Some(line),
            module_path: Some(module_path),
            function: Some(function),
        }
    }

    /// File and line of the caller, via `#[track_caller]`
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: Some(location.file()),
            line: Some(location.line()),
            module_path: None,
            function: None,
        }
    }

    /// Base name of the source file
    pub fn file_name(&self) -> Option<&'static str> {
        self.file
            .map(|file| file.rsplit(['/', '\\']).next().unwrap_or(file))
    }

    /// Short name of the enclosing function, skipping closure frames
    pub fn function_name(&self) -> Option<&'static str> {
        self.function.map(|path| {
            let mut trimmed = path;
            while let Some(stripped) = trimmed.strip_suffix("::{{closure}}") {
                trimmed = stripped;
            }
            trimmed.rsplit("::").next().unwrap_or(trimmed)
        })
    }
}

/// A record that passed its level check, ready to be rendered
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub logger_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds between process start and the event
    pub elapsed_millis: u128,
    pub location: CallSite,
    pub mdc: MdcSnapshot,
    /// Nested diagnostic context of the emitting thread, `None` when empty
    pub ndc: Option<String>,
    pub thread_id: String,
    pub thread_name: Option<String>,
    pub process_id: u32,
}

impl LogEvent {
    pub fn new(level: LogLevel, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            timestamp: Utc::now(),
            elapsed_millis: PROCESS_START.elapsed().as_millis(),
            location: CallSite::unknown(),
            mdc: MdcSnapshot::default(),
            ndc: None,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            process_id: std::process::id(),
        }
    }

    /// Build an event carrying the calling thread's MDC and NDC
    pub fn capture(
        level: LogLevel,
        logger_name: impl Into<String>,
        message: impl Into<String>,
        location: CallSite,
    ) -> Self {
        Self::new(level, logger_name, message)
            .with_location(location)
            .with_mdc(mdc::snapshot())
            .with_ndc(ndc::get())
    }

    pub fn with_location(mut self, location: CallSite) -> Self {
        self.location = location;
        self
    }

    pub fn with_mdc(mut self, mdc: MdcSnapshot) -> Self {
        self.mdc = mdc;
        self
    }

    pub fn with_ndc(mut self, ndc: Option<String>) -> Self {
        self.ndc = ndc;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }
}

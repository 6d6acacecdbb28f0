//! # Hierarchical Logger
//!
//! A hierarchical logging facade with log4j-style configuration.
//!
//! ## Features
//!
//! - **Logger Hierarchy**: dotted names with level inheritance towards the root
//! - **Thread Context**: per-thread component stack selecting the logger for
//!   context-bound logging, with scoped level overrides
//! - **MDC**: per-thread key/value diagnostics with lazy per-thread seeding
//! - **NDC**: per-thread stack of diagnostic messages rendered by `%x`
//! - **Pattern Layouts**: log4j conversion patterns (`%p %c %m%n`, `%X{key}`, ...)
//! - **Configuration**: log4j properties or JSON
//! - **Thread Safe**: lock-free level checks, whole-line appender writes
//!
//! ## Example
//!
//! ```
//! use hierarchical_logger::prelude::*;
//! use hierarchical_logger::{config, info};
//!
//! let installed = config::configure_prop("
//!     log4j.rootLogger=INFO, MEM
//!     log4j.appender.MEM=MemoryAppender
//!     log4j.appender.MEM.layout=PatternLayout
//!     log4j.appender.MEM.layout.ConversionPattern=%p %c %X - %m%n
//! ").unwrap();
//!
//! mdc::put("request", 17);
//! {
//!     let _ctx = LogContext::push("server", None);
//!     info!("handled %d bytes", 512);
//! }
//! mdc::remove("request");
//!
//! let lines = installed.memory_appender("MEM").unwrap().lines();
//! assert_eq!(lines, vec!["INFO server {{request,17}} - handled 512 bytes\n"]);
//! ```

pub mod appenders;
#[cfg(feature = "log-bridge")]
pub mod bridge;
pub mod config;
pub mod core;
pub mod facade;
pub mod macros;

pub use core::{mdc, ndc};

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, ConsoleTarget, FileAppender, MemoryAppender};
    pub use crate::config::LogConfig;
    pub use crate::core::{
        mdc, ndc, Appender, CallSite, ContextGuard, FormatArg, Layout, LogContext, LogEvent,
        LogLevel, Logger, LoggerError, LoggerMetrics, PatternLayout, Registry, Result,
    };
}

pub use appenders::{ConsoleAppender, ConsoleTarget, FileAppender, MemoryAppender};
pub use config::{configure, configure_basic, configure_file, configure_prop, LogConfig};
pub use core::{
    interpolate, lwp_id, Appender, AppenderBinding, CallSite, ContextGuard, ContextStack,
    FormatArg, Layout, LogContext, LogEvent, LogLevel, Logger, LoggerError, LoggerMetrics,
    MdcGuard, MdcSnapshot, MetricsSnapshot, NdcGuard, PatternLayout, Registry, Result,
    TimestampFormat, Wiring, DEFAULT_CONVERSION_PATTERN, DEFAULT_LEVEL, ROOT_LOGGER_NAME,
};
pub use facade::default_logger_name;

//! Core logger types and traits

pub mod appender;
pub mod context;
pub mod error;
pub mod interpolate;
pub mod layout;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod mdc;
pub mod metrics;
pub mod ndc;
pub mod pattern;
pub mod registry;
pub mod timestamp;

pub use appender::Appender;
pub use context::{ContextGuard, ContextStack, LogContext};
pub use error::{LoggerError, Result};
pub use interpolate::{interpolate, FormatArg};
pub use layout::{Layout, DEFAULT_CONVERSION_PATTERN};
pub use log_event::{lwp_id, CallSite, LogEvent};
pub use log_level::LogLevel;
pub use logger::Logger;
pub use mdc::{MdcGuard, MdcSnapshot};
pub use metrics::{LoggerMetrics, MetricsSnapshot};
pub use ndc::NdcGuard;
pub use pattern::PatternLayout;
pub use registry::{AppenderBinding, Registry, Wiring, DEFAULT_LEVEL, ROOT_LOGGER_NAME};
pub use timestamp::TimestampFormat;

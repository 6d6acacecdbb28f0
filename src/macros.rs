//! Logging macros with printf-style interpolation
//!
//! Without a `logger:` argument the macros log to the logger named by the
//! calling thread's context path. Arguments are converted and the template
//! interpolated only when the level is enabled; a call without arguments logs
//! its template verbatim.
//!
//! # Examples
//!
//! ```
//! use hierarchical_logger::prelude::*;
//! use hierarchical_logger::{debug, info};
//!
//! let _ctx = LogContext::push("server", None);
//!
//! // Context-bound: goes to logger "server"
//! info!("Server started");
//!
//! // printf-style arguments
//! let port = 8080;
//! info!("Server listening on port %d", port);
//!
//! // Explicit logger
//! let db = Logger::get("server.db");
//! debug!(logger: db, "pool size %d, timeout %.1fs", 16, 2.5);
//! ```

/// Call site of the macro invocation
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(
            ::core::file!(),
            ::core::line!(),
            ::core::module_path!(),
            $crate::function_name!(),
        )
    };
}

/// Fully qualified path of the enclosing function
///
/// # Examples
///
/// ```
/// use hierarchical_logger::function_name;
///
/// fn handler() -> &'static str {
///     function_name!()
/// }
/// assert!(handler().ends_with("::handler"));
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        match name.strip_suffix("::__here") {
            Some(stripped) => stripped,
            None => name,
        }
    }};
}

/// Log at a given level
///
/// # Examples
///
/// ```
/// # use hierarchical_logger::prelude::*;
/// use hierarchical_logger::log;
/// log!(LogLevel::Info, "Simple message");
/// log!(LogLevel::Error, "Error code: %d", 500);
///
/// let logger = Logger::get("docs.log_macro");
/// log!(logger: logger, LogLevel::Warn, "%s is %.0f%% full", "disk", 93.0);
/// ```
#[macro_export]
macro_rules! log {
    (logger: $logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let __logger: &$crate::Logger = &$logger;
        let __level: $crate::LogLevel = $level;
        if __logger.is_enabled_for(__level) {
            __logger.emit(
                __level,
                $crate::call_site!(),
                ::core::convert::AsRef::<str>::as_ref(&$template),
                &[$($crate::FormatArg::from($arg)),*],
            );
        }
    }};
    ($level:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!(logger: $crate::Logger::current(), $level, $template $(, $arg)*)
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// use hierarchical_logger::trace;
/// trace!("Entering function: calculate()");
/// trace!("Variable value: %d", 42);
/// ```
#[macro_export]
macro_rules! trace {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::LogLevel::Trace, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::LogLevel::Debug, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// use hierarchical_logger::info;
/// info!("Application started");
/// info!("Processing %d items", 100);
/// ```
#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::LogLevel::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::LogLevel::Warn, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// use hierarchical_logger::error;
/// error!("Failed to connect to database");
/// error!("Error code: %d, message: %s", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::LogLevel::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::LogLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::LogLevel::Fatal, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::LogLevel::Fatal, $($arg)+)
    };
}

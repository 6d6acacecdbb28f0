//! Configuration of levels and appenders
//!
//! # Data Flow
//! ```text
//! properties / JSON text
//!     → LogConfig (parse & validate)
//!     → appenders opened, layouts compiled
//!     → Wiring installed with Registry::apply (all or nothing)
//! ```
//!
//! Installing a configuration replaces every explicit level and appender
//! binding in the registry. Loggers themselves are never removed.

pub mod loader;
pub mod properties;
pub mod schema;

pub use loader::{
    configure, configure_basic, configure_file, configure_prop, configure_with, load_config,
    CONFIG_ENV_VAR,
};
pub use schema::{
    AppenderConfig, AppenderKind, BuiltAppender, ConfiguredAppenders, LayoutConfig, LogConfig,
    BASIC_APPENDER_ID,
};

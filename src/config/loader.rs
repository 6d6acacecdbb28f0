//! Configuration loading and installation

use super::schema::{ConfiguredAppenders, LogConfig};
use crate::core::{LoggerError, Registry, Result};
use std::fs;
use std::path::Path;

/// Environment variable naming a configuration file for [`configure`]
pub const CONFIG_ENV_VAR: &str = "HIERARCHICAL_LOGGER_CONFIG";

/// Load a configuration file: JSON for `.json`, properties otherwise
pub fn load_config(path: &Path) -> Result<LogConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        LoggerError::io_operation(
            "reading configuration",
            format!("cannot read '{}'", path.display()),
            e,
        )
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        LogConfig::from_json(&content)
    } else {
        LogConfig::from_properties(&content)
    }
}

/// Configure the global registry from the environment
///
/// When [`CONFIG_ENV_VAR`] names a file it is loaded with
/// [`configure_file`]; otherwise the basic configuration is installed.
pub fn configure() -> Result<ConfiguredAppenders> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => configure_file(Path::new(&path)),
        _ => configure_basic(),
    }
}

/// Root at DEBUG with a console appender using the default pattern
pub fn configure_basic() -> Result<ConfiguredAppenders> {
    configure_with(&LogConfig::basic())
}

/// Configure the global registry from a properties document
pub fn configure_prop(properties: &str) -> Result<ConfiguredAppenders> {
    configure_with(&LogConfig::from_properties(properties)?)
}

pub fn configure_file(path: impl AsRef<Path>) -> Result<ConfiguredAppenders> {
    configure_with(&load_config(path.as_ref())?)
}

/// Replace the global registry's wiring with `config`
pub fn configure_with(config: &LogConfig) -> Result<ConfiguredAppenders> {
    config.apply_to(Registry::global())
}

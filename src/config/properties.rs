//! log4j-style properties configuration
//!
//! Recognized keys, with either the `log4j.` or the `log4cxx.` prefix:
//!
//! ```text
//! log4j.rootLogger=LEVEL[, APPENDER...]
//! log4j.logger.<name>=[LEVEL][, APPENDER...]
//! log4j.appender.<id>=ConsoleAppender|FileAppender|MemoryAppender
//! log4j.appender.<id>.layout=PatternLayout|SimpleLayout
//! log4j.appender.<id>.layout.ConversionPattern=<pattern>
//! log4j.appender.<id>.File=<path>
//! log4j.appender.<id>.Append=true|false
//! log4j.appender.<id>.ImmediateFlush=true|false
//! log4j.appender.<id>.Target=System.out|System.err
//! log4j.appender.<id>.Colors=true|false
//! log4j.appender.<id>.Locking=true|false
//! ```
//!
//! Lines starting with `#` or `!` are comments and a trailing `\` continues a
//! line. Keys without a known prefix are ignored.

use super::schema::{AppenderConfig, AppenderKind, LayoutConfig, LogConfig};
use crate::appenders::ConsoleTarget;
use crate::core::{LogLevel, LoggerError, Result, ROOT_LOGGER_NAME};
use std::collections::BTreeMap;
use std::path::PathBuf;

const PREFIXES: [&str; 2] = ["log4j.", "log4cxx."];

/// Conversion pattern of a `PatternLayout` without `ConversionPattern`
const PATTERN_LAYOUT_DEFAULT: &str = "%m%n";

#[derive(Debug, Default)]
struct PendingAppender {
    class: Option<String>,
    layout: Option<String>,
    conversion_pattern: Option<String>,
    file: Option<String>,
    append: Option<bool>,
    immediate_flush: Option<bool>,
    target: Option<String>,
    colors: Option<bool>,
    locking: Option<bool>,
}

impl LogConfig {
    /// Parse a log4j-style properties document
    ///
    /// # Example
    ///
    /// ```
    /// use hierarchical_logger::config::LogConfig;
    /// use hierarchical_logger::LogLevel;
    ///
    /// let config = LogConfig::from_properties("
    ///     log4j.rootLogger=INFO, CA
    ///     log4j.appender.CA=ConsoleAppender
    ///     log4j.appender.CA.layout=PatternLayout
    ///     log4j.appender.CA.layout.ConversionPattern=%-5p %c - %m%n
    /// ").unwrap();
    ///
    /// assert_eq!(config.root_level, Some(LogLevel::Info));
    /// assert_eq!(config.bindings[""], vec!["CA"]);
    /// ```
    pub fn from_properties(text: &str) -> Result<Self> {
        let mut config = LogConfig::default();
        let mut appenders: BTreeMap<String, PendingAppender> = BTreeMap::new();

        for (key, value) in properties(text) {
            let Some(key) = PREFIXES.iter().find_map(|p| key.strip_prefix(p)) else {
                continue;
            };

            if key == "rootLogger" || key == "rootCategory" {
                let (level, ids) = parse_logger_value(key, &value)?;
                config.root_level = level;
                set_bindings(&mut config, ROOT_LOGGER_NAME, ids);
            } else if let Some(name) = key
                .strip_prefix("logger.")
                .or_else(|| key.strip_prefix("category."))
            {
                let (level, ids) = parse_logger_value(key, &value)?;
                if let Some(level) = level {
                    config.levels.insert(name.to_string(), level);
                }
                set_bindings(&mut config, name, ids);
            } else if let Some(rest) = key.strip_prefix("appender.") {
                let (id, property) = match rest.split_once('.') {
                    Some((id, property)) => (id, Some(property)),
                    None => (rest, None),
                };
                let pending = appenders.entry(id.to_string()).or_default();
                match property {
                    None => pending.class = Some(value),
                    Some(property) => set_appender_property(pending, key, property, value)?,
                }
            }
        }

        for (id, pending) in appenders {
            config.appenders.insert(id.clone(), pending.into_config(&id)?);
        }
        config.validate()?;
        Ok(config)
    }
}

fn set_bindings(config: &mut LogConfig, logger: &str, ids: Vec<String>) {
    if ids.is_empty() {
        config.bindings.remove(logger);
    } else {
        config.bindings.insert(logger.to_string(), ids);
    }
}

/// `LEVEL, A1, A2`; an empty or `INHERITED` level leaves the logger unset
fn parse_logger_value(key: &str, value: &str) -> Result<(Option<LogLevel>, Vec<String>)> {
    let mut parts = value.split(',').map(str::trim);
    let level = match parts.next() {
        None | Some("") => None,
        Some(level)
            if level.eq_ignore_ascii_case("inherited") || level.eq_ignore_ascii_case("null") =>
        {
            None
        }
        Some(level) => Some(
            level
                .parse::<LogLevel>()
                .map_err(|e| LoggerError::config(key, e))?,
        ),
    };
    let ids = parts
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    Ok((level, ids))
}

fn set_appender_property(
    pending: &mut PendingAppender,
    key: &str,
    property: &str,
    value: String,
) -> Result<()> {
    match property.to_ascii_lowercase().as_str() {
        "layout" => pending.layout = Some(value),
        "layout.conversionpattern" => pending.conversion_pattern = Some(value),
        "file" => pending.file = Some(value),
        "append" => pending.append = Some(parse_bool(key, &value)?),
        "immediateflush" => pending.immediate_flush = Some(parse_bool(key, &value)?),
        "target" => pending.target = Some(value),
        "colors" => pending.colors = Some(parse_bool(key, &value)?),
        "locking" => pending.locking = Some(parse_bool(key, &value)?),
        // Accepted for compatibility; there is nothing to configure
        "encoding" | "threshold" | "bufferedio" | "buffersize" => {}
        _ => {
            return Err(LoggerError::config(
                key,
                format!("unknown appender property '{}'", property),
            ))
        }
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(LoggerError::config(
            key,
            format!("expected true or false, got '{}'", other),
        )),
    }
}

/// Last segment of a possibly package-qualified class name
fn class_name(class: &str) -> &str {
    let class = class.trim();
    class.rsplit('.').next().unwrap_or(class)
}

impl PendingAppender {
    fn into_config(self, id: &str) -> Result<AppenderConfig> {
        let component = format!("appender '{}'", id);
        let class = self.class.as_deref().ok_or_else(|| {
            LoggerError::config(component.as_str(), "properties given but no appender class")
        })?;

        let kind = match class_name(class) {
            "ConsoleAppender" => AppenderKind::Console {
                target: match self.target.as_deref() {
                    Some(target) => target.parse::<ConsoleTarget>()?,
                    None => ConsoleTarget::Stdout,
                },
                colors: self.colors.unwrap_or(false),
            },
            "FileAppender" => AppenderKind::File {
                path: PathBuf::from(self.file.as_deref().map(str::trim).ok_or_else(|| {
                    LoggerError::config(component.as_str(), "FileAppender requires a File")
                })?),
                append: self.append.unwrap_or(true),
                immediate_flush: self.immediate_flush.unwrap_or(true),
                process_lock: self.locking.unwrap_or(false),
            },
            "MemoryAppender" => AppenderKind::Memory,
            other => {
                return Err(LoggerError::config(
                    component,
                    format!("unknown appender class '{}'", other),
                ))
            }
        };

        let layout = match (self.layout.as_deref().map(class_name), self.conversion_pattern) {
            (Some("SimpleLayout"), _) => LayoutConfig::Simple,
            (Some("PatternLayout") | None, Some(pattern)) => LayoutConfig::Pattern(pattern),
            (Some("PatternLayout"), None) => {
                LayoutConfig::Pattern(PATTERN_LAYOUT_DEFAULT.to_string())
            }
            (None, None) => LayoutConfig::Default,
            (Some(other), _) => {
                return Err(LoggerError::config(
                    component,
                    format!("unknown layout class '{}'", other),
                ))
            }
        };

        Ok(AppenderConfig { kind, layout })
    }
}

/// Logical `key=value` lines, comments removed and continuations joined
fn properties(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.trim_start();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }

        let line = line.trim_end();
        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }
        pending.push_str(line);

        let logical = std::mem::take(&mut pending);
        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
    }
    if let Some(entry) = split_entry(&pending) {
        entries.push(entry);
    }
    entries
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let index = line.find(['=', ':'])?;
    let key = line[..index].trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), line[index + 1..].trim().to_string()))
}

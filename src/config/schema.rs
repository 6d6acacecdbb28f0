//! Configuration schema definitions
//!
//! A [`LogConfig`] names appenders by id and binds them to loggers. All types
//! derive serde traits so a configuration can be read from JSON as well as
//! from log4j-style properties.

use crate::appenders::{ConsoleAppender, ConsoleTarget, FileAppender, MemoryAppender};
use crate::core::{
    Appender, AppenderBinding, Layout, LogLevel, LoggerError, Registry, Result, Wiring,
    ROOT_LOGGER_NAME,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Id of the appender installed by the basic configuration
pub const BASIC_APPENDER_ID: &str = "console";

/// Root configuration for the logging system
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Threshold of the root logger; `None` keeps the built-in default
    pub root_level: Option<LogLevel>,

    /// Explicit thresholds by logger name
    pub levels: BTreeMap<String, LogLevel>,

    /// Appender definitions by id
    pub appenders: BTreeMap<String, AppenderConfig>,

    /// Appender ids attached to each logger; the root is `""`
    pub bindings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppenderConfig {
    pub kind: AppenderKind,

    #[serde(default)]
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppenderKind {
    Console {
        #[serde(default)]
        target: ConsoleTarget,
        #[serde(default)]
        colors: bool,
    },
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        append: bool,
        #[serde(default = "default_true")]
        immediate_flush: bool,
        #[serde(default)]
        process_lock: bool,
    },
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutConfig {
    /// Conversion pattern
    Pattern(String),
    /// `LEVEL - message`
    Simple,
    /// Default conversion pattern
    #[default]
    Default,
}

fn default_true() -> bool {
    true
}

impl LayoutConfig {
    pub fn build(&self) -> Result<Layout> {
        match self {
            LayoutConfig::Pattern(pattern) => Layout::pattern(pattern),
            LayoutConfig::Simple => Ok(Layout::Simple),
            LayoutConfig::Default => Ok(Layout::default()),
        }
    }
}

impl AppenderKind {
    /// Open the sink; memory sinks are also returned by concrete type
    fn build(&self) -> Result<(Arc<dyn Appender>, Option<Arc<MemoryAppender>>)> {
        match self {
            AppenderKind::Console { target, colors } => Ok((
                Arc::new(
                    ConsoleAppender::new()
                        .with_target(*target)
                        .with_colors(*colors),
                ),
                None,
            )),
            AppenderKind::File {
                path,
                append,
                immediate_flush,
                process_lock,
            } => {
                let appender = FileAppender::open(path.clone(), *append)?
                    .with_immediate_flush(*immediate_flush)
                    .with_process_lock(*process_lock);
                Ok((Arc::new(appender), None))
            }
            AppenderKind::Memory => {
                let memory = Arc::new(MemoryAppender::new());
                Ok((memory.clone(), Some(memory)))
            }
        }
    }
}

/// An opened appender with its compiled layout
pub struct BuiltAppender {
    pub appender: Arc<dyn Appender>,
    pub layout: Layout,
    memory: Option<Arc<MemoryAppender>>,
}

/// Handles to the appenders installed by a configuration
#[derive(Debug, Default, Clone)]
pub struct ConfiguredAppenders {
    memory: HashMap<String, Arc<MemoryAppender>>,
}

impl ConfiguredAppenders {
    /// Memory appender defined under `id`
    pub fn memory_appender(&self, id: &str) -> Option<Arc<MemoryAppender>> {
        self.memory.get(id).cloned()
    }
}

impl LogConfig {
    /// Root at DEBUG writing to stdout with the default pattern
    pub fn basic() -> Self {
        let mut config = LogConfig {
            root_level: Some(LogLevel::Debug),
            ..LogConfig::default()
        };
        config.appenders.insert(
            BASIC_APPENDER_ID.to_string(),
            AppenderConfig {
                kind: AppenderKind::Console {
                    target: ConsoleTarget::Stdout,
                    colors: false,
                },
                layout: LayoutConfig::Default,
            },
        );
        config.bindings.insert(
            ROOT_LOGGER_NAME.to_string(),
            vec![BASIC_APPENDER_ID.to_string()],
        );
        config
    }

    /// Parse a JSON configuration
    ///
    /// # Example
    ///
    /// ```
    /// use hierarchical_logger::config::LogConfig;
    /// use hierarchical_logger::LogLevel;
    ///
    /// let config = LogConfig::from_json(r#"{
    ///     "root_level": "WARN",
    ///     "levels": { "db": "DEBUG" },
    ///     "appenders": {
    ///         "mem": { "kind": { "type": "memory" }, "layout": { "pattern": "%p %c %m%n" } }
    ///     },
    ///     "bindings": { "": ["mem"] }
    /// }"#).unwrap();
    ///
    /// assert_eq!(config.root_level, Some(LogLevel::Warn));
    /// assert_eq!(config.levels["db"], LogLevel::Debug);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every binding refers to a defined appender
    pub fn validate(&self) -> Result<()> {
        for (logger, ids) in &self.bindings {
            for id in ids {
                if !self.appenders.contains_key(id) {
                    let logger = if logger.is_empty() { "root" } else { logger };
                    return Err(LoggerError::config(
                        format!("logger '{}'", logger),
                        format!("appender '{}' is referenced but not defined", id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Open every defined appender and compile its layout
    pub fn build_appenders(&self) -> Result<BTreeMap<String, BuiltAppender>> {
        self.validate()?;
        let mut built = BTreeMap::new();
        for (id, config) in &self.appenders {
            let layout = config.layout.build()?;
            let (appender, memory) = config.kind.build()?;
            built.insert(
                id.clone(),
                BuiltAppender {
                    appender,
                    layout,
                    memory,
                },
            );
        }
        Ok(built)
    }

    /// Level and binding wiring for already built appenders
    pub fn wiring(&self, built: &BTreeMap<String, BuiltAppender>) -> Result<Wiring> {
        let mut bindings = Vec::new();
        for (logger, ids) in &self.bindings {
            for id in ids {
                let appender = built.get(id).ok_or_else(|| {
                    LoggerError::config(
                        format!("logger '{}'", logger),
                        format!("appender '{}' was not built", id),
                    )
                })?;
                bindings.push((
                    logger.clone(),
                    AppenderBinding::new(appender.appender.clone(), appender.layout.clone()),
                ));
            }
        }

        Ok(Wiring {
            root_level: self.root_level,
            levels: self
                .levels
                .iter()
                .map(|(name, level)| (name.clone(), *level))
                .collect(),
            bindings,
        })
    }

    /// Build the appenders and install this configuration in `registry`
    ///
    /// Nothing is installed when any appender fails to open.
    pub fn apply_to(&self, registry: &Registry) -> Result<ConfiguredAppenders> {
        let built = self.build_appenders()?;
        let wiring = self.wiring(&built)?;
        registry.apply(wiring);

        let memory = built
            .into_iter()
            .filter_map(|(id, built)| built.memory.map(|memory| (id, memory)))
            .collect();
        Ok(ConfiguredAppenders { memory })
    }
}

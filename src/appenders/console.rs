//! Console appender implementation

use crate::core::{Appender, LogLevel, LoggerError, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::str::FromStr;

/// Standard stream a [`ConsoleAppender`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsoleTarget {
    #[default]
    #[serde(alias = "System.out", alias = "stdout")]
    Stdout,
    #[serde(alias = "System.err", alias = "stderr")]
    Stderr,
}

impl FromStr for ConsoleTarget {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" | "system.out" => Ok(ConsoleTarget::Stdout),
            "stderr" | "system.err" => Ok(ConsoleTarget::Stderr),
            other => Err(LoggerError::config(
                "ConsoleAppender",
                format!("unknown target '{}'", other),
            )),
        }
    }
}

pub struct ConsoleAppender {
    target: ConsoleTarget,
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            target: ConsoleTarget::Stdout,
            use_colors: false,
        }
    }

    pub fn stderr() -> Self {
        Self::new().with_target(ConsoleTarget::Stderr)
    }

    #[must_use]
    pub fn with_target(mut self, target: ConsoleTarget) -> Self {
        self.target = target;
        self
    }

    /// Color each line by severity
    ///
    /// Only takes effect with the `console` feature.
    ///
    /// # Example
    ///
    /// ```
    /// use hierarchical_logger::appenders::ConsoleAppender;
    ///
    /// let appender = ConsoleAppender::new().with_colors(true);
    /// ```
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    #[cfg(feature = "console")]
    fn decorate(&self, level: LogLevel, line: &str) -> String {
        if !self.use_colors {
            return line.to_string();
        }
        // Keep the escape codes on the same line as the text
        match line.strip_suffix('\n') {
            Some(body) => format!("{}\n", body.color(level.color_code())),
            None => line.color(level.color_code()).to_string(),
        }
    }

    #[cfg(not(feature = "console"))]
    fn decorate(&self, _level: LogLevel, line: &str) -> String {
        line.to_string()
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&self, level: LogLevel, line: &str) -> Result<()> {
        let output = self.decorate(level, line);
        // One write under the stream lock so lines from different threads never interleave
        match self.target {
            ConsoleTarget::Stdout => io::stdout().lock().write_all(output.as_bytes())?,
            ConsoleTarget::Stderr => io::stderr().lock().write_all(output.as_bytes())?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().flush()?,
            ConsoleTarget::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!("System.err".parse::<ConsoleTarget>().unwrap(), ConsoleTarget::Stderr);
        assert_eq!(" stdout ".parse::<ConsoleTarget>().unwrap(), ConsoleTarget::Stdout);
        assert!("printer".parse::<ConsoleTarget>().is_err());
    }

    #[test]
    fn test_plain_lines_are_unchanged() {
        let appender = ConsoleAppender::new();
        assert_eq!(appender.decorate(LogLevel::Error, "line\n"), "line\n");
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_colored_lines_keep_trailing_newline() {
        colored::control::set_override(true);
        let appender = ConsoleAppender::new().with_colors(true);
        let output = appender.decorate(LogLevel::Error, "boom\n");
        assert!(output.ends_with("\u{1b}[0m\n"), "got {:?}", output);
        assert!(output.contains("boom"));
    }

    #[test]
    fn test_append_to_stderr() {
        let appender = ConsoleAppender::stderr();
        appender.append(LogLevel::Info, "console appender test\n").unwrap();
        appender.flush().unwrap();
    }
}

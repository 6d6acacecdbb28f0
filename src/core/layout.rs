//! Layouts turn a log event into the text handed to an appender

use super::error::Result;
use super::log_event::LogEvent;
use super::pattern::PatternLayout;

/// Pattern used by the basic configuration
pub const DEFAULT_CONVERSION_PATTERN: &str = "%r [%t] %p %c %x - %m%n";

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Compiled conversion pattern
    Pattern(PatternLayout),
    /// `LEVEL - message` followed by a newline
    Simple,
}

impl Layout {
    /// Compile a conversion pattern layout
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Layout::Pattern(PatternLayout::compile(pattern)?))
    }

    pub fn format(&self, event: &LogEvent) -> String {
        match self {
            Layout::Pattern(pattern) => pattern.format(event),
            Layout::Simple => format!("{} - {}\n", event.level, event.message),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        match PatternLayout::compile(DEFAULT_CONVERSION_PATTERN) {
            Ok(pattern) => Layout::Pattern(pattern),
            Err(_) => Layout::Simple,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;

    #[test]
    fn test_simple_layout() {
        let event = LogEvent::new(LogLevel::Debug, "component", "This is DEBUG");
        assert_eq!(Layout::Simple.format(&event), "DEBUG - This is DEBUG\n");
    }

    #[test]
    fn test_default_layout() {
        let event = LogEvent::new(LogLevel::Info, "", "This is INFO").with_thread_name("main");
        let line = Layout::default().format(&event);
        assert!(line.ends_with(" [main] INFO root null - This is INFO\n"), "got {:?}", line);

        let event = LogEvent::new(LogLevel::Debug, "component", "This is DEBUG")
            .with_thread_name("main")
            .with_ndc(Some("txn=42".to_string()));
        let line = Layout::default().format(&event);
        assert!(
            line.ends_with(" [main] DEBUG component txn=42 - This is DEBUG\n"),
            "got {:?}",
            line
        );
    }
}

//! In-memory appender

use crate::core::{Appender, LogLevel, Result};
use parking_lot::Mutex;

/// Collects formatted lines in memory
///
/// Useful for tests and for capturing output to inspect programmatically.
///
/// # Example
///
/// ```
/// use hierarchical_logger::appenders::MemoryAppender;
/// use hierarchical_logger::{Appender, LogLevel};
///
/// let appender = MemoryAppender::new();
/// appender.append(LogLevel::Info, "INFO - hello\n").unwrap();
/// assert_eq!(appender.contents(), "INFO - hello\n");
/// ```
#[derive(Debug, Default)]
pub struct MemoryAppender {
    lines: Mutex<Vec<String>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line captured so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Captured lines concatenated in order
    pub fn contents(&self) -> String {
        self.lines.lock().concat()
    }

    /// Drain the captured lines
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl Appender for MemoryAppender {
    fn append(&self, _level: LogLevel, line: &str) -> Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_drains() {
        let appender = MemoryAppender::new();
        appender.append(LogLevel::Debug, "a\n").unwrap();
        appender.append(LogLevel::Debug, "b\n").unwrap();
        assert_eq!(appender.len(), 2);

        assert_eq!(appender.take(), vec!["a\n", "b\n"]);
        assert!(appender.is_empty());
    }
}

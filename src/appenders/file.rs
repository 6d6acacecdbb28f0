//! File appender implementation

use crate::core::{Appender, LogLevel, LoggerError, Result};
#[cfg(feature = "file")]
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends formatted lines to a file
///
/// Lines go through a buffered writer guarded by a mutex. With immediate
/// flush (the default) every line reaches the OS before `append` returns.
/// With `process_lock` each write holds an advisory exclusive lock so several
/// processes can share one file.
pub struct FileAppender {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    immediate_flush: bool,
    process_lock: bool,
}

impl FileAppender {
    /// Open `path` for appending, creating it when missing
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(path, true)
    }

    /// Open `path`, truncating it unless `append` is set
    pub fn open(path: impl Into<PathBuf>, append: bool) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            immediate_flush: true,
            process_lock: false,
        })
    }

    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    /// Hold an exclusive advisory lock on the file for each write
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use hierarchical_logger::appenders::FileAppender;
    ///
    /// let appender = FileAppender::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_process_lock(true);
    /// ```
    #[must_use]
    pub fn with_process_lock(mut self, process_lock: bool) -> Self {
        self.process_lock = process_lock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, writer: &mut BufWriter<File>, line: &str) -> Result<()> {
        writer.write_all(line.as_bytes())?;
        if self.immediate_flush {
            writer.flush()?;
        }
        Ok(())
    }

    #[cfg(feature = "file")]
    fn write_locked(&self, writer: &mut BufWriter<File>, line: &str) -> Result<()> {
        writer
            .get_ref()
            .lock_exclusive()
            .map_err(|_| LoggerError::file_lock(self.path.display().to_string()))?;
        let result = self.write_line(writer, line).and_then(|()| {
            // Buffered bytes must land before the lock is released
            writer.flush().map_err(LoggerError::from)
        });
        let unlocked = writer.get_ref().unlock();
        result?;
        unlocked.map_err(|_| LoggerError::file_lock(self.path.display().to_string()))
    }

    #[cfg(not(feature = "file"))]
    fn write_locked(&self, writer: &mut BufWriter<File>, line: &str) -> Result<()> {
        self.write_line(writer, line)
    }
}

impl Appender for FileAppender {
    fn append(&self, _level: LogLevel, line: &str) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;

        if self.process_lock {
            self.write_locked(writer, line)
        } else {
            self.write_line(writer, line)
        }
        .map_err(|e| LoggerError::file_appender(self.path.display().to_string(), e.to_string()))
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        if let Some(mut writer) = self.writer.get_mut().take() {
            if let Err(e) = writer.flush() {
                eprintln!(
                    "[LOGGER ERROR] Failed to flush '{}' on close: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.log");

        let appender = FileAppender::new(&path).unwrap();
        appender.append(LogLevel::Info, "first\n").unwrap();
        appender.append(LogLevel::Warn, "second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_truncate_and_append_modes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("modes.log");
        fs::write(&path, "old\n").unwrap();

        {
            let appender = FileAppender::open(&path, true).unwrap();
            appender.append(LogLevel::Info, "kept\n").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nkept\n");

        {
            let appender = FileAppender::open(&path, false).unwrap();
            appender.append(LogLevel::Info, "fresh\n").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_buffered_lines_are_flushed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("buffered.log");

        let appender = FileAppender::new(&path)
            .unwrap()
            .with_immediate_flush(false);
        appender.append(LogLevel::Info, "buffered\n").unwrap();
        drop(appender);

        assert_eq!(fs::read_to_string(&path).unwrap(), "buffered\n");
    }

    #[test]
    fn test_process_lock_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("locked.log");

        let appender = FileAppender::new(&path).unwrap().with_process_lock(true);
        appender.append(LogLevel::Error, "locked\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "locked\n");
    }

    #[test]
    fn test_open_failure_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing_dir").join("x.log");
        let err = FileAppender::new(&path).err().unwrap();
        assert!(err.to_string().contains("opening log file"));
    }
}

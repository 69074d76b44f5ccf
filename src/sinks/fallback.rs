//! Synchronous stdout sink
//!
//! Writes each call immediately as one JSON line:
//! `{"level":"INFO","msg":"...","time":"<rfc3339>", ...metadata}`.

use crate::core::{LogEntry, LogLevel, LogSink, Metadata, Result};
use parking_lot::Mutex;
use std::io::{self, Write};

/// Key for the RFC 3339 timestamp in fallback lines
pub const FALLBACK_TIME_KEY: &str = "time";

pub struct FallbackSink<W: Write + Send = io::Stdout> {
    writer: Mutex<W>,
}

impl FallbackSink {
    /// Sink writing to the process stdout
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for FallbackSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> FallbackSink<W> {
    /// Sink writing to any writer, e.g. a buffer in tests
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Serialize and write one line, flushing the writer
    pub fn write_entry(&self, level: LogLevel, message: &str, metadata: Metadata) -> Result<()> {
        let entry = LogEntry::new(level, message, metadata);
        let line = serde_json::to_string(&entry.json_object(level.to_str(), FALLBACK_TIME_KEY))?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn log(&self, level: LogLevel, message: &str, metadata: Metadata) {
        if let Err(e) = self.write_entry(level, message, metadata) {
            tracing::warn!(error = %e, "fallback sink write failed");
        }
    }
}

impl<W: Write + Send> LogSink for FallbackSink<W> {
    fn info(&self, message: &str, metadata: Metadata) {
        self.log(LogLevel::Info, message, metadata);
    }

    fn warn(&self, message: &str, metadata: Metadata) {
        self.log(LogLevel::Warn, message, metadata);
    }

    fn error(&self, message: &str, metadata: Metadata) {
        self.log(LogLevel::Error, message, metadata);
    }
}

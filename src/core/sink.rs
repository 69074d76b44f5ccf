//! Leveled logging capability shared by every sink
//!
//! Callers hold a `dyn LogSink` and never learn whether entries are shipped
//! in the background or written straight to stdout.

use super::metadata::Metadata;
use std::sync::Arc;

pub trait LogSink: Send + Sync {
    fn info(&self, message: &str, metadata: Metadata);
    fn warn(&self, message: &str, metadata: Metadata);
    fn error(&self, message: &str, metadata: Metadata);

    /// Release background resources. Synchronous sinks have nothing to release.
    fn close(&self) {}
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn info(&self, message: &str, metadata: Metadata) {
        (**self).info(message, metadata)
    }

    fn warn(&self, message: &str, metadata: Metadata) {
        (**self).warn(message, metadata)
    }

    fn error(&self, message: &str, metadata: Metadata) {
        (**self).error(message, metadata)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn info(&self, message: &str, metadata: Metadata) {
        (**self).info(message, metadata)
    }

    fn warn(&self, message: &str, metadata: Metadata) {
        (**self).warn(message, metadata)
    }

    fn error(&self, message: &str, metadata: Metadata) {
        (**self).error(message, metadata)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    fn info(&self, message: &str, metadata: Metadata) {
        (**self).info(message, metadata)
    }

    fn warn(&self, message: &str, metadata: Metadata) {
        (**self).warn(message, metadata)
    }

    fn error(&self, message: &str, metadata: Metadata) {
        (**self).error(message, metadata)
    }

    fn close(&self) {
        (**self).close()
    }
}

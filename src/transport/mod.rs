//! Batch delivery
//!
//! The batcher hands each non-empty batch to exactly one [`Transport::push`]
//! call and never retries it, whatever the outcome.

pub mod http;
pub mod payload;

pub use http::HttpTransport;
pub use payload::{PushRequest, PushStream};

use crate::core::{LogEntry, Result};

/// Destination for flushed batches
///
/// # Example
///
/// ```
/// use loki_shipper::{LogEntry, Result, Transport};
///
/// struct CountingTransport(usize);
///
/// impl Transport for CountingTransport {
///     fn push(&mut self, batch: &[LogEntry]) -> Result<()> {
///         self.0 += batch.len();
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "counting"
///     }
/// }
/// ```
pub trait Transport: Send {
    /// Deliver one batch. An `Err` means the batch is lost.
    fn push(&mut self, batch: &[LogEntry]) -> Result<()>;

    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn push(&mut self, batch: &[LogEntry]) -> Result<()> {
        (**self).push(batch)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

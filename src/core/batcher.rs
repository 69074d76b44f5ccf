//! Background batching worker
//!
//! One worker thread per shipper owns the current batch and the transport.
//! It waits on whichever comes first of a new entry, a flush tick or the
//! shutdown signal, and pushes batches strictly one at a time.

use super::{log_entry::LogEntry, metrics::ShipperMetrics};
use crate::transport::Transport;
use crossbeam_channel::{select, tick, Receiver};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Worker state machine: `Running` → `Draining` → `Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    /// Accepting entries; flushing on size or timer
    Running,
    /// Shutdown requested; collecting what is already queued
    Draining,
    /// Final flush done; the worker has returned
    Stopped,
}

/// What caused a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Size,
    Timer,
    Shutdown,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushTrigger::Size => write!(f, "size"),
            FlushTrigger::Timer => write!(f, "timer"),
            FlushTrigger::Shutdown => write!(f, "shutdown"),
        }
    }
}

pub(crate) struct Batcher {
    transport: Box<dyn Transport>,
    batch: Vec<LogEntry>,
    max_batch_size: usize,
    flush_interval: Duration,
    metrics: Arc<ShipperMetrics>,
    state: BatcherState,
}

impl Batcher {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        max_batch_size: usize,
        flush_interval: Duration,
        metrics: Arc<ShipperMetrics>,
    ) -> Self {
        Self {
            transport,
            batch: Vec::with_capacity(max_batch_size.min(1024)),
            max_batch_size,
            flush_interval,
            metrics,
            state: BatcherState::Running,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> BatcherState {
        self.state
    }

    /// Run until the shutdown signal fires or every sender is gone
    ///
    /// `shutdown` is signalled by dropping its sender. The flush timer ticks
    /// at a fixed rate and is not reset by size-triggered flushes.
    pub(crate) fn run(mut self, entries: Receiver<LogEntry>, shutdown: Receiver<()>) -> BatcherState {
        let ticker = tick(self.flush_interval);
        tracing::debug!(
            transport = self.transport.name(),
            max_batch_size = self.max_batch_size,
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            "shipper worker started"
        );

        while self.state == BatcherState::Running {
            select! {
                recv(shutdown) -> _ => self.state = BatcherState::Draining,
                recv(entries) -> msg => match msg {
                    Ok(entry) => self.append(entry),
                    Err(_) => self.state = BatcherState::Draining,
                },
                recv(ticker) -> _ => self.flush(FlushTrigger::Timer),
            }
        }

        self.drain(&entries);
        self.state = BatcherState::Stopped;
        tracing::debug!(transport = self.transport.name(), "shipper worker stopped");
        self.state
    }

    pub(crate) fn append(&mut self, entry: LogEntry) {
        self.batch.push(entry);
        if self.batch.len() >= self.max_batch_size {
            self.flush(FlushTrigger::Size);
        }
    }

    /// Move everything still queued into the batch, then flush once more
    ///
    /// The size threshold keeps applying while draining, so a deep queue can
    /// produce several full pushes before the final one.
    pub(crate) fn drain(&mut self, entries: &Receiver<LogEntry>) {
        self.state = BatcherState::Draining;
        for entry in entries.try_iter() {
            self.append(entry);
        }
        self.flush(FlushTrigger::Shutdown);
    }

    /// Push the current batch once, then clear it whatever the outcome
    ///
    /// An empty batch is a no-op and never reaches the transport.
    pub(crate) fn flush(&mut self, trigger: FlushTrigger) {
        if self.batch.is_empty() {
            return;
        }

        let count = self.batch.len();
        let transport = &mut self.transport;
        let batch = &self.batch;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| transport.push(batch)));

        match result {
            Ok(Ok(())) => {
                self.metrics.record_push_succeeded(count);
                tracing::trace!(entries = count, %trigger, "batch pushed");
            }
            Ok(Err(e)) => {
                self.metrics.record_push_failed(count);
                tracing::warn!(
                    transport = self.transport.name(),
                    entries = count,
                    %trigger,
                    error = %e,
                    "log push failed, batch dropped"
                );
            }
            Err(panic_info) => {
                self.metrics.record_push_failed(count);
                tracing::error!(
                    transport = self.transport.name(),
                    entries = count,
                    %trigger,
                    panic = %panic_message(panic_info.as_ref()),
                    "transport panicked, batch dropped"
                );
            }
        }

        self.batch.clear();
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

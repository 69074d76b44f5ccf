//! Non-blocking log shipper
//!
//! [`Shipper`] is the caller-facing half: `info`/`warn`/`error` build an entry
//! and try to put it on a fixed-capacity queue. A full queue drops the entry;
//! a closed shipper ignores it. Neither case blocks or reports an error.

use super::{
    batcher::Batcher,
    config::{ClientConfig, Compression, Credentials},
    error::{Result, ShipperError},
    log_entry::LogEntry,
    log_level::LogLevel,
    metadata::Metadata,
    metrics::{OverflowCallback, ShipperMetrics},
    sink::LogSink,
};
use crate::transport::{HttpTransport, Transport};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default wait used when a shipper is dropped without an explicit close
///
/// Longer than the default request timeout so the final push can finish.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

const RUNNING: u8 = 0;
const CLOSING: u8 = 1;
const STOPPED: u8 = 2;

/// Shipper lifecycle as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Worker is running and entries are accepted
    Running,
    /// Close requested; entries are refused while the worker finishes
    Closing,
    /// Worker has exited
    Stopped,
}

pub struct Shipper {
    sender: Sender<LogEntry>,
    capacity: usize,
    lifecycle: AtomicU8,
    /// Dropping this sender is the close signal
    shutdown: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    /// Metrics for observability (overflow drops, failed pushes, etc.)
    metrics: Arc<ShipperMetrics>,
    on_overflow: Option<OverflowCallback>,
    config: ClientConfig,
}

impl Shipper {
    /// Validate `config` and start a shipper pushing over HTTP
    ///
    /// # Errors
    ///
    /// Returns [`ShipperError::InvalidConfiguration`] for an empty or invalid
    /// endpoint and for zero batch size, interval or capacity.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ShipperBuilder::from_config(config).build()
    }

    /// Create a builder for Shipper
    ///
    /// # Example
    /// ```no_run
    /// use loki_shipper::Shipper;
    /// use std::time::Duration;
    ///
    /// let shipper = Shipper::builder()
    ///     .endpoint("http://localhost:3100/loki/api/v1/push")
    ///     .label("app", "inventory")
    ///     .max_batch_size(500)
    ///     .flush_interval(Duration::from_secs(2))
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ShipperBuilder {
        ShipperBuilder::new()
    }

    fn start(
        config: ClientConfig,
        transport: Box<dyn Transport>,
        on_overflow: Option<OverflowCallback>,
    ) -> Result<Self> {
        let (sender, receiver) = bounded(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let metrics = Arc::new(ShipperMetrics::new());

        let batcher = Batcher::new(
            transport,
            config.max_batch_size,
            config.flush_interval,
            Arc::clone(&metrics),
        );
        let handle = thread::Builder::new()
            .name("loki-shipper".to_string())
            .spawn(move || {
                batcher.run(receiver, shutdown_rx);
            })
            .map_err(ShipperError::WorkerSpawn)?;

        Ok(Self {
            sender,
            capacity: config.queue_capacity,
            lifecycle: AtomicU8::new(RUNNING),
            shutdown: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(handle)),
            metrics,
            on_overflow,
            config,
        })
    }

    /// Queue an entry without blocking
    ///
    /// Dropped silently when the queue is full or the shipper is closing.
    pub fn enqueue(&self, entry: LogEntry) {
        if self.lifecycle.load(Ordering::Acquire) != RUNNING {
            self.metrics.record_rejected_closed();
            return;
        }

        match self.sender.try_send(entry) {
            Ok(()) => {
                self.metrics.record_enqueued();
            }
            Err(TrySendError::Full(_)) => self.alert_and_drop(),
            Err(TrySendError::Disconnected(_)) => {
                self.metrics.record_rejected_closed();
            }
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, metadata: Metadata) {
        if self.lifecycle.load(Ordering::Acquire) != RUNNING {
            self.metrics.record_rejected_closed();
            return;
        }
        self.enqueue(LogEntry::new(level, message, metadata));
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>, metadata: Metadata) {
        self.log(LogLevel::Info, message, metadata);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>, metadata: Metadata) {
        self.log(LogLevel::Warn, message, metadata);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>, metadata: Metadata) {
        self.log(LogLevel::Error, message, metadata);
    }

    /// Count the drop and alert on the first one and every 1000th after it
    fn alert_and_drop(&self) {
        let dropped_count = self.metrics.record_overflow();

        if dropped_count == 0 || (dropped_count + 1) % 1000 == 0 {
            tracing::warn!(
                dropped = dropped_count + 1,
                capacity = self.capacity,
                "log queue full, entries dropped"
            );
            if let Some(ref callback) = self.on_overflow {
                callback(dropped_count + 1);
            }
        }
    }

    /// Stop accepting entries and signal the worker; true for the first caller
    fn begin_close(&self) -> bool {
        let first = self
            .lifecycle
            .compare_exchange(RUNNING, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            drop(self.shutdown.lock().take());
        }
        first
    }

    /// Flush what is buffered and wait for the worker to exit
    ///
    /// Safe to call repeatedly and from several threads; only the first call
    /// triggers the final flush, later ones wait for it and return. The wait
    /// is bounded by the worker's single push attempt and its request timeout.
    pub fn close(&self) {
        self.begin_close();

        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::error!("shipper worker panicked during shutdown");
            }
        }
        self.lifecycle.store(STOPPED, Ordering::Release);
    }

    /// Like [`close`](Self::close) but gives up after `timeout`
    ///
    /// Returns `true` if the worker exited within the timeout. On `false` the
    /// worker keeps running its final push in the background and a later
    /// `close` can still wait for it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use loki_shipper::{Metadata, Shipper};
    /// use std::time::Duration;
    ///
    /// let shipper = Shipper::builder()
    ///     .endpoint("http://localhost:3100/loki/api/v1/push")
    ///     .build()
    ///     .unwrap();
    /// shipper.info("Important message", Metadata::new());
    ///
    /// if !shipper.shutdown(Duration::from_secs(2)) {
    ///     eprintln!("Warning: shipper shutdown timed out");
    /// }
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.begin_close();

        let start = Instant::now();
        let Some(mut worker) = self.worker.try_lock_for(timeout) else {
            return false;
        };

        if let Some(handle) = worker.take() {
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        tracing::error!("shipper worker panicked during shutdown");
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "shipper worker did not finish within timeout, final push may be lost"
                    );
                    *worker = Some(handle);
                    return false;
                }

                // Small sleep to avoid busy-waiting
                thread::sleep(Duration::from_millis(5));
            }
        }

        self.lifecycle.store(STOPPED, Ordering::Release);
        true
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.lifecycle.load(Ordering::Acquire) {
            RUNNING => Lifecycle::Running,
            CLOSING => Lifecycle::Closing,
            _ => Lifecycle::Stopped,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle() != Lifecycle::Running
    }

    /// Get the shipper metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```no_run
    /// use loki_shipper::{ClientConfig, Shipper};
    ///
    /// let shipper = Shipper::new(ClientConfig::new("http://localhost:3100/loki/api/v1/push")).unwrap();
    ///
    /// let metrics = shipper.metrics();
    /// println!("Dropped on overflow: {}", metrics.dropped_overflow());
    /// println!("Failed pushes: {}", metrics.pushes_failed());
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &ShipperMetrics {
        &self.metrics
    }

    /// Number of entries dropped because the queue was full
    pub fn dropped_count(&self) -> u64 {
        self.metrics.dropped_overflow()
    }

    /// Fixed queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.sender.len()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl LogSink for Shipper {
    fn info(&self, message: &str, metadata: Metadata) {
        self.log(LogLevel::Info, message, metadata);
    }

    fn warn(&self, message: &str, metadata: Metadata) {
        self.log(LogLevel::Warn, message, metadata);
    }

    fn error(&self, message: &str, metadata: Metadata) {
        self.log(LogLevel::Error, message, metadata);
    }

    fn close(&self) {
        Shipper::close(self);
    }
}

impl Drop for Shipper {
    fn drop(&mut self) {
        if !self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT) {
            tracing::warn!("shipper dropped before its worker finished");
        }

        let lost = self.metrics.dropped_overflow() + self.metrics.entries_discarded();
        if lost > 0 {
            tracing::warn!(
                dropped_overflow = self.metrics.dropped_overflow(),
                discarded = self.metrics.entries_discarded(),
                drop_rate = self.metrics.drop_rate(),
                "shipper shutting down with lost entries"
            );
        }
    }
}

/// Builder for constructing Shipper with a fluent API
///
/// # Example
/// ```no_run
/// use loki_shipper::{Shipper, ShipperBuilder};
/// use std::sync::Arc;
///
/// let shipper = ShipperBuilder::new()
///     .endpoint("https://logs.example.com/loki/api/v1/push")
///     .basic_auth("123456:glc_token")
///     .tenant("team-a")
///     .label("app", "inventory")
///     .label("env", "prod")
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} log entries dropped", count);
///     }))
///     .build()
///     .expect("valid configuration");
/// ```
pub struct ShipperBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
    on_overflow: Option<OverflowCallback>,
}

impl ShipperBuilder {
    /// Create a new builder with default values and no endpoint
    pub fn new() -> Self {
        Self::from_config(ClientConfig::new(""))
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            on_overflow: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    /// Set credentials from a `user:secret` string
    ///
    /// A string without `:` leaves basic auth disabled.
    #[must_use = "builder methods return a new value"]
    pub fn basic_auth(mut self, raw: &str) -> Self {
        self.config.credentials = Credentials::parse(raw);
        if self.config.credentials.is_none() {
            tracing::warn!("credentials have no ':' separator, basic auth disabled");
        }
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.config.tenant_id = Some(tenant_id.into());
        self
    }

    /// Add one static label
    #[must_use = "builder methods return a new value"]
    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.static_labels.insert(name.into(), value.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set the fixed queue capacity
    ///
    /// Entries arriving while the queue is full are dropped.
    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// The callback is invoked on the first overflow drop and every 1000th
    /// after it, with the total count of dropped entries.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Replace the HTTP transport
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Validate the configuration and start the worker
    pub fn build(self) -> Result<Shipper> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new(&self.config)),
        };
        Shipper::start(self.config, transport, self.on_overflow)
    }
}

impl Default for ShipperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Result;

    struct NullTransport;

    impl Transport for NullTransport {
        fn push(&mut self, _batch: &[LogEntry]) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "null"
        }
    }

    fn null_shipper() -> Shipper {
        Shipper::builder()
            .endpoint("http://127.0.0.1:3100/loki/api/v1/push")
            .transport(NullTransport)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_endpoint() {
        let result = Shipper::builder().transport(NullTransport).build();
        assert!(matches!(
            result,
            Err(ShipperError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_new_rejects_empty_endpoint() {
        assert!(Shipper::new(ClientConfig::new("")).is_err());
    }

    #[test]
    fn test_builder_rejects_zero_batch_size() {
        let result = Shipper::builder()
            .endpoint("http://127.0.0.1:3100")
            .max_batch_size(0)
            .transport(NullTransport)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_sets_config() {
        let shipper = Shipper::builder()
            .endpoint("http://127.0.0.1:3100/loki/api/v1/push")
            .basic_auth("user:secret")
            .tenant("tenant-1")
            .label("app", "api")
            .queue_capacity(8)
            .compression(Compression::None)
            .transport(NullTransport)
            .build()
            .unwrap();

        let config = shipper.config();
        assert_eq!(config.credentials, Some(Credentials::new("user", "secret")));
        assert_eq!(config.tenant_id.as_deref(), Some("tenant-1"));
        assert_eq!(config.static_labels["app"], "api");
        assert_eq!(config.compression, Compression::None);
        assert_eq!(shipper.capacity(), 8);
    }

    #[test]
    fn test_basic_auth_without_separator_is_ignored() {
        let builder = ShipperBuilder::new().basic_auth("just-a-token");
        assert!(builder.config.credentials.is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let shipper = null_shipper();
        assert_eq!(shipper.lifecycle(), Lifecycle::Running);

        shipper.close();
        assert_eq!(shipper.lifecycle(), Lifecycle::Stopped);
        assert!(shipper.is_closed());
    }

    #[test]
    fn test_enqueue_after_close_is_noop() {
        let shipper = null_shipper();
        shipper.close();

        shipper.info("ignored", Metadata::new());
        assert_eq!(shipper.metrics().enqueued(), 0);
        assert_eq!(shipper.metrics().rejected_closed(), 1);
        assert_eq!(shipper.queued(), 0);
    }

    #[test]
    fn test_close_twice_returns() {
        let shipper = null_shipper();
        shipper.close();
        shipper.close();
        assert!(shipper.shutdown(Duration::from_millis(10)));
    }

    #[test]
    fn test_shutdown_with_timeout() {
        let shipper = null_shipper();
        shipper.info("message", Metadata::new());
        assert!(shipper.shutdown(Duration::from_secs(5)));
        assert_eq!(shipper.lifecycle(), Lifecycle::Stopped);
        assert_eq!(shipper.metrics().entries_shipped(), 1);
    }

    #[test]
    fn test_usable_as_log_sink() {
        let sink: Box<dyn LogSink> = Box::new(null_shipper());
        sink.info("a", Metadata::new());
        sink.warn("b", Metadata::new());
        sink.error("c", Metadata::new());
        sink.close();
    }
}

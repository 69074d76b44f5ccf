//! Core shipper types and traits

pub mod batcher;
pub mod config;
pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod metadata;
pub mod metrics;
pub mod shipper;
pub mod sink;

pub use batcher::{BatcherState, FlushTrigger};
pub use config::{ClientConfig, Compression, Credentials};
pub use error::{Result, ShipperError};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use metadata::Metadata;
pub use metrics::{OverflowCallback, ShipperMetrics};
pub use shipper::{Lifecycle, Shipper, ShipperBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use sink::LogSink;

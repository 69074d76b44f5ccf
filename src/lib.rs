//! # Loki Shipper
//!
//! A non-blocking client that batches structured log lines in the background
//! and pushes them to a Loki-compatible endpoint.
//!
//! ## Features
//!
//! - **Never blocks callers**: entries go onto a fixed-capacity queue and are
//!   dropped when it is full
//! - **Batching**: one push per `max_batch_size` entries or per `flush_interval`,
//!   whichever comes first
//! - **Compact pushes**: gzip-compressed JSON under a fixed set of static labels
//! - **Swappable sinks**: callers log through [`LogSink`]; the stdout
//!   [`FallbackSink`] takes over when no shipper can be built
//!
//! ```no_run
//! use loki_shipper::prelude::*;
//!
//! let sink = connect_or_fallback(ClientConfig::from_env());
//! sink.info("http_request", Metadata::new().with_field("status", 200));
//! sink.close();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;
pub mod transport;

pub mod prelude {
    pub use crate::core::{
        ClientConfig, Compression, Credentials, Lifecycle, LogEntry, LogLevel, LogSink, Metadata,
        OverflowCallback, Result, Shipper, ShipperBuilder, ShipperError, ShipperMetrics,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::sinks::{connect_or_fallback, sink_from_env, FallbackSink};
    pub use crate::transport::{HttpTransport, Transport};
}

pub use crate::core::{
    ClientConfig, Compression, Credentials, Lifecycle, LogEntry, LogLevel, LogSink, Metadata,
    OverflowCallback, Result, Shipper, ShipperBuilder, ShipperError, ShipperMetrics,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::sinks::{connect_or_fallback, sink_from_env, FallbackSink};
pub use crate::transport::{HttpTransport, PushRequest, Transport};

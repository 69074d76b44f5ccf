//! Logging macros for ergonomic message formatting and metadata.
//!
//! Every leveled macro works on anything implementing
//! [`LogSink`](crate::LogSink): a [`Shipper`](crate::Shipper), a
//! [`FallbackSink`](crate::FallbackSink) or a `Box<dyn LogSink>`.
//!
//! # Examples
//!
//! ```
//! use loki_shipper::prelude::*;
//! use loki_shipper::{info, metadata};
//!
//! let sink = FallbackSink::with_writer(Vec::new());
//!
//! // Basic logging
//! info!(sink, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(sink, "Server listening on port {}", port);
//!
//! // With metadata
//! info!(sink, { "method" => "GET", "status" => 200 }, "http_request");
//! ```

/// Build a [`Metadata`](crate::Metadata) map.
///
/// # Examples
///
/// ```
/// use loki_shipper::metadata;
///
/// let empty = metadata!();
/// assert!(empty.is_empty());
///
/// let meta = metadata! { "route" => "/items", "status" => 201, "cached" => false };
/// assert_eq!(meta.len(), 3);
/// ```
#[macro_export]
macro_rules! metadata {
    () => {
        $crate::Metadata::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut metadata = $crate::Metadata::new();
        $(metadata.insert($key, $value);)+
        metadata
    }};
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use loki_shipper::prelude::*;
/// # let sink = FallbackSink::with_writer(Vec::new());
/// use loki_shipper::log;
/// log!(sink, LogLevel::Info, "Simple message");
/// log!(sink, LogLevel::Error, { "code" => 500 }, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($sink:expr, $level:expr, { $($key:expr => $value:expr),* $(,)? }, $($arg:tt)+) => {{
        let metadata = {
            #[allow(unused_mut)]
            let mut metadata = $crate::Metadata::new();
            $(metadata.insert($key, $value);)*
            metadata
        };
        let message = format!($($arg)+);
        match $level {
            $crate::LogLevel::Info => $crate::LogSink::info(&$sink, &message, metadata),
            $crate::LogLevel::Warn => $crate::LogSink::warn(&$sink, &message, metadata),
            $crate::LogLevel::Error => $crate::LogSink::error(&$sink, &message, metadata),
        }
    }};
    ($sink:expr, $level:expr, $($arg:tt)+) => {
        $crate::log!($sink, $level, {}, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use loki_shipper::prelude::*;
/// # let sink = FallbackSink::with_writer(Vec::new());
/// use loki_shipper::info;
/// info!(sink, "Application started");
/// info!(sink, { "user_id" => 42 }, "User {} logged in", "alice");
/// ```
#[macro_export]
macro_rules! info {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log!($sink, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use loki_shipper::prelude::*;
/// # let sink = FallbackSink::with_writer(Vec::new());
/// use loki_shipper::warn;
/// warn!(sink, "Low disk space: {}% remaining", 10);
/// ```
#[macro_export]
macro_rules! warn {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log!($sink, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use loki_shipper::prelude::*;
/// # let sink = FallbackSink::with_writer(Vec::new());
/// use loki_shipper::error;
/// error!(sink, { "error" => "connection refused" }, "Failed to connect to database");
/// ```
#[macro_export]
macro_rules! error {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log!($sink, $crate::LogLevel::Error, $($arg)+)
    };
}

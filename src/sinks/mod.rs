//! Sink implementations and selection

pub mod fallback;

pub use fallback::FallbackSink;

use crate::core::{ClientConfig, LogSink, Shipper};

/// Start a shipper for `config`, or fall back to stdout if it cannot be built
///
/// # Example
///
/// ```
/// use loki_shipper::{connect_or_fallback, ClientConfig, Metadata};
///
/// // An empty endpoint cannot be shipped to, so this yields the stdout sink.
/// let sink = connect_or_fallback(ClientConfig::new(""));
/// sink.info("http_request", Metadata::new().with_field("status", 200));
/// sink.close();
/// ```
pub fn connect_or_fallback(config: ClientConfig) -> Box<dyn LogSink> {
    match Shipper::new(config) {
        Ok(shipper) => {
            tracing::info!(endpoint = %shipper.config().endpoint, "loki: shipping enabled");
            Box::new(shipper)
        }
        Err(e) => {
            tracing::warn!(error = %e, "loki: disabled, logging to stdout");
            Box::new(FallbackSink::new())
        }
    }
}

/// [`connect_or_fallback`] with [`ClientConfig::from_env`]
pub fn sink_from_env() -> Box<dyn LogSink> {
    connect_or_fallback(ClientConfig::from_env())
}

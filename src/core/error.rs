//! Error types for the shipper

pub type Result<T> = std::result::Result<T, ShipperError>;

#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Queue full; the entry was dropped
    #[error("Log queue full: {capacity} entries buffered")]
    QueueFull { capacity: usize },

    /// Shipper already closed
    #[error("Shipper already stopped")]
    ShipperStopped,

    /// The push endpoint answered with a non-2xx status
    #[error("Push rejected with status {status}: {body}")]
    PushRejected { status: u16, body: String },

    /// Connection, TLS or timeout failure before a status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The background worker thread could not be spawned
    #[error("Failed to spawn shipper worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ShipperError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        ShipperError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a push rejection error
    pub fn push_rejected(status: u16, body: impl Into<String>) -> Self {
        ShipperError::PushRejected {
            status,
            body: body.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        ShipperError::Transport(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ShipperError::Other(msg.into())
    }

    /// Whether this error happened while delivering a batch
    pub fn is_delivery_failure(&self) -> bool {
        matches!(
            self,
            ShipperError::PushRejected { .. } | ShipperError::Transport(_) | ShipperError::Io(_)
        )
    }
}

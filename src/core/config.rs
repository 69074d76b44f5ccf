//! Client configuration
//!
//! [`ClientConfig`] is immutable once a [`Shipper`](crate::Shipper) is built
//! from it. It can be filled in directly, through
//! [`ShipperBuilder`](crate::ShipperBuilder), or from the process environment.

use super::error::{Result, ShipperError};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Push endpoint used when `LOKI_URL` is not set
pub const DEFAULT_ENDPOINT: &str = "http://loki.default.svc.cluster.local:3100/loki/api/v1/push";
/// Entries per push before a size-triggered flush
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;
/// Time between timer-triggered flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
/// Fixed queue capacity between callers and the worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;
/// Upper bound for one push, end to end
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound for establishing the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_URL: &str = "LOKI_URL";
pub const ENV_BASIC_AUTH: &str = "LOKI_BASIC_AUTH";
pub const ENV_TENANT: &str = "LOKI_TENANT";
pub const ENV_APP_NAME: &str = "APP_NAME";
pub const ENV_APP_ENV: &str = "APP_ENV";

/// Basic-auth credentials for the push endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Parse a `user:secret` string, splitting on the first `:`
    ///
    /// Returns `None` when the string has no `:` at all.
    ///
    /// ```
    /// use loki_shipper::Credentials;
    ///
    /// let creds = Credentials::parse("123456:glc_abc:def").unwrap();
    /// assert_eq!(creds.username, "123456");
    /// assert_eq!(creds.secret, "glc_abc:def");
    /// assert!(Credentials::parse("no-separator").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        raw.split_once(':')
            .map(|(username, secret)| Self::new(username, secret))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body compression applied before a push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// gzip body with `Content-Encoding: gzip`
    #[default]
    Gzip,
    /// Plain JSON body
    None,
}

impl Compression {
    /// Value for the `Content-Encoding` header, if any
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Compression::Gzip => Some("gzip"),
            Compression::None => None,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Gzip => write!(f, "gzip"),
            Compression::None => write!(f, "none"),
        }
    }
}

/// Everything needed to construct a shipper
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Push endpoint URL (required)
    pub endpoint: String,
    /// Optional basic-auth credentials
    pub credentials: Option<Credentials>,
    /// Optional tenant, sent as `X-Scope-OrgID`
    pub tenant_id: Option<String>,
    /// Labels attached to every push
    pub static_labels: BTreeMap<String, String>,
    pub max_batch_size: usize,
    pub flush_interval: Duration,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub compression: Compression,
}

impl ClientConfig {
    /// Config with defaults for everything but the endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials: None,
            tenant_id: None,
            static_labels: BTreeMap::new(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            compression: Compression::default(),
        }
    }

    /// Read the configuration from the process environment
    ///
    /// | Variable | Meaning | Default |
    /// |---|---|---|
    /// | `LOKI_URL` | push endpoint | [`DEFAULT_ENDPOINT`] |
    /// | `LOKI_BASIC_AUTH` | `user:secret` | none |
    /// | `LOKI_TENANT` | `X-Scope-OrgID` | none |
    /// | `APP_NAME` | `app` label | `go-api` |
    /// | `APP_ENV` | `env` label | `dev` |
    ///
    /// Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mut config = Self::new(get(ENV_URL).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()));
        config.credentials = get(ENV_BASIC_AUTH).and_then(|raw| {
            let parsed = Credentials::parse(&raw);
            if parsed.is_none() {
                tracing::warn!(
                    variable = ENV_BASIC_AUTH,
                    "credentials have no ':' separator, basic auth disabled"
                );
            }
            parsed
        });
        config.tenant_id = get(ENV_TENANT);
        config.static_labels.insert(
            "app".to_string(),
            get(ENV_APP_NAME).unwrap_or_else(|| "go-api".to_string()),
        );
        config.static_labels.insert(
            "env".to_string(),
            get(ENV_APP_ENV).unwrap_or_else(|| "dev".to_string()),
        );
        config
    }

    /// Check every construction-time constraint
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ShipperError::config("endpoint", "push URL is empty"));
        }
        let url = Url::parse(endpoint)
            .map_err(|e| ShipperError::config("endpoint", format!("invalid URL '{}': {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ShipperError::config(
                "endpoint",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(ShipperError::config("max_batch_size", "must be greater than zero"));
        }
        if self.flush_interval.is_zero() {
            return Err(ShipperError::config("flush_interval", "must be greater than zero"));
        }
        if self.queue_capacity == 0 {
            return Err(ShipperError::config("queue_capacity", "must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(ShipperError::config("request_timeout", "must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ShipperError::config("connect_timeout", "must be greater than zero"));
        }
        if self.static_labels.keys().any(|key| key.is_empty()) {
            return Err(ShipperError::config("static_labels", "label names must not be empty"));
        }
        Ok(())
    }
}

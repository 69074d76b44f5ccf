//! HTTP push transport
//!
//! One blocking POST per batch over a pooled `ureq::Agent`. The agent carries
//! the connect and request timeouts, which bound how long a flush (including
//! the final flush on close) can take. Failures are never retried here.

use super::payload::PushRequest;
use super::Transport;
use crate::core::{ClientConfig, Compression, Credentials, LogEntry, Result, ShipperError};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use std::collections::BTreeMap;
use ureq::{Agent, AgentBuilder};

/// Longest response body kept in a [`ShipperError::PushRejected`]
const MAX_ERROR_BODY: usize = 512;

/// Transport that POSTs each batch to a Loki-compatible push endpoint
///
/// # Example
///
/// ```no_run
/// use loki_shipper::{ClientConfig, HttpTransport, Transport};
///
/// let config = ClientConfig::new("http://localhost:3100/loki/api/v1/push");
/// let mut transport = HttpTransport::new(&config);
/// transport.push(&[]).unwrap();
/// ```
pub struct HttpTransport {
    agent: Agent,
    endpoint: String,
    labels: BTreeMap<String, String>,
    tenant_id: Option<String>,
    authorization: Option<String>,
    compression: Compression,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.request_timeout)
            .build();

        Self {
            agent,
            endpoint: config.endpoint.trim().to_string(),
            labels: config.static_labels.clone(),
            tenant_id: config.tenant_id.clone().filter(|t| !t.is_empty()),
            authorization: config.credentials.as_ref().map(basic_auth_header),
            compression: config.compression,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send(&self, body: &[u8]) -> Result<()> {
        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json");
        if let Some(encoding) = self.compression.content_encoding() {
            request = request.set("Content-Encoding", encoding);
        }
        if let Some(ref tenant) = self.tenant_id {
            request = request.set("X-Scope-OrgID", tenant);
        }
        if let Some(ref authorization) = self.authorization {
            request = request.set("Authorization", authorization);
        }

        match request.send_bytes(body) {
            Ok(response) if (200..300).contains(&response.status()) => Ok(()),
            Ok(response) => {
                let status = response.status();
                Err(ShipperError::push_rejected(status, read_error_body(response)))
            }
            Err(ureq::Error::Status(status, response)) => {
                Err(ShipperError::push_rejected(status, read_error_body(response)))
            }
            Err(ureq::Error::Transport(err)) => Err(ShipperError::transport(err.to_string())),
        }
    }
}

impl Transport for HttpTransport {
    fn push(&mut self, batch: &[LogEntry]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let body = PushRequest::from_batch(&self.labels, batch)?.encode(self.compression)?;
        self.send(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// `Authorization` header value for basic auth
pub fn basic_auth_header(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.username, credentials.secret);
    format!("Basic {}", BASE64_STANDARD.encode(raw.as_bytes()))
}

fn read_error_body(response: ureq::Response) -> String {
    let mut body = response.into_string().unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body.trim().to_string()
}

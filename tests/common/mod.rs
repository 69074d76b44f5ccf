//! Shared helpers for integration tests
#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use loki_shipper::{LogEntry, Result, ShipperError, Transport};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const NO_PUSH_ENDPOINT: &str = "http://127.0.0.1:3100/loki/api/v1/push";

/// Transport that forwards every pushed batch to a channel
pub struct RecordingTransport {
    pushes: Sender<Vec<LogEntry>>,
}

impl RecordingTransport {
    pub fn new() -> (Self, Receiver<Vec<LogEntry>>) {
        let (tx, rx) = unbounded();
        (Self { pushes: tx }, rx)
    }
}

impl Transport for RecordingTransport {
    fn push(&mut self, batch: &[LogEntry]) -> Result<()> {
        let _ = self.pushes.send(batch.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Transport that parks inside `push` until released
///
/// `entered` fires each time a push starts; dropping the release sender lets
/// every current and future push through.
pub struct GatedTransport {
    inner: RecordingTransport,
    entered: Sender<()>,
    release: Receiver<()>,
}

impl GatedTransport {
    pub fn new() -> (Self, Receiver<Vec<LogEntry>>, Receiver<()>, Sender<()>) {
        let (inner, pushes) = RecordingTransport::new();
        let (entered_tx, entered_rx) = unbounded();
        let (release_tx, release_rx) = unbounded();
        (
            Self {
                inner,
                entered: entered_tx,
                release: release_rx,
            },
            pushes,
            entered_rx,
            release_tx,
        )
    }
}

impl Transport for GatedTransport {
    fn push(&mut self, batch: &[LogEntry]) -> Result<()> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        self.inner.push(batch)
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Transport that always fails and counts its calls
#[derive(Clone, Default)]
pub struct FailingTransport {
    pub calls: Arc<AtomicUsize>,
}

impl FailingTransport {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FailingTransport {
    fn push(&mut self, _batch: &[LogEntry]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ShipperError::push_rejected(503, "unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn messages(batch: &[LogEntry]) -> Vec<String> {
    batch.iter().map(|e| e.message().to_string()).collect()
}

/// Collect every batch currently in the channel
pub fn drain_pushes(rx: &Receiver<Vec<LogEntry>>) -> Vec<Vec<LogEntry>> {
    rx.try_iter().collect()
}

#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Body with gzip removed when the request says it is compressed
    pub fn decoded_body(&self) -> Vec<u8> {
        if self.header("content-encoding") == Some("gzip") {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(&self.body[..])
                .read_to_end(&mut decoded)
                .expect("gunzip body");
            decoded
        } else {
            self.body.clone()
        }
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.decoded_body()).expect("json body")
    }
}

fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn read_http_request(stream: &mut TcpStream) -> CapturedRequest {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .expect("read request line");
    let parts: Vec<&str> = request_line.trim().split(' ').collect();
    let method = parts.first().unwrap_or(&"").to_string();
    let path = parts.get(1).unwrap_or(&"").to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header");
        if line.trim().is_empty() {
            break;
        }
        if let Some((key, value)) = line.trim().split_once(':') {
            let key = key.trim().to_lowercase();
            let value = value.trim().to_string();
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((key, value));
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body).expect("read body");
    }

    CapturedRequest {
        method,
        path,
        headers,
        body,
    }
}

/// Spawn a push endpoint answering with `statuses` in turn (the last one repeats)
pub fn spawn_capture_server(statuses: Vec<u16>) -> (SocketAddr, Receiver<CapturedRequest>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = unbounded();

    thread::spawn(move || {
        let mut served = 0usize;
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let request = read_http_request(&mut stream);
            let status = statuses
                .get(served)
                .or(statuses.last())
                .copied()
                .unwrap_or(204);
            served += 1;

            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status,
                status_text(status)
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            if tx.send(request).is_err() {
                break;
            }
        }
    });

    (addr, rx)
}

pub fn push_url(addr: SocketAddr) -> String {
    format!("http://{}/loki/api/v1/push", addr)
}

//! Access logging example
//!
//! Wraps a toy request handler with an access-log layer that reports every
//! request through a [`LogSink`]. Configuration comes from the environment
//! (`LOKI_URL`, `LOKI_BASIC_AUTH`, `LOKI_TENANT`, `APP_NAME`, `APP_ENV`); an
//! unusable configuration falls back to JSON lines on stdout.
//!
//! Run with: cargo run --example access_log

use loki_shipper::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

struct Request {
    method: &'static str,
    route: &'static str,
    remote: String,
    user_agent: &'static str,
}

/// Pretend handler: returns a status code after doing some "work"
fn handle(request: &Request) -> u16 {
    thread::sleep(Duration::from_millis(2));
    match (request.method, request.route) {
        ("GET", "/items") => 200,
        ("POST", "/items") => 201,
        ("GET", "/boom") => 500,
        _ => 404,
    }
}

/// Run `handler` and log one `http_request` entry for it
fn with_access_log(sink: &dyn LogSink, request: &Request, handler: fn(&Request) -> u16) -> u16 {
    let start = Instant::now();
    let status = handler(request);

    let metadata = Metadata::new()
        .with_field("method", request.method)
        .with_field("route", request.route)
        .with_field("status", status)
        .with_field("duration_ms", start.elapsed().as_millis() as u64)
        .with_field("remote", request.remote.as_str())
        .with_field("ua", request.user_agent);

    match status {
        500..=u16::MAX => sink.error("http_request", metadata),
        400..=499 => sink.warn("http_request", metadata),
        _ => sink.info("http_request", metadata),
    }
    status
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Loki Shipper - Access Log Example ===\n");

    let sink: Arc<dyn LogSink> = Arc::from(sink_from_env());

    let routes = [
        ("GET", "/items"),
        ("POST", "/items"),
        ("GET", "/missing"),
        ("GET", "/boom"),
    ];

    let mut handles = Vec::new();
    for worker in 0..4 {
        let sink = Arc::clone(&sink);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let (method, route) = routes[(worker + i) % routes.len()];
                let request = Request {
                    method,
                    route,
                    remote: format!("10.0.0.{}:5{:04}", worker + 1, i),
                    user_agent: "curl/8.5.0",
                };
                with_access_log(sink.as_ref(), &request, handle);
            }
        }));
    }

    for worker_handle in handles {
        if worker_handle.join().is_err() {
            eprintln!("request worker panicked");
        }
    }

    println!("Served 100 requests, flushing logs...");
    sink.close();
    println!("\n=== Example completed successfully! ===");
}

//! Push payload encoding
//!
//! A batch becomes a single stream under the client's static labels:
//!
//! ```json
//! {"streams":[{"stream":{"app":"api","env":"dev"},
//!              "values":[["1700000000123456789","{\"level\":\"info\",...}"]]}]}
//! ```
//!
//! Entries keep their enqueue order and no entry field is ever promoted to a
//! label, so the remote stream count stays fixed per client.

use crate::core::{Compression, LogEntry, Result};
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Key for the RFC 3339 timestamp inside each shipped line
pub const LINE_TIME_KEY: &str = "ts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub streams: Vec<PushStream>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushStream {
    pub stream: BTreeMap<String, String>,
    /// `[unix_nanos, line]` pairs
    pub values: Vec<[String; 2]>,
}

impl PushRequest {
    /// Group `batch` under `labels`, preserving order
    pub fn from_batch(labels: &BTreeMap<String, String>, batch: &[LogEntry]) -> Result<Self> {
        let values = batch
            .iter()
            .map(|entry| Ok([entry.timestamp_nanos().to_string(), encode_line(entry)?]))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            streams: vec![PushStream {
                stream: labels.clone(),
                values,
            }],
        })
    }

    pub fn entry_count(&self) -> usize {
        self.streams.iter().map(|s| s.values.len()).sum()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serialize and compress into the request body
    pub fn encode(&self, compression: Compression) -> Result<Vec<u8>> {
        let json = self.to_json()?;
        compress(&json, compression)
    }
}

/// One JSON line: `level`, `msg`, `ts`, then metadata (metadata wins on clashes)
pub fn encode_line(entry: &LogEntry) -> Result<String> {
    let object = entry.json_object(entry.level().as_str(), LINE_TIME_KEY);
    Ok(serde_json::to_string(&object)?)
}

pub fn compress(body: &[u8], compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(
                Vec::with_capacity(body.len() / 4),
                flate2::Compression::default(),
            );
            encoder.write_all(body)?;
            Ok(encoder.finish()?)
        }
        Compression::None => Ok(body.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, Metadata};
    use chrono::{TimeZone, Utc};
    use flate2::read::GzDecoder;
    use serde_json::{json, Value};
    use std::io::Read;

    fn labels() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("app".to_string(), "api".to_string()),
            ("env".to_string(), "dev".to_string()),
        ])
    }

    fn entry_at(secs: i64, message: &str, metadata: Metadata) -> LogEntry {
        LogEntry::with_timestamp(
            LogLevel::Info,
            message,
            metadata,
            Utc.timestamp_opt(secs, 5).unwrap(),
        )
    }

    #[test]
    fn test_envelope_shape() {
        let batch = vec![
            entry_at(1_700_000_000, "first", Metadata::new()),
            entry_at(1_700_000_001, "second", Metadata::new().with_field("status", 201)),
        ];
        let request = PushRequest::from_batch(&labels(), &batch).unwrap();
        let value: Value = serde_json::from_slice(&request.to_json().unwrap()).unwrap();

        assert_eq!(value["streams"].as_array().unwrap().len(), 1);
        assert_eq!(value["streams"][0]["stream"], json!({"app": "api", "env": "dev"}));

        let values = value["streams"][0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0][0], json!("1700000000000000005"));
        assert_eq!(values[1][0], json!("1700000001000000005"));

        let line: Value = serde_json::from_str(values[1][1].as_str().unwrap()).unwrap();
        assert_eq!(line["msg"], json!("second"));
        assert_eq!(line["level"], json!("info"));
        assert_eq!(line["status"], json!(201));
        assert!(line["ts"].as_str().unwrap().starts_with("2023-11-14T22:13:21"));
    }

    #[test]
    fn test_order_is_preserved_even_when_timestamps_go_backwards() {
        let batch = vec![
            entry_at(20, "late", Metadata::new()),
            entry_at(10, "early", Metadata::new()),
        ];
        let request = PushRequest::from_batch(&labels(), &batch).unwrap();
        let values = &request.streams[0].values;
        assert!(values[0][1].contains("late"));
        assert!(values[1][1].contains("early"));
    }

    #[test]
    fn test_metadata_never_becomes_a_label() {
        let batch = vec![entry_at(
            1,
            "x",
            Metadata::new().with_field("app", "spoofed").with_field("route", "/a"),
        )];
        let request = PushRequest::from_batch(&labels(), &batch).unwrap();
        assert_eq!(request.streams[0].stream, labels());

        let line: Value = serde_json::from_str(&request.streams[0].values[0][1]).unwrap();
        assert_eq!(line["app"], json!("spoofed"));
    }

    #[test]
    fn test_line_metadata_overrides_fixed_keys() {
        let entry = entry_at(1, "real", Metadata::new().with_field("ts", "custom"));
        let line: Value = serde_json::from_str(&encode_line(&entry).unwrap()).unwrap();
        assert_eq!(line["ts"], json!("custom"));
        assert_eq!(line["msg"], json!("real"));
    }

    #[test]
    fn test_gzip_roundtrip() {
        let request =
            PushRequest::from_batch(&labels(), &[entry_at(1, "zip me", Metadata::new())]).unwrap();
        let body = request.encode(Compression::Gzip).unwrap();
        assert_eq!(&body[..2], &[0x1f, 0x8b]);

        let mut decoded = Vec::new();
        GzDecoder::new(&body[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, request.to_json().unwrap());
    }

    #[test]
    fn test_no_compression_is_plain_json() {
        let request =
            PushRequest::from_batch(&labels(), &[entry_at(1, "plain", Metadata::new())]).unwrap();
        let body = request.encode(Compression::None).unwrap();
        assert_eq!(body, request.to_json().unwrap());
        assert_eq!(request.entry_count(), 1);
    }
}

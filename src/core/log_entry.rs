//! Log entry structure

use super::log_level::LogLevel;
use super::metadata::Metadata;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One structured log record waiting to be shipped
///
/// Entries are immutable once created; the timestamp is taken at creation,
/// which is the moment the caller enqueues it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    level: LogLevel,
    message: String,
    metadata: Metadata,
    timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, metadata: Metadata) -> Self {
        Self::with_timestamp(level, message, metadata, Utc::now())
    }

    pub fn with_timestamp(
        level: LogLevel,
        message: impl Into<String>,
        metadata: Metadata,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            metadata,
            timestamp,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Unix timestamp in nanoseconds
    ///
    /// Computed in `i128` so dates outside the `i64` nanosecond range still encode.
    pub fn timestamp_nanos(&self) -> i128 {
        i128::from(self.timestamp.timestamp()) * 1_000_000_000
            + i128::from(self.timestamp.timestamp_subsec_nanos())
    }

    /// RFC 3339 timestamp with nanosecond precision, UTC
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Build the JSON object for this entry
    ///
    /// Fixed keys are written first (`level`, `msg`, then `time_key`) and the
    /// metadata is applied on top, so a metadata key with the same name wins.
    pub fn json_object(&self, level: &str, time_key: &str) -> Map<String, Value> {
        let mut object = Map::with_capacity(3 + self.metadata.len());
        object.insert("level".to_string(), Value::from(level));
        object.insert("msg".to_string(), Value::from(self.message.as_str()));
        object.insert(time_key.to_string(), Value::from(self.timestamp_rfc3339()));
        self.metadata.merge_into(&mut object);
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap()
    }

    #[test]
    fn test_timestamp_nanos() {
        let entry = LogEntry::with_timestamp(LogLevel::Info, "x", Metadata::new(), fixed_time());
        assert_eq!(entry.timestamp_nanos(), 1_700_000_000_123_456_789);
        assert_eq!(entry.timestamp_rfc3339(), "2023-11-14T22:13:20.123456789Z");
    }

    #[test]
    fn test_json_object_fixed_fields() {
        let entry = LogEntry::with_timestamp(
            LogLevel::Warn,
            "slow request",
            Metadata::new().with_field("duration_ms", 950),
            fixed_time(),
        );

        let object = entry.json_object(entry.level().as_str(), "ts");
        assert_eq!(object["level"], json!("warn"));
        assert_eq!(object["msg"], json!("slow request"));
        assert_eq!(object["ts"], json!("2023-11-14T22:13:20.123456789Z"));
        assert_eq!(object["duration_ms"], json!(950));
    }

    #[test]
    fn test_metadata_overrides_fixed_fields() {
        let entry = LogEntry::with_timestamp(
            LogLevel::Info,
            "original",
            Metadata::new().with_field("msg", "from metadata").with_field("level", 7),
            fixed_time(),
        );

        let object = entry.json_object("info", "ts");
        assert_eq!(object["msg"], json!("from metadata"));
        assert_eq!(object["level"], json!(7));
        assert_eq!(object.len(), 3);
    }
}

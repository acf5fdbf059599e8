//! Bounded history of publish attempts
//!
//! Entries are kept in insertion (= chronological) order. When the log is
//! full, the oldest entries are evicted first. Append and eviction happen
//! under a single write lock so readers never observe more than `capacity`
//! entries.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Maximum length of the `info` field, in characters
pub const MAX_INFO_CHARS: usize = 200;

/// Sensor id recorded for entries that are not about a sensor
pub const NO_SENSOR: &str = "-";

/// What a log entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishKind {
    #[serde(rename = "temp")]
    Temperature,
    #[serde(rename = "debug")]
    DebugToggle,
}

/// One publish attempt or mode change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishLogEntry {
    #[serde(rename = "time", serialize_with = "serialize_iso")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: PublishKind,
    #[serde(rename = "sensor")]
    pub sensor_id: String,
    #[serde(rename = "tempC")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "ok")]
    pub success: bool,
    pub info: String,
}

impl PublishLogEntry {
    pub fn temperature(sensor_id: &str, temperature_c: f64, success: bool, info: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: PublishKind::Temperature,
            sensor_id: sensor_id.to_string(),
            temperature_c: Some(temperature_c),
            success,
            info: truncate_info(info),
        }
    }

    pub fn debug_toggle(enabled: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: PublishKind::DebugToggle,
            sensor_id: NO_SENSOR.to_string(),
            temperature_c: None,
            success: true,
            info: format!("debugMode={}", enabled),
        }
    }
}

/// First [`MAX_INFO_CHARS`] characters of `info`
pub fn truncate_info(info: &str) -> String {
    info.chars().take(MAX_INFO_CHARS).collect()
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
pub fn serialize_iso<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Optional variant of [`serialize_iso`]
pub fn serialize_iso_opt<S: Serializer>(
    time: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(time) => serialize_iso(time, serializer),
        None => serializer.serialize_none(),
    }
}

/// Capacity-bounded, append-only publish history
pub struct PublishLog {
    entries: RwLock<VecDeque<PublishLogEntry>>,
    capacity: usize,
}

impl PublishLog {
    /// Create a log holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Append an entry, evicting the oldest ones beyond capacity
    pub fn append(&self, entry: PublishLogEntry) {
        let mut entries = self.entries.write();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Up to `limit` most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<PublishLogEntry> {
        self.entries.read().iter().rev().take(limit).cloned().collect()
    }

    /// All entries, oldest first
    pub fn snapshot(&self) -> Vec<PublishLogEntry> {
        self.entries.read().iter().cloned().collect()
    }
}

impl Default for PublishLog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PUBLISH_LOG_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(n: usize) -> PublishLogEntry {
        PublishLogEntry::temperature(&format!("s{}", n), n as f64, true, "ok")
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let log = PublishLog::new(5);
        for n in 0..23 {
            log.append(entry(n));
            assert!(log.len() <= 5);
        }
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_fifo_eviction() {
        let log = PublishLog::new(3);
        for n in 0..5 {
            log.append(entry(n));
        }
        let ids: Vec<String> = log.snapshot().into_iter().map(|e| e.sensor_id).collect();
        assert_eq!(ids, vec!["s2", "s3", "s4"]);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let log = PublishLog::new(10);
        for n in 0..6 {
            log.append(entry(n));
        }
        let ids: Vec<String> = log.recent(3).into_iter().map(|e| e.sensor_id).collect();
        assert_eq!(ids, vec!["s5", "s4", "s3"]);
        assert_eq!(log.recent(100).len(), 6);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn test_zero_capacity_coerced() {
        let log = PublishLog::new(0);
        log.append(entry(1));
        log.append(entry(2));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.snapshot()[0].sensor_id, "s2");
    }

    #[test]
    fn test_info_truncated_to_200_chars() {
        let long = "å".repeat(450);
        let e = PublishLogEntry::temperature("s", 1.0, false, &long);
        assert_eq!(e.info.chars().count(), MAX_INFO_CHARS);
    }

    #[test]
    fn test_debug_toggle_entry() {
        let e = PublishLogEntry::debug_toggle(true);
        assert_eq!(e.kind, PublishKind::DebugToggle);
        assert_eq!(e.sensor_id, "-");
        assert_eq!(e.temperature_c, None);
        assert!(e.success);
        assert_eq!(e.info, "debugMode=true");
    }

    #[test]
    fn test_wire_format() {
        let e = PublishLogEntry::temperature("28-abc", 21.5, true, "Created");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "temp");
        assert_eq!(json["sensor"], "28-abc");
        assert_eq!(json["tempC"], 21.5);
        assert_eq!(json["ok"], true);
        assert_eq!(json["info"], "Created");
        let time = json["time"].as_str().unwrap();
        assert!(time.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(time).is_ok());

        let toggle = serde_json::to_value(PublishLogEntry::debug_toggle(false)).unwrap();
        assert_eq!(toggle["type"], "debug");
        assert!(toggle["tempC"].is_null());
    }

    #[test]
    fn test_concurrent_appends_respect_capacity() {
        let log = Arc::new(PublishLog::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for n in 0..200 {
                        log.append(entry(t * 1000 + n));
                        assert!(log.snapshot().len() <= 50);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(log.len(), 50);
    }
}

//! Core types for the logsift alerting system
//! this crate contains the shared data structures used across all components.
pub mod parser;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// LOG LEVEL //

/// Log levels recognised in uploaded application logs

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]

pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    /// Map an exact level token (as it appears in the line) to a level
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            "DEBUG" => Some(Self::Debug),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// LOG ENTRY (one parsed line)

/// One parsed log line.
/// Every field is always present; unmatched fields carry their defaults.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(alias = "id")]
    pub sequence: u64, // 1-based position within the source file

    pub date: String, // YYYY-MM-DD or empty

    pub time: String, // HH:MM, "00:00" when absent

    pub level: LogLevel,

    pub category: String, // last dot segment of the logger name, "General" when absent

    pub message: String, // text after the first " : " or the whole line

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>, // pass-through timestamp from upstream producers
}

impl LogEntry {
    /// Resolve when this entry happened.
    ///
    /// `date` + `time` win when both are non-empty, otherwise the upstream
    /// `timestamp` field is tried. `None` means the entry has no usable time.
    pub fn event_time(&self) -> Option<NaiveDateTime> {
        if !self.date.is_empty() && !self.time.is_empty() {
            parse_iso_datetime(&format!("{}T{}", self.date, self.time))
        } else {
            self.timestamp.as_deref().and_then(parse_iso_datetime)
        }
    }
}

/// Parse an ISO 8601 local date-time.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS[.fff]]` (a space may replace the
/// `T`) and the same shapes followed by `Z` or a `+HH:MM` offset.
pub fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    // Offsets are dropped, not normalized to UTC: entries carrying different
    // offsets are ordered by their local wall-clock time.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    // RFC 3339 requires seconds; `2024-03-01T10:15Z` still shows up in the wild
    const OFFSET_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
        "%Y-%m-%d %H:%M%:z",
        "%Y-%m-%d %H:%M%z",
    ];
    let with_offset = match s.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
            return Some(dt.naive_local());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Render a date-time the way alerts report it (`2024-03-01T10:15:00`).
pub fn format_iso_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

// ALERTS

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub count: usize,
    pub time_window_minutes: u32,
    pub latest_timestamp: String, // right edge of the firing window
}

/// One detection event produced by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub name: String,
    pub reason: String,
    pub severity: Severity,
    pub stats: AlertStats,

    // entries inside the firing window, oldest first
    #[serde(rename = "logs")]
    pub triggering_logs: Vec<LogEntry>,
}

impl Alert {
    /// Message of the newest entry in the window
    pub fn latest_message(&self) -> Option<&str> {
        self.triggering_logs.last().map(|log| log.message.as_str())
    }
}

/// Alert as stored for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    #[serde(flatten)]
    pub alert: Alert,
    pub user_id: String,
    pub project_id: String,
    pub time_detected: String,
}

impl AlertRecord {
    pub fn new(alert: Alert, user_id: &str, project_id: &str) -> Self {
        let time_detected = alert.stats.latest_timestamp.clone();
        Self {
            alert,
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            time_detected,
        }
    }
}

// EMBEDDING DOCUMENT (for similarity retrieval)

/// Vector representation of one alert summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingDocument {
    pub user_id: String,
    pub project_id: String,
    pub alert_name: String,
    pub severity: Severity,
    pub reason: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, time: &str, timestamp: Option<&str>) -> LogEntry {
        LogEntry {
            sequence: 1,
            date: date.to_string(),
            time: time.to_string(),
            level: LogLevel::Info,
            category: "General".to_string(),
            message: "hello".to_string(),
            timestamp: timestamp.map(str::to_string),
        }
    }

    #[test]
    fn test_event_time_from_date_and_time() {
        let e = entry("2024-03-01", "10:15", None);
        assert_eq!(
            e.event_time().map(|t| format_iso_datetime(&t)),
            Some("2024-03-01T10:15:00".to_string())
        );
    }

    #[test]
    fn test_event_time_falls_back_to_timestamp() {
        let e = entry("", "00:00", Some("2024-03-01T10:15:30"));
        assert_eq!(
            e.event_time().map(|t| format_iso_datetime(&t)),
            Some("2024-03-01T10:15:30".to_string())
        );

        let offset = entry("", "00:00", Some("2024-03-01T10:15:30+02:00"));
        assert_eq!(
            offset.event_time().map(|t| format_iso_datetime(&t)),
            Some("2024-03-01T10:15:30".to_string())
        );
    }

    #[test]
    fn test_offset_without_seconds() {
        let expect = |s: &str, want: &str| {
            assert_eq!(
                parse_iso_datetime(s).map(|t| format_iso_datetime(&t)),
                Some(want.to_string()),
                "{s}"
            );
        };
        expect("2024-03-01T10:15Z", "2024-03-01T10:15:00");
        expect("2024-03-01T10:15+02:00", "2024-03-01T10:15:00");
        expect("2024-03-01 23:59-05:00", "2024-03-01T23:59:00");
        expect("2024-03-01T10:15:30Z", "2024-03-01T10:15:30");
    }

    #[test]
    fn test_mixed_offsets_compare_by_wall_clock() {
        let utc = parse_iso_datetime("2024-03-01T10:15Z");
        let plus_two = parse_iso_datetime("2024-03-01T10:10+02:00");
        assert!(plus_two < utc);
    }

    #[test]
    fn test_event_time_unparseable() {
        assert!(entry("", "00:00", None).event_time().is_none());
        assert!(entry("2024-13-45", "10:15", None).event_time().is_none());
        assert!(entry("", "00:00", Some("yesterday")).event_time().is_none());
    }

    #[test]
    fn test_alert_record_serialization_shape() {
        let alert = Alert {
            name: "High Error Rate".to_string(),
            reason: "r".to_string(),
            severity: Severity::High,
            stats: AlertStats {
                count: 1,
                time_window_minutes: 1,
                latest_timestamp: "2024-03-01T10:15:00".to_string(),
            },
            triggering_logs: vec![entry("2024-03-01", "10:15", None)],
        };
        let record = AlertRecord::new(alert, "u1", "p1");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["name"], "High Error Rate");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["stats"]["timeWindowMinutes"], 1);
        assert_eq!(json["stats"]["latestTimestamp"], "2024-03-01T10:15:00");
        assert_eq!(json["logs"][0]["level"], "INFO");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["projectId"], "p1");
        assert_eq!(json["timeDetected"], "2024-03-01T10:15:00");
    }
}

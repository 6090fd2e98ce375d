//! Sliding window detection logic

use crate::error::RuleConfigError;
use chrono::{Duration, NaiveDateTime};
use logsift_core::{format_iso_datetime, Alert, AlertStats, LogEntry, LogLevel, Severity};
use tracing::debug;

// keyword rules at or above this threshold are HIGH severity
const KEYWORD_HIGH_THRESHOLD: usize = 10;

// What a rule counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    ErrorCount,
    KeywordMatch { keyword: String },
}

/// One window-based detector. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    kind: RuleKind,
    time_window_minutes: u32,
    threshold: usize,
}

impl Rule {
    pub fn error_count(
        time_window_minutes: u32,
        threshold: usize,
    ) -> Result<Self, RuleConfigError> {
        Self::new(RuleKind::ErrorCount, time_window_minutes, threshold)
    }

    pub fn keyword_match(
        keyword: impl Into<String>,
        time_window_minutes: u32,
        threshold: usize,
    ) -> Result<Self, RuleConfigError> {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return Err(RuleConfigError::EmptyKeyword);
        }
        Self::new(RuleKind::KeywordMatch { keyword }, time_window_minutes, threshold)
    }

    fn new(
        kind: RuleKind,
        time_window_minutes: u32,
        threshold: usize,
    ) -> Result<Self, RuleConfigError> {
        let rule = Self {
            kind,
            time_window_minutes,
            threshold,
        };
        if time_window_minutes == 0 {
            return Err(RuleConfigError::InvalidWindow { rule: rule.name() });
        }
        if threshold == 0 {
            return Err(RuleConfigError::InvalidThreshold { rule: rule.name() });
        }
        Ok(rule)
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn time_window_minutes(&self) -> u32 {
        self.time_window_minutes
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Rule identity as shown on alerts
    pub fn name(&self) -> String {
        match &self.kind {
            RuleKind::ErrorCount => "High Error Rate".to_string(),
            RuleKind::KeywordMatch { keyword } => format!("Frequent Keyword: '{}'", keyword),
        }
    }

    pub fn severity(&self) -> Severity {
        match &self.kind {
            RuleKind::ErrorCount => Severity::High,
            RuleKind::KeywordMatch { .. } if self.threshold < KEYWORD_HIGH_THRESHOLD => {
                Severity::Medium
            }
            RuleKind::KeywordMatch { .. } => Severity::High,
        }
    }

    fn reason(&self) -> String {
        match &self.kind {
            RuleKind::ErrorCount => format!(
                "Exceeded {} ERROR logs within {} minutes.",
                self.threshold, self.time_window_minutes
            ),
            RuleKind::KeywordMatch { keyword } => format!(
                "Keyword '{}' seen {} times within {} minutes.",
                keyword, self.threshold, self.time_window_minutes
            ),
        }
    }

    /// Does this entry count toward the rule
    pub fn qualifies(&self, entry: &LogEntry) -> bool {
        match &self.kind {
            RuleKind::ErrorCount => entry.level == LogLevel::Error,
            RuleKind::KeywordMatch { keyword } => entry.message.contains(keyword.as_str()),
        }
    }

    /// Scan the entries and return every alert this rule fires.
    ///
    /// Entries without a parseable time are skipped. An alert fires only when
    /// the trailing window first grows to exactly `threshold` entries.
    pub fn evaluate(&self, entries: &[LogEntry]) -> Vec<Alert> {
        let mut timed: Vec<(NaiveDateTime, &LogEntry)> = entries
            .iter()
            .filter(|entry| self.qualifies(entry))
            .filter_map(|entry| entry.event_time().map(|ts| (ts, entry)))
            .collect();

        // stable, so ties keep input order
        timed.sort_by_key(|(ts, _)| *ts);

        let window = Duration::minutes(i64::from(self.time_window_minutes));
        let mut alerts = Vec::new();
        let mut start = 0;

        for end in 0..timed.len() {
            let right_edge = timed[end].0;

            // timestamps are sorted so everything before `start` stays out of range
            while right_edge - timed[start].0 > window {
                start += 1;
            }

            let size = end - start + 1;
            if size == self.threshold {
                alerts.push(self.build_alert(right_edge, &timed[start..=end]));
            }
        }

        debug!(
            rule = %self.name(),
            qualifying = timed.len(),
            fired = alerts.len(),
            "Rule evaluated"
        );

        alerts
    }

    fn build_alert(
        &self,
        right_edge: NaiveDateTime,
        window: &[(NaiveDateTime, &LogEntry)],
    ) -> Alert {
        let latest_timestamp = format_iso_datetime(&right_edge);
        debug!(rule = %self.name(), count = window.len(), at = %latest_timestamp, "Alert fired");

        Alert {
            name: self.name(),
            reason: self.reason(),
            severity: self.severity(),
            stats: AlertStats {
                count: window.len(),
                time_window_minutes: self.time_window_minutes,
                latest_timestamp,
            },
            triggering_logs: window.iter().map(|(_, entry)| (*entry).clone()).collect(),
        }
    }
}

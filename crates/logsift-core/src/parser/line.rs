// Application log line parser
//
// Lines look roughly like
//   2024-03-01 10:15:42.123 ERROR 4242 --- [main] com.acme.OrderService : Payment failed
// but every field is optional; unmatched fields fall back to defaults.

use crate::{LogEntry, LogLevel};
use regex::Regex;

const DEFAULT_TIME: &str = "00:00";
const DEFAULT_CATEGORY: &str = "General";
const MESSAGE_DELIMITER: &str = " : ";

pub struct LogLineParser {
    date_pattern: Regex,
    time_pattern: Regex,
    level_pattern: Regex,
    // "] com.acme.OrderService :" -> logger name
    category_pattern: Regex,
    // CRLF, LF, lone CR and the other Unicode line boundaries
    line_break_pattern: Regex,
}

impl LogLineParser {
    pub fn new() -> Self {
        Self {
            date_pattern: Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("valid date pattern"),
            time_pattern: Regex::new(r"\b\d{2}:\d{2}\b").expect("valid time pattern"),
            level_pattern: Regex::new(r"\b(INFO|WARN|ERROR|DEBUG)\b").expect("valid level pattern"),
            category_pattern: Regex::new(r"\]\s+([a-zA-Z0-9.]+)\s+:")
                .expect("valid category pattern"),
            line_break_pattern: Regex::new(r"\r\n|[\n\r\x0B\x0C\x1C-\x1E\x{85}\x{2028}\x{2029}]")
                .expect("valid line break pattern"),
        }
    }

    /// Parse every non-blank line of `text`, numbering from 1.
    pub fn parse_text(&self, text: &str) -> Vec<LogEntry> {
        self.line_break_pattern
            .split(text)
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| self.parse_line(line, index as u64 + 1))
            .collect()
    }

    /// Best-effort parse of a single line. Never fails.
    pub fn parse_line(&self, line: &str, sequence: u64) -> LogEntry {
        let date = self
            .date_pattern
            .find(line)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let time = self
            .time_pattern
            .find(line)
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_TIME)
            .to_string();

        let level = self
            .level_pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| LogLevel::from_token(m.as_str()))
            .unwrap_or_default();

        let category = self
            .category_pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().rsplit('.').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        let message = match line.split_once(MESSAGE_DELIMITER) {
            Some((_, rest)) => rest.to_string(),
            None => line.to_string(),
        };

        LogEntry {
            sequence,
            date,
            time,
            level,
            category,
            message,
            timestamp: None,
        }
    }
}

impl Default for LogLineParser {
    fn default() -> Self {
        Self::new()
    }
}

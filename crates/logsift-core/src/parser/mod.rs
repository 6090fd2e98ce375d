//! log line parser - turns uploaded text into structured entries

pub mod line;

pub use line::LogLineParser;

use crate::LogEntry;
use std::sync::LazyLock;

static DEFAULT_PARSER: LazyLock<LogLineParser> = LazyLock::new(LogLineParser::new);

/// Parse a whole uploaded file with the shared parser.
///
/// Blank lines are dropped and do not consume a sequence number.
pub fn parse_log_text(text: &str) -> Vec<LogEntry> {
    DEFAULT_PARSER.parse_text(text)
}

//! Configuration parsing for alert rules

use crate::error::RuleConfigError;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// A set of rules evaluated together
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

// A single detector configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    // count ERROR-level entries
    ErrorCount {
        time_window_minutes: u32,
        threshold: usize,
    },
    // count entries whose message contains `keyword`
    KeywordMatch {
        keyword: String,
        time_window_minutes: u32,
        threshold: usize,
    },
}

impl RuleConfig {
    /// Validate and build the detector
    pub fn build(&self) -> Result<Rule, RuleConfigError> {
        match self {
            RuleConfig::ErrorCount {
                time_window_minutes,
                threshold,
            } => Rule::error_count(*time_window_minutes, *threshold),
            RuleConfig::KeywordMatch {
                keyword,
                time_window_minutes,
                threshold,
            } => Rule::keyword_match(keyword, *time_window_minutes, *threshold),
        }
    }
}

impl RuleSet {
    /// Rules run on every project upload
    pub fn ingest_defaults() -> Self {
        Self {
            rules: vec![
                RuleConfig::ErrorCount {
                    time_window_minutes: 1,
                    threshold: 1,
                },
                RuleConfig::KeywordMatch {
                    keyword: "status=404".to_string(),
                    time_window_minutes: 1,
                    threshold: 1,
                },
                RuleConfig::KeywordMatch {
                    keyword: "Exception".to_string(),
                    time_window_minutes: 2,
                    threshold: 1,
                },
                RuleConfig::KeywordMatch {
                    keyword: "Failed".to_string(),
                    time_window_minutes: 1,
                    threshold: 1,
                },
            ],
        }
    }

    /// Build every rule, failing on the first invalid one
    pub fn build(&self) -> Result<Vec<Rule>, RuleConfigError> {
        self.rules.iter().map(RuleConfig::build).collect()
    }
}

// Load a rule set from a TOML file

pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<RuleSet, RuleConfigError> {
    let content = fs::read_to_string(path)?;
    let rules: RuleSet = toml::from_str(&content)?;
    Ok(rules)
}

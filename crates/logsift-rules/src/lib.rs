//! logsift rule engine - sliding window alert detection

pub mod config;
pub mod engine;
pub mod error;
pub mod rule;

pub use config::{load_rules, RuleConfig, RuleSet};
pub use engine::AlertRuleEngine;
pub use error::RuleConfigError;
pub use rule::{Rule, RuleKind};

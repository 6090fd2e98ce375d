//! Alert rule engine - runs a rule set over a batch of entries

use crate::config::RuleSet;
use crate::error::RuleConfigError;
use crate::rule::Rule;
use logsift_core::{Alert, LogEntry};
use tracing::debug;

// Main alert engine - owns an ordered list of rules
#[derive(Debug, Clone, Default)]
pub struct AlertRuleEngine {
    rules: Vec<Rule>,
}

impl AlertRuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    // validate a configured rule set and build the engine
    pub fn from_rule_set(set: &RuleSet) -> Result<Self, RuleConfigError> {
        Ok(Self::new(set.build()?))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every rule against the same entries.
    ///
    /// Alerts come back grouped by rule in rule-list order. Rules never see
    /// each other's results, so one entry may feed several alerts.
    pub fn evaluate(&self, entries: &[LogEntry]) -> Vec<Alert> {
        let alerts: Vec<Alert> = self
            .rules
            .iter()
            .flat_map(|rule| rule.evaluate(entries))
            .collect();

        debug!(
            rules = self.rules.len(),
            entries = entries.len(),
            alerts = alerts.len(),
            "Engine evaluation finished"
        );
        alerts
    }
}

// Offline commands: parse and evaluate local log files without a server

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use logsift_core::parser::LogLineParser;
use logsift_core::{Alert, LogEntry, LogLevel, Severity};
use logsift_rules::{load_rules, AlertRuleEngine, RuleSet};
use std::path::Path;

type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn read_log_file(path: &Path) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Engine from a TOML rule file, or the default ingestion rules
pub fn build_engine(rules: Option<&Path>) -> Result<AlertRuleEngine, Box<dyn std::error::Error>> {
    let set = match rules {
        Some(path) => load_rules(path)?,
        None => RuleSet::ingest_defaults(),
    };
    Ok(AlertRuleEngine::from_rule_set(&set)?)
}

/// Parse every text and evaluate the combined entries, files in the given order
pub fn analyze_texts(
    parser: &LogLineParser,
    engine: &AlertRuleEngine,
    texts: &[String],
) -> Vec<Alert> {
    let entries: Vec<LogEntry> = texts.iter().flat_map(|text| parser.parse_text(text)).collect();
    engine.evaluate(&entries)
}

pub fn analyze_files(files: &[String], rules: Option<&Path>, json: bool) -> CliResult {
    let engine = build_engine(rules)?;
    let parser = LogLineParser::new();

    let texts = files
        .iter()
        .map(|f| read_log_file(Path::new(f)))
        .collect::<Result<Vec<_>, _>>()?;

    let alerts = analyze_texts(&parser, &engine, &texts);

    if json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    println!("\n{} {} file(s)", "Analyzing:".cyan().bold(), files.len());
    println!("{}", "─".repeat(60).dimmed());
    for rule in engine.rules() {
        println!(
            "  {} {} ({} in {} min)",
            "Rule:".dimmed(),
            rule.name(),
            rule.threshold(),
            rule.time_window_minutes()
        );
    }
    println!();

    if alerts.is_empty() {
        println!("  {} No alerts", "✓".green());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Severity", "Rule", "Count", "Window", "Latest", "Example"]);

    for alert in &alerts {
        table.add_row(vec![
            severity_colored(alert.severity),
            alert.name.clone(),
            alert.stats.count.to_string(),
            format!("{} min", alert.stats.time_window_minutes),
            alert.stats.latest_timestamp.clone(),
            truncate(alert.latest_message().unwrap_or("-"), 40),
        ]);
    }

    println!("{table}");
    println!("\n{} {} alerts", "Total:".dimmed(), alerts.len().to_string().yellow());
    Ok(())
}

pub fn parse_file(file: &str, limit: Option<usize>) -> CliResult {
    let parser = LogLineParser::new();
    let entries = parser.parse_text(&read_log_file(Path::new(file))?);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Date", "Time", "Level", "Category", "Message"]);

    let shown = limit.unwrap_or(entries.len());
    for entry in entries.iter().take(shown) {
        table.add_row(vec![
            entry.sequence.to_string(),
            entry.date.clone(),
            entry.time.clone(),
            level_colored(entry.level),
            entry.category.clone(),
            truncate(&entry.message, 60),
        ]);
    }

    println!("{table}");
    println!(
        "\n{} {} of {} records",
        "Shown:".dimmed(),
        shown.min(entries.len()).to_string().green(),
        entries.len()
    );
    Ok(())
}

pub fn severity_colored(severity: Severity) -> String {
    match severity {
        Severity::High => severity.to_string().red().bold().to_string(),
        Severity::Medium => severity.to_string().yellow().to_string(),
    }
}

fn level_colored(level: LogLevel) -> String {
    match level {
        LogLevel::Error => level.as_str().red().to_string(),
        LogLevel::Warn => level.as_str().yellow().to_string(),
        LogLevel::Info => level.as_str().green().to_string(),
        LogLevel::Debug => level.as_str().blue().to_string(),
    }
}

/// Cut to `max` characters, ending in "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

use logsift_core::parser::{parse_log_text, LogLineParser};
use logsift_core::LogLevel;

const SAMPLE: &str = "\
2024-03-01 10:15:00.101  INFO 4242 --- [main] com.acme.Application : Started Application in 3.2s

2024-03-01 10:15:42.123 ERROR 4242 --- [exec-1] com.acme.OrderService : Payment failed for order 17
   
2024-03-01 10:16:05.004  WARN 4242 --- [exec-2] com.acme.web.Filter : GET /favicon.ico status=404
2024-03-01 10:16:09.777 DEBUG 4242 --- [scheduler-1] Cache : evicted 12 entries
";

#[test]
fn test_sequence_is_dense_and_skips_blank_lines() {
    let entries = parse_log_text(SAMPLE);

    assert_eq!(entries.len(), 4);
    let sequences: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
}

#[test]
fn test_fields_extracted_in_order() {
    let entries = parse_log_text(SAMPLE);

    println!("Parsed: {:#?}", entries);

    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[0].category, "Application");
    assert_eq!(entries[0].message, "Started Application in 3.2s");

    assert_eq!(entries[1].level, LogLevel::Error);
    assert_eq!(entries[1].time, "10:15");
    assert_eq!(entries[1].category, "OrderService");

    assert_eq!(entries[2].level, LogLevel::Warn);
    assert_eq!(entries[2].category, "Filter");
    assert!(entries[2].message.contains("status=404"));

    assert_eq!(entries[3].level, LogLevel::Debug);
    assert_eq!(entries[3].category, "Cache");
    assert!(entries.iter().all(|e| e.date == "2024-03-01"));
}

#[test]
fn test_parsing_is_idempotent() {
    let first = parse_log_text(SAMPLE);
    let second = parse_log_text(SAMPLE);
    assert_eq!(first, second);

    // a dedicated parser agrees with the shared one
    let parser = LogLineParser::new();
    assert_eq!(parser.parse_text(SAMPLE), first);
}

#[test]
fn test_only_blank_input() {
    assert!(parse_log_text("").is_empty());
    assert!(parse_log_text("\n   \n\t\n").is_empty());
}

#[test]
fn test_malformed_lines_still_produce_records() {
    let entries = parse_log_text("garbage line\n:::\n12:34 only a time");

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].date, "");
    assert_eq!(entries[0].time, "00:00");
    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[0].category, "General");
    assert_eq!(entries[0].message, "garbage line");
    assert_eq!(entries[1].message, ":::");
    assert_eq!(entries[2].time, "12:34");
    assert!(entries[2].event_time().is_none());
}

#[test]
fn test_windows_line_endings() {
    let text = "2024-03-01 10:00 ERROR a : x\r\n\r\n2024-03-01 10:01 INFO b : y\r\n";
    let entries = parse_log_text(text);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "x");
    assert_eq!(entries[1].message, "y");
    assert_eq!(entries[1].sequence, 2);
}

#[test]
fn test_carriage_return_only_line_endings() {
    let entries = parse_log_text("2024-03-01 10:00 ERROR a : x\r2024-03-01 10:01 INFO b : y\r");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "x");
    assert_eq!(entries[1].message, "y");
    assert_eq!(entries[1].time, "10:01");
}

#[test]
fn test_unicode_line_separator() {
    let entries = parse_log_text("2024-03-01 10:00 ERROR a : x\u{2028}2024-03-01 10:01 WARN b : y");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].level, LogLevel::Error);
    assert_eq!(entries[1].level, LogLevel::Warn);
    assert_eq!(entries[1].sequence, 2);
}

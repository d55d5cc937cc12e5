//! CLI argument parsing and validation tests

use clap::Parser;
use survey_cli::{Args, Command};

fn parse(argv: &[&str]) -> Args {
    Args::try_parse_from(argv).expect("valid arguments")
}

#[test]
fn test_memory_mode_needs_no_key() {
    let args = parse(&["arena-survey", "--memory", "take"]);
    assert_eq!(args.command, Command::Take);
    assert!(args.validate().is_ok());
}

#[test]
fn test_remote_mode_requires_key() {
    let args = parse(&["arena-survey", "--supabase-url", "https://abc.supabase.co", "take"]);
    let err = args.validate().unwrap_err();
    assert!(err.contains("SUPABASE_ANON_KEY"));

    let args = parse(&[
        "arena-survey",
        "--supabase-url",
        "https://abc.supabase.co",
        "--supabase-anon-key",
        "anon",
        "take",
    ]);
    assert!(args.validate().is_ok());
}

#[test]
fn test_rejects_bad_url_and_level() {
    let args = parse(&[
        "arena-survey",
        "--supabase-url",
        "abc.supabase.co",
        "--supabase-anon-key",
        "anon",
        "take",
    ]);
    assert!(args.validate().unwrap_err().contains("SUPABASE_URL"));

    let args = parse(&["arena-survey", "--memory", "--log-level", "loud", "take"]);
    assert!(args.validate().unwrap_err().contains("LOG_LEVEL"));
}

#[test]
fn test_store_config_rounds_timeout_up() {
    let args = parse(&[
        "arena-survey",
        "--supabase-anon-key",
        "anon",
        "--request-timeout-ms",
        "1500",
        "take",
    ]);
    let config = args.store_config();
    assert_eq!(config.timeout_secs, 2);
    assert_eq!(config.api_key.as_deref(), Some("anon"));
    assert_eq!(config.rest_url(), "http://localhost:54321/rest/v1");
}

#[test]
fn test_dashboard_filters_from_flags() {
    let args = parse(&[
        "arena-survey",
        "--memory",
        "dashboard",
        "--days",
        "7",
        "--gender",
        "Mulher Trans",
    ]);
    let filters = args.command.dashboard_filters().unwrap();
    assert_eq!((filters.to - filters.from).num_days(), 7);
    assert_eq!(filters.gender.as_deref(), Some("Mulher Trans"));
    assert!(filters.event_type.is_none());

    assert!(Command::Take.dashboard_filters().is_none());
}

#[test]
fn test_counter_defaults() {
    let args = parse(&["arena-survey", "--memory", "counter"]);
    assert_eq!(
        args.command,
        Command::Counter {
            initial: 0,
            seconds: 30,
            interval_ms: 3000
        }
    );
}

#[test]
fn test_default_log_filter() {
    let filter = Args::default_log_filter("debug");
    assert!(filter.starts_with("arena_survey=debug,"));
    assert!(filter.contains("survey_service=debug"));
    assert!(filter.ends_with(",info"));
}

use std::fs;

use neoghidra::canonicalize_or_current;
use neoghidra::commands::{effective_config, severity_tag, GlobalOptions};
use neoghidra_core::Severity;
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_relative_to_cwd() {
    let cwd = std::env::current_dir().expect("cwd");
    let result = canonicalize_or_current("definitely/not/here.bin").expect("fallback");
    assert_eq!(result, cwd.join("definitely/not/here.bin"));
}

#[test]
fn flags_override_config_file() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("neo.json");
    fs::write(&file, r#"{"timeout_secs": 10, "analyzer_path": "/from/file"}"#).expect("write");
    let opts = GlobalOptions {
        config: Some(file),
        analyzer: Some("/from/flag".into()),
        timeout: Some(3),
        json: false,
    };
    let config = effective_config(&opts).expect("config");
    assert_eq!(config.timeout_secs, 3);
    assert_eq!(config.analyzer_path.as_deref(), Some(std::path::Path::new("/from/flag")));
}

#[test]
fn missing_config_file_is_an_error() {
    let opts = GlobalOptions { config: Some("/no/such/neo.yaml".into()), ..GlobalOptions::default() };
    let err = effective_config(&opts).unwrap_err();
    assert!(err.to_string().contains("Failed to read config"), "unexpected error: {err}");
}

#[test]
fn severity_tags() {
    assert_eq!(severity_tag(Severity::Info), "info");
    assert_eq!(severity_tag(Severity::Warning), "warn");
    assert_eq!(severity_tag(Severity::Error), "error");
}

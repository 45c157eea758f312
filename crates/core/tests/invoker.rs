#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use neoghidra_core::services::AnalysisService;
use neoghidra_core::{AnalysisCache, NeoError, NeoResult};
use tempfile::tempdir;

use common::{
    call_count, config_for, fake_analyzer, sample_payload, sample_result, write_binary,
    write_script,
};

fn service_for(dir: &Path, analyzer: &Path) -> AnalysisService {
    AnalysisService::new(config_for(dir, analyzer), AnalysisCache::shared())
}

#[tokio::test]
async fn successful_run_decodes_and_caches() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(tmp.path(), &sample_payload(), 0, &[]);
    let binary = write_binary(tmp.path(), "hello");
    let service = service_for(tmp.path(), &analyzer);

    let outcome = service.analyze(&binary).await.unwrap();
    assert_eq!(outcome.result, sample_result());
    assert!(outcome.advisories.is_empty());
    assert_eq!(service.cache().lock().get(&binary), Some(&sample_result()));
    assert_eq!(service.in_flight_count(), 0);

    // The analyzer was driven with the headless argument layout.
    let args = fs::read_to_string(tmp.path().join("calls.log")).unwrap();
    assert!(args.contains("-import"));
    assert!(args.contains(&binary.display().to_string()));
    assert!(args.contains("-overwrite"));
    assert!(args.contains("-postScript neoghidra_export.py"));
    assert!(tmp.path().join("projects/scripts/neoghidra_export.py").is_file());
}

#[tokio::test]
async fn ensure_uses_cache_after_first_analysis() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(tmp.path(), &sample_payload(), 0, &[]);
    let binary = write_binary(tmp.path(), "hello");
    let service = service_for(tmp.path(), &analyzer);

    service.ensure(&binary).await.unwrap();
    service.ensure(&binary).await.unwrap();
    assert_eq!(call_count(tmp.path()), 1);

    // Explicit analyze always re-runs.
    service.analyze(&binary).await.unwrap();
    assert_eq!(call_count(tmp.path()), 2);
}

#[tokio::test]
async fn stderr_lines_become_advisories() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(
        tmp.path(),
        &sample_payload(),
        0,
        &["WARN  Unable to find source", "Decompiler timed out on FUN_00401100"],
    );
    let binary = write_binary(tmp.path(), "hello");
    let outcome = service_for(tmp.path(), &analyzer).analyze(&binary).await.unwrap();
    assert_eq!(outcome.advisories, vec!["Decompiler timed out on FUN_00401100".to_string()]);
}

#[tokio::test]
async fn tool_reported_error_is_not_cached() {
    let tmp = tempdir().unwrap();
    let analyzer =
        fake_analyzer(tmp.path(), r#"{"error": true, "message": "bad input"}"#, 0, &[]);
    let binary = write_binary(tmp.path(), "hello");
    let service = service_for(tmp.path(), &analyzer);

    let err = service.analyze(&binary).await.unwrap_err();
    assert_eq!(err, NeoError::ToolReportedError { message: "bad input".into(), trace: None });
    assert!(service.cache().lock().is_empty());
}

#[tokio::test]
async fn nonzero_exit_without_payload_is_process_failed() {
    let tmp = tempdir().unwrap();
    let analyzer = tmp.path().join("analyzeHeadless");
    write_script(&analyzer, "echo 'ERROR Invalid project'\nexit 3");
    let binary = write_binary(tmp.path(), "hello");
    let service = service_for(tmp.path(), &analyzer);

    let err = service.analyze(&binary).await.unwrap_err();
    assert_eq!(err, NeoError::ProcessFailed(Some(3)));
    assert!(service.cache().lock().is_empty());
}

#[tokio::test]
async fn zero_exit_without_sentinels_is_malformed() {
    let tmp = tempdir().unwrap();
    let analyzer = tmp.path().join("analyzeHeadless");
    write_script(&analyzer, "echo 'INFO  done'");
    let binary = write_binary(tmp.path(), "hello");
    let err = service_for(tmp.path(), &analyzer).analyze(&binary).await.unwrap_err();
    assert!(matches!(err, NeoError::MalformedOutput(_)), "got {err:?}");
}

#[tokio::test]
async fn timeout_kills_the_analyzer_and_caches_nothing() {
    let tmp = tempdir().unwrap();
    let pidfile = tmp.path().join("analyzer.pid");
    let analyzer = tmp.path().join("analyzeHeadless");
    write_script(&analyzer, &format!("echo $$ > '{}'\nexec sleep 30", pidfile.display()));
    let binary = write_binary(tmp.path(), "hello");
    let mut config = config_for(tmp.path(), &analyzer);
    config.timeout_secs = 1;
    let service = AnalysisService::new(config, AnalysisCache::shared());

    let err = service.analyze(&binary).await.unwrap_err();
    assert!(matches!(err, NeoError::Timeout(_)), "got {err:?}");
    assert!(service.cache().lock().is_empty());
    assert_eq!(service.in_flight_count(), 0);

    let pid = fs::read_to_string(&pidfile).unwrap();
    assert!(!is_running(&pid), "analyzer process {pid} still running after timeout");
}

fn is_running(pid: &str) -> bool {
    Command::new("kill").args(["-0", pid.trim()]).status().unwrap().success()
}

#[tokio::test]
async fn timeout_kills_processes_the_analyzer_started() {
    // analyzeHeadless is a wrapper script; the JVM runs as its descendant.
    let tmp = tempdir().unwrap();
    let pidfile = tmp.path().join("worker.pid");
    let analyzer = tmp.path().join("analyzeHeadless");
    write_script(&analyzer, &format!("sleep 30 &
echo $! > '{}'
wait", pidfile.display()));
    let binary = write_binary(tmp.path(), "hello");
    let mut config = config_for(tmp.path(), &analyzer);
    config.timeout_secs = 1;
    let service = AnalysisService::new(config, AnalysisCache::shared());

    let err = service.analyze(&binary).await.unwrap_err();
    assert!(matches!(err, NeoError::Timeout(_)), "got {err:?}");

    let pid = fs::read_to_string(&pidfile).unwrap();
    assert!(!is_running(&pid), "analyzer worker {pid} still running after timeout");
}

#[tokio::test]
async fn timeout_covers_output_held_open_after_exit() {
    let tmp = tempdir().unwrap();
    let pidfile = tmp.path().join("worker.pid");
    let analyzer = tmp.path().join("analyzeHeadless");
    write_script(
        &analyzer,
        &format!("sleep 8 &
echo $! > '{}'
echo 'INFO  no payload'
exit 0", pidfile.display()),
    );
    let binary = write_binary(tmp.path(), "hello");
    let mut config = config_for(tmp.path(), &analyzer);
    config.timeout_secs = 1;
    let service = AnalysisService::new(config, AnalysisCache::shared());

    let started = Instant::now();
    let err = service.analyze(&binary).await.unwrap_err();
    let elapsed = started.elapsed();
    assert!(matches!(err, NeoError::Timeout(_)), "got {err:?}");
    assert!(elapsed < Duration::from_secs(5), "analyze returned after {elapsed:?}");
    assert!(service.cache().lock().is_empty());

    let pid = fs::read_to_string(&pidfile).unwrap();
    assert!(!is_running(&pid), "process {pid} holding the output still running");
}

#[tokio::test]
async fn concurrent_requests_share_one_invocation() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(tmp.path(), &sample_payload(), 1, &[]);
    let binary = write_binary(tmp.path(), "hello");
    let service = service_for(tmp.path(), &analyzer);

    let (a, b, c) =
        tokio::join!(service.analyze(&binary), service.analyze(&binary), service.ensure(&binary));
    assert_eq!(call_count(tmp.path()), 1);
    assert_eq!(a.unwrap().result, sample_result());
    assert_eq!(b.unwrap().result, sample_result());
    assert_eq!(c.unwrap().result, sample_result());
    assert_eq!(service.in_flight_count(), 0);
}

#[tokio::test]
async fn coalesced_failures_reach_every_caller() {
    let tmp = tempdir().unwrap();
    let analyzer = tmp.path().join("analyzeHeadless");
    let calls = tmp.path().join("calls.log");
    write_script(&analyzer, &format!("echo run >> '{}'\nsleep 1\nexit 2", calls.display()));
    let binary = write_binary(tmp.path(), "hello");
    let service = service_for(tmp.path(), &analyzer);

    let (a, b): (NeoResult<_>, NeoResult<_>) =
        tokio::join!(service.analyze(&binary), service.analyze(&binary));
    assert_eq!(a.unwrap_err(), NeoError::ProcessFailed(Some(2)));
    assert_eq!(b.unwrap_err(), NeoError::ProcessFailed(Some(2)));
    assert_eq!(call_count(tmp.path()), 1);
}

#[tokio::test]
async fn different_binaries_run_independently() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(tmp.path(), &sample_payload(), 0, &[]);
    let one = write_binary(tmp.path(), "one");
    let two = write_binary(tmp.path(), "two");
    let service = service_for(tmp.path(), &analyzer);

    let (a, b) = tokio::join!(service.analyze(&one), service.analyze(&two));
    a.unwrap();
    b.unwrap();
    assert_eq!(call_count(tmp.path()), 2);
    assert_eq!(service.cache().lock().len(), 2);
}

#[tokio::test]
async fn missing_binary_is_reported_before_spawning() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(tmp.path(), &sample_payload(), 0, &[]);
    let service = service_for(tmp.path(), &analyzer);
    let missing = tmp.path().join("missing");
    let err = service.analyze(&missing).await.unwrap_err();
    assert_eq!(err, NeoError::MissingBinary(missing));
    assert_eq!(call_count(tmp.path()), 0);
}

#[tokio::test]
async fn unusable_analyzer_is_tool_not_found() {
    let tmp = tempdir().unwrap();
    let not_executable = tmp.path().join("analyzeHeadless");
    fs::write(&not_executable, "#!/bin/sh\n").unwrap();
    let binary = write_binary(tmp.path(), "hello");
    let err = service_for(tmp.path(), &not_executable).analyze(&binary).await.unwrap_err();
    assert!(matches!(err, NeoError::ToolNotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_explicit_script_is_script_not_found() {
    let tmp = tempdir().unwrap();
    let analyzer = fake_analyzer(tmp.path(), &sample_payload(), 0, &[]);
    let binary = write_binary(tmp.path(), "hello");
    let mut config = config_for(tmp.path(), &analyzer);
    config.script_dir = Some(tmp.path().join("no_scripts"));
    let service = AnalysisService::new(config, AnalysisCache::shared());

    let err = service.analyze(&binary).await.unwrap_err();
    assert!(matches!(err, NeoError::ScriptNotFound(_)), "got {err:?}");
    assert_eq!(call_count(tmp.path()), 0);
}

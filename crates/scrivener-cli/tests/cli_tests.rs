//! Integration tests for the scrivener CLI commands

use scrivener_cli::cli::CliFormat;
use scrivener_cli::commands::{execute_run, stats::collect_stats, RunExit};
use scrivener_cli::{CliError, Config, Formatter};
use scrivener_domain::{Category, ExtractionRecord, FieldValue, PersistResult, SourceId};
use scrivener_store::WorkbookStore;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> Config {
    let toml = format!(
        r#"
        [llm]
        base_url = "http://127.0.0.1:9"
        api_key = "sk-test"

        [paths]
        input_dir = "{input}"
        output_dir = "{output}"

        [extractor]
        llm_timeout_secs = 2
        retry_backoff_ms = 0
        "#,
        input = dir.path().join("data").display(),
        output = dir.path().join("output").display(),
    );
    let path = dir.path().join("scrivener.toml");
    fs::write(&path, toml).unwrap();
    Config::load(Some(&path)).unwrap()
}

#[tokio::test]
async fn test_run_reports_unreadable_documents_and_logs_them() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    fs::create_dir_all(&config.paths.input_dir).unwrap();
    fs::write(config.paths.input_dir.join("broken.docx"), b"not a zip").unwrap();
    fs::write(config.paths.input_dir.join("readme.txt"), b"ignored").unwrap();

    let formatter = Formatter::new(CliFormat::Quiet, false);
    let exit = execute_run(&config, &formatter).await.unwrap();
    assert_eq!(exit, RunExit::Completed);
    assert_eq!(exit.code(), 0);

    let log = fs::read_to_string(config.run_log_path()).unwrap();
    assert!(log.contains("| broken.docx | - | format_error |"));
    assert!(log.contains("Run Summary"));
    assert!(!log.contains("readme.txt"));
}

#[tokio::test]
async fn test_run_without_api_key_is_config_error() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.llm.api_key = None;

    let err = execute_run(&config, &Formatter::new(CliFormat::Quiet, false)).await.unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_run_with_missing_input_dir_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let err = execute_run(&config, &Formatter::new(CliFormat::Quiet, false)).await.unwrap_err();
    assert!(matches!(err, CliError::Pipeline(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_stats_counts_rows_per_workbook() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let registry = Arc::new(config.registry().unwrap());
    let store = WorkbookStore::new(config.layout().unwrap(), registry.clone());

    let schema = registry.schema_for(Category::OfficialDocument).unwrap();
    for name in ["a.docx", "b.docx"] {
        let record = ExtractionRecord::from_schema(SourceId::new(name), schema, |_| FieldValue::ok("x"));
        assert!(matches!(store.persist(&record), PersistResult::Appended { .. }));
    }

    let stats = collect_stats(&config).unwrap();
    assert_eq!(stats.len(), 3);
    let official = stats.iter().find(|s| s.category == "OfficialDocument").unwrap();
    assert_eq!(official.rows, Some(2));
    let policy = stats.iter().find(|s| s.category == "PolicyDocument").unwrap();
    assert_eq!(policy.rows, None);
}

#[test]
fn test_run_exit_codes() {
    assert_eq!(RunExit::Completed.code(), 0);
    assert_eq!(RunExit::Halted.code(), 1);
    assert_eq!(RunExit::Cancelled.code(), 130);
}

//! Run command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::run_log::RunLog;
use scrivener_extractor::{Classifier, FieldExtractor};
use scrivener_ingest::DocumentReader;
use scrivener_llm::OpenAiProvider;
use scrivener_pipeline::{Orchestrator, RunReport};
use scrivener_store::WorkbookStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How a run ended, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Every file attempted
    Completed,
    /// Stopped by an authentication failure
    Halted,
    /// Stopped by Ctrl+C
    Cancelled,
}

impl RunExit {
    /// Process exit code
    pub fn code(self) -> i32 {
        match self {
            RunExit::Completed => 0,
            RunExit::Halted => 1,
            RunExit::Cancelled => 130,
        }
    }

    /// Classify a finished report
    pub fn of(report: &RunReport) -> Self {
        if report.halted.is_some() {
            RunExit::Halted
        } else if report.cancelled {
            RunExit::Cancelled
        } else {
            RunExit::Completed
        }
    }
}

/// Execute the run command.
///
/// `config` must already carry the environment and flag overrides.
pub async fn execute_run(config: &Config, formatter: &Formatter) -> Result<RunExit> {
    config.validate_for_run()?;

    let registry = Arc::new(config.registry()?);
    let prompts = Arc::new(config.prompt_set()?);
    let layout = config.layout()?;
    let api_key = config.llm.api_key.clone().unwrap_or_default();
    let llm = Arc::new(OpenAiProvider::new(
        config.llm.base_url.clone(),
        api_key,
        config.llm.model.clone(),
        config.extractor.llm_timeout(),
    )?);

    let reader = DocumentReader::new();
    if !reader.antiword_available() {
        warn!("antiword not found; .doc files will be reported as format errors");
    }

    let orchestrator = Orchestrator::new(
        Arc::new(reader),
        Classifier::new(llm.clone(), prompts.clone(), config.extractor.clone()),
        FieldExtractor::new(llm, registry.clone(), prompts, config.extractor.clone()),
        Arc::new(WorkbookStore::new(layout, registry)),
        config.pipeline.clone(),
    );

    let mut run_log = RunLog::open(&config.run_log_path())?;
    run_log.start(&config.paths.input_dir)?;
    info!(model = %config.llm.model, log = %run_log.path().display(), "run log opened");

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested; finishing in-flight files");
            ctrl_c.cancel();
        }
    });

    let report = orchestrator
        .run(&config.paths.input_dir, &cancel, |outcome| {
            if let Err(e) = run_log.record(outcome) {
                warn!("cannot write run log: {}", e);
            }
            if let Some(line) = formatter.outcome_line(outcome) {
                println!("{}", line);
            }
        })
        .await?;

    run_log.finish(&report)?;
    println!("{}", formatter.format_report(&report)?);
    Ok(RunExit::of(&report))
}

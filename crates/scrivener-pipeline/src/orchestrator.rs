//! Per-file state machine driving a whole run

use crate::{PipelineConfig, PipelineError, RunReport};
use futures_util::stream::{self, StreamExt};
use scrivener_domain::{
    Category, Document, FileOutcome, FileStatus, PersistResult, SourceId, Stage, TextExtractor,
};
use scrivener_extractor::{Classifier, Extraction, ExtractorError, FieldExtractor};
use scrivener_ingest::scan_documents;
use scrivener_llm::LlmProvider;
use scrivener_store::WorkbookStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives every discovered file through
/// read → classify → extract → persist
///
/// Each file ends in exactly one [`FileStatus`]. Per-file failures never
/// stop the run; an authentication failure does, and every file not yet
/// started is then reported as [`FileStatus::NotStarted`].
///
/// # Examples
///
/// ```no_run
/// use scrivener_domain::SchemaRegistry;
/// use scrivener_extractor::{Classifier, ExtractorConfig, FieldExtractor, PromptSet};
/// use scrivener_ingest::DocumentReader;
/// use scrivener_llm::MockProvider;
/// use scrivener_pipeline::{Orchestrator, PipelineConfig};
/// use scrivener_store::{WorkbookLayout, WorkbookStore};
/// use std::path::Path;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let llm = Arc::new(MockProvider::new("Unknown"));
/// let registry = Arc::new(SchemaRegistry::builtin());
/// let prompts = Arc::new(PromptSet::default());
/// let config = ExtractorConfig::default();
///
/// let orchestrator = Orchestrator::new(
///     Arc::new(DocumentReader::new()),
///     Classifier::new(llm.clone(), prompts.clone(), config.clone()),
///     FieldExtractor::new(llm, registry.clone(), prompts, config),
///     Arc::new(WorkbookStore::new(WorkbookLayout::new("output"), registry)),
///     PipelineConfig::default(),
/// );
/// let report = orchestrator
///     .run(Path::new("data"), &CancellationToken::new(), |outcome| println!("{}", outcome.status))
///     .await?;
/// println!("{}", report.summary_text());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<T, L: LlmProvider + ?Sized> {
    reader: Arc<T>,
    classifier: Classifier<L>,
    extractor: FieldExtractor<L>,
    store: Arc<WorkbookStore>,
    config: PipelineConfig,
}

impl<T, L> Orchestrator<T, L>
where
    T: TextExtractor + 'static,
    L: LlmProvider + ?Sized + 'static,
{
    /// Assemble an orchestrator from its collaborators
    pub fn new(
        reader: Arc<T>,
        classifier: Classifier<L>,
        extractor: FieldExtractor<L>,
        store: Arc<WorkbookStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            reader,
            classifier,
            extractor,
            store,
            config,
        }
    }

    /// Run configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every work item under `input_dir`
    ///
    /// `observer` sees each outcome once, in discovery order, as soon as it
    /// and all earlier outcomes are known. Cancelling `cancel` lets in-flight
    /// files finish and starts no new ones.
    ///
    /// # Errors
    ///
    /// Only fails before processing starts: invalid configuration or an
    /// unreadable input directory.
    pub async fn run<F>(
        &self,
        input_dir: &Path,
        cancel: &CancellationToken,
        mut observer: F,
    ) -> Result<RunReport, PipelineError>
    where
        F: FnMut(&FileOutcome),
    {
        self.config.validate().map_err(PipelineError::Config)?;
        let paths = scan_documents(input_dir, self.config.recursive)?;
        info!(
            input = %input_dir.display(),
            files = paths.len(),
            workers = self.config.workers,
            "starting run"
        );

        let halt = Halt::default();
        let mut report = RunReport::new(paths.len());

        let mut outcomes = stream::iter(paths)
            .map(|path| self.process(input_dir, path, cancel, &halt))
            .buffered(self.config.workers);

        while let Some(outcome) = outcomes.next().await {
            observer(&outcome);
            report.push(outcome);
        }

        report.halted = halt.reason();
        report.cancelled = report.halted.is_none() && cancel.is_cancelled() && report.summary.not_started > 0;

        info!(
            succeeded = report.summary.succeeded(),
            skipped = report.summary.skipped(),
            failed = report.summary.failed(),
            not_started = report.summary.not_started,
            "run finished"
        );
        Ok(report)
    }

    async fn process(&self, root: &Path, path: PathBuf, cancel: &CancellationToken, halt: &Halt) -> FileOutcome {
        let source = SourceId::from_paths(root, &path).unwrap_or_else(|| SourceId::new(path.to_string_lossy()));
        let outcome = |status, stage| FileOutcome::new(path.clone(), source.clone(), status, stage);

        if cancel.is_cancelled() || halt.is_triggered() {
            debug!(source = %source, "not started");
            return outcome(FileStatus::NotStarted, Stage::Discovered);
        }

        let document = match self.read(&path, source.clone()).await {
            Ok(document) => document,
            Err(message) => {
                warn!(source = %source, "cannot read document: {}", message);
                return outcome(FileStatus::FormatError, Stage::Discovered).with_message(message);
            }
        };
        debug!(source = %source, chars = document.char_len(), "text extracted");

        let classification = match self.classifier.classify(&document.text).await {
            Ok(classification) => classification,
            Err(e) => {
                let message = model_failure(e, halt);
                return outcome(FileStatus::ExtractionFailed, Stage::TextExtracted).with_message(message);
            }
        };

        let category = classification.category;
        if category == Category::Unknown {
            let reason = classification.rationale.unwrap_or_else(|| "unrecognised document".to_string());
            info!(source = %source, "skipping unknown document: {}", reason);
            return outcome(FileStatus::SkippedUnknown, Stage::Classified)
                .with_category(category)
                .with_message(reason);
        }
        info!(source = %source, category = %category, "classified");

        let record = match self.extractor.extract(&document, category).await {
            Ok(Extraction::Record(record)) => record,
            Ok(Extraction::Failed(failure)) => {
                warn!(source = %source, category = %category, "extraction failed: {}", failure);
                return outcome(FileStatus::ExtractionFailed, Stage::Classified)
                    .with_category(category)
                    .with_message(failure.to_string());
            }
            Err(e) => {
                let message = model_failure(e, halt);
                return outcome(FileStatus::ExtractionFailed, Stage::Classified)
                    .with_category(category)
                    .with_message(message);
            }
        };

        let flagged = record.flagged_fields();
        if !flagged.is_empty() {
            warn!(source = %source, fields = ?flagged, "flagged field values");
        }

        let store = Arc::clone(&self.store);
        let result = task::spawn_blocking(move || store.persist(&record))
            .await
            .unwrap_or_else(|e| PersistResult::Failed(format!("persist task failed: {}", e)));

        let done = match result {
            PersistResult::Appended { row } => {
                info!(source = %source, category = %category, row, "persisted");
                outcome(FileStatus::Appended, Stage::Persisted)
            }
            PersistResult::Duplicate => {
                info!(source = %source, category = %category, "already persisted");
                outcome(FileStatus::Duplicate, Stage::Persisted)
            }
            PersistResult::Failed(reason) => {
                outcome(FileStatus::PersistFailed, Stage::Extracted).with_message(reason)
            }
        };
        done.with_category(category).with_flagged(flagged)
    }

    /// Read text and file metadata on the blocking pool
    async fn read(&self, path: &Path, source: SourceId) -> Result<Document, String> {
        let reader = Arc::clone(&self.reader);
        let path = path.to_path_buf();
        task::spawn_blocking(move || {
            let text = reader.extract_text(&path).map_err(|e| e.to_string())?;
            let metadata = std::fs::metadata(&path).ok();
            let size = metadata.as_ref().map_or(text.len() as u64, |m| m.len());
            let modified = metadata.and_then(|m| m.modified().ok());
            Ok(Document::new(path, source, text, size, modified))
        })
        .await
        .map_err(|e| format!("text extraction task failed: {}", e))?
    }
}

/// Log a failed model step; authentication failures halt the run
fn model_failure(e: ExtractorError, halt: &Halt) -> String {
    let message = e.to_string();
    if matches!(e, ExtractorError::Auth(_)) {
        error!("halting run: {}", message);
        halt.trigger(&message);
    } else {
        warn!("model step failed: {}", message);
    }
    message
}

/// Run-wide stop triggered by a fatal model error
#[derive(Default)]
struct Halt {
    token: CancellationToken,
    reason: Mutex<Option<String>>,
}

impl Halt {
    fn trigger(&self, reason: &str) {
        let mut slot = self.reason.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.get_or_insert_with(|| reason.to_string());
        self.token.cancel();
    }

    fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    fn reason(&self) -> Option<String> {
        self.reason.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

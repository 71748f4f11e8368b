//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use scrivener_domain::{FieldKind, FieldSchema, FileOutcome, FileStatus, RunSummary};
use scrivener_pipeline::RunReport;
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Row count of one workbook, for `stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookStat {
    /// Category label
    pub category: String,
    /// Workbook path
    pub path: String,
    /// Data rows; `None` when the workbook does not exist yet
    pub rows: Option<usize>,
}

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self { format, color_enabled }
    }

    /// Selected format.
    pub fn format(&self) -> CliFormat {
        self.format
    }

    /// One progress line, printed as each file completes (table format only).
    pub fn outcome_line(&self, outcome: &FileOutcome) -> Option<String> {
        if self.format != CliFormat::Table {
            return None;
        }
        let (glyph, color) = status_style(outcome.status);
        let category = outcome.category.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let detail = outcome
            .message
            .as_deref()
            .filter(|_| outcome.status.is_failure())
            .map(|m| format!(": {}", m))
            .unwrap_or_default();
        Some(self.colorize(&format!("{} {}{} {}{}", glyph, outcome.source, category, outcome.status, detail), color))
    }

    /// Format the end-of-run report.
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let outcomes: Vec<serde_json::Value> = report
                    .outcomes
                    .iter()
                    .map(|o| {
                        json!({
                            "source": o.source.as_str(),
                            "path": o.path.display().to_string(),
                            "category": o.category.map(|c| c.as_str()),
                            "status": o.status.as_str(),
                            "stage": o.stage.as_str(),
                            "message": o.message,
                            "flagged": o.flagged,
                        })
                    })
                    .collect();
                let value = json!({
                    "summary": summary_json(&report.summary),
                    "halted": report.halted,
                    "cancelled": report.cancelled,
                    "outcomes": outcomes,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            CliFormat::Table => {
                let s = &report.summary;
                let mut builder = Builder::default();
                builder.push_record(["Total", "Succeeded", "Skipped", "Failed", "Not started"]);
                builder.push_record([
                    s.discovered.to_string(),
                    s.succeeded().to_string(),
                    s.skipped().to_string(),
                    s.failed().to_string(),
                    s.not_started.to_string(),
                ]);
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let mut out = vec![table.to_string(), report.summary_text()];
                if let Some(reason) = &report.halted {
                    out.push(self.error(&format!("Run halted: {}", reason)));
                } else if report.cancelled {
                    out.push(self.warning("Run cancelled"));
                }
                Ok(out.join("\n"))
            }
            CliFormat::Quiet => {
                let s = &report.summary;
                Ok(format!(
                    "total={} succeeded={} skipped={} failed={}",
                    s.discovered,
                    s.succeeded(),
                    s.skipped(),
                    s.failed()
                ))
            }
        }
    }

    /// Format field schemas.
    pub fn format_schemas(&self, schemas: &[&FieldSchema]) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let value: Vec<serde_json::Value> = schemas
                    .iter()
                    .map(|schema| {
                        let fields: Vec<serde_json::Value> = schema
                            .fields()
                            .iter()
                            .map(|f| {
                                let (options, fallback) = match &f.kind {
                                    FieldKind::Choice { options, fallback } => (options.clone(), fallback.clone()),
                                    _ => (Vec::new(), None),
                                };
                                json!({
                                    "name": f.name,
                                    "kind": f.kind.as_str(),
                                    "required": f.required,
                                    "description": f.description,
                                    "options": options,
                                    "fallback": fallback,
                                })
                            })
                            .collect();
                        json!({ "category": schema.category().as_str(), "fields": fields })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&value)?)
            }
            CliFormat::Table => {
                let mut sections = Vec::new();
                for schema in schemas {
                    let mut builder = Builder::default();
                    builder.push_record(["Field", "Kind", "Required", "Values"]);
                    for f in schema.fields() {
                        let values = match &f.kind {
                            FieldKind::Choice { options, fallback } => {
                                let mut values = options.join("、");
                                if let Some(fallback) = fallback {
                                    values.push_str(&format!(" (fallback {})", fallback));
                                }
                                values
                            }
                            _ => String::new(),
                        };
                        builder.push_record([
                            f.name.clone(),
                            f.kind.as_str().to_string(),
                            if f.required { "yes" } else { "" }.to_string(),
                            values,
                        ]);
                    }
                    let mut table = builder.build();
                    table.with(Style::rounded());
                    sections.push(format!("{}\n{}", self.colorize(schema.category().as_str(), "cyan"), table));
                }
                Ok(sections.join("\n\n"))
            }
            CliFormat::Quiet => Ok(schemas
                .iter()
                .map(|s| format!("{}: {}", s.category(), s.header().join(",")))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format per-workbook row counts.
    pub fn format_stats(&self, stats: &[WorkbookStat]) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let value: Vec<serde_json::Value> = stats
                    .iter()
                    .map(|s| json!({ "category": s.category, "path": s.path, "rows": s.rows }))
                    .collect();
                Ok(serde_json::to_string_pretty(&value)?)
            }
            CliFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Category", "Workbook", "Rows"]);
                for s in stats {
                    let rows = s.rows.map_or_else(|| "-".to_string(), |r| r.to_string());
                    builder.push_record([s.category.clone(), s.path.clone(), rows]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
            CliFormat::Quiet => Ok(stats
                .iter()
                .map(|s| format!("{} {}", s.category, s.rows.unwrap_or(0)))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn status_style(status: FileStatus) -> (&'static str, &'static str) {
    match status {
        FileStatus::Appended => ("✓", "green"),
        FileStatus::Duplicate => ("=", "cyan"),
        FileStatus::SkippedUnknown => ("-", "yellow"),
        FileStatus::NotStarted => ("·", "magenta"),
        FileStatus::ExtractionFailed | FileStatus::PersistFailed | FileStatus::FormatError => ("✗", "red"),
    }
}

fn summary_json(s: &RunSummary) -> serde_json::Value {
    let by_category: serde_json::Map<String, serde_json::Value> = s
        .appended_by_category
        .iter()
        .map(|(c, n)| (c.as_str().to_string(), json!(n)))
        .collect();
    json!({
        "discovered": s.discovered,
        "processed": s.processed,
        "succeeded": s.succeeded(),
        "skipped": s.skipped(),
        "failed": s.failed(),
        "appended": s.appended,
        "duplicates": s.duplicates,
        "skipped_unknown": s.skipped_unknown,
        "extraction_failed": s.extraction_failed,
        "persist_failed": s.persist_failed,
        "format_errors": s.format_errors,
        "not_started": s.not_started,
        "appended_by_category": by_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_domain::{Category, SchemaRegistry, SourceId, Stage};
    use std::path::PathBuf;

    fn outcome(status: FileStatus) -> FileOutcome {
        FileOutcome::new(PathBuf::from("in/a.docx"), SourceId::new("a.docx"), status, Stage::Persisted)
            .with_category(Category::PolicyDocument)
    }

    #[test]
    fn test_outcome_line_plain() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let line = formatter.outcome_line(&outcome(FileStatus::Appended)).unwrap();
        assert_eq!(line, "✓ a.docx [PolicyDocument] appended");

        let failed = outcome(FileStatus::PersistFailed).with_message("disk full");
        assert_eq!(
            formatter.outcome_line(&failed).unwrap(),
            "✗ a.docx [PolicyDocument] persist_failed: disk full"
        );
    }

    #[test]
    fn test_outcome_line_only_in_table_mode() {
        let formatter = Formatter::new(CliFormat::Json, false);
        assert!(formatter.outcome_line(&outcome(FileStatus::Appended)).is_none());
    }

    #[test]
    fn test_schema_formats() {
        let registry = SchemaRegistry::builtin();
        let schemas: Vec<_> = registry.schemas().collect();

        let table = Formatter::new(CliFormat::Table, false).format_schemas(&schemas).unwrap();
        assert!(table.contains("PolicyDocument"));
        assert!(table.contains("IssuingAuthority"));

        let json = Formatter::new(CliFormat::Json, false).format_schemas(&schemas).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);

        let quiet = Formatter::new(CliFormat::Quiet, false).format_schemas(&schemas).unwrap();
        assert!(quiet.lines().all(|l| l.ends_with("SourceDocument")));
    }

    #[test]
    fn test_stats_formats() {
        let stats = vec![
            WorkbookStat { category: "PolicyDocument".into(), path: "out/p.xlsx".into(), rows: Some(3) },
            WorkbookStat { category: "MeetingMaterial".into(), path: "out/m.xlsx".into(), rows: None },
        ];
        let table = Formatter::new(CliFormat::Table, false).format_stats(&stats).unwrap();
        assert!(table.contains("out/p.xlsx"));
        let quiet = Formatter::new(CliFormat::Quiet, false).format_stats(&stats).unwrap();
        assert_eq!(quiet, "PolicyDocument 3\nMeetingMaterial 0");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(CliFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}

//! What a run produced

use scrivener_domain::{FileOutcome, RunSummary};

/// Result of one pipeline run
///
/// Outcomes are in discovery order; `summary` is accumulated from them.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Totals
    pub summary: RunSummary,

    /// One outcome per discovered file
    pub outcomes: Vec<FileOutcome>,

    /// Reason the run halted early (authentication failure)
    pub halted: Option<String>,

    /// Cancelled before every file started
    pub cancelled: bool,
}

impl RunReport {
    pub(crate) fn new(discovered: usize) -> Self {
        Self {
            summary: RunSummary::new(discovered),
            outcomes: Vec::with_capacity(discovered),
            halted: None,
            cancelled: false,
        }
    }

    pub(crate) fn push(&mut self, outcome: FileOutcome) {
        self.summary.record(&outcome);
        self.outcomes.push(outcome);
    }

    /// Whether every discovered file was attempted
    pub fn is_complete(&self) -> bool {
        self.halted.is_none() && !self.cancelled
    }

    /// Human-readable summary including the halt or cancel note
    pub fn summary_text(&self) -> String {
        let mut text = self.summary.summary();
        if let Some(reason) = &self.halted {
            text.push_str(&format!("\nRun halted: {}", reason));
        } else if self.cancelled {
            text.push_str("\nRun cancelled");
        }
        text
    }
}

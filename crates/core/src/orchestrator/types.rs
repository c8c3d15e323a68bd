//! Types for the batch orchestrator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::processor::{ArchiveOutcome, Disposition};

/// Errors that abort a whole batch run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A directory of the layout could not be created.
    #[error("failed to prepare directories: {0}")]
    Layout(#[source] std::io::Error),

    /// The inbox could not be listed.
    #[error("failed to scan inbox {path}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReport {
    /// Original file name in the inbox.
    pub archive: String,
    /// `<batch_id>_<sequence>`.
    pub tag: String,
    pub disposition: Disposition,
    /// Final location, when the archive left the inbox.
    pub destination: Option<PathBuf>,
    /// Present when processing completed, or partially when tickets were
    /// created before the archive failed.
    pub outcome: Option<ArchiveOutcome>,
    /// Failure reason, including its causes.
    pub error: Option<String>,
}

/// Aggregate result of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub archives: Vec<ArchiveReport>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            ..Self::default()
        }
    }

    /// Records a report and updates the counters.
    pub fn record(&mut self, report: ArchiveReport) {
        match report.disposition {
            Disposition::Success => self.succeeded += 1,
            Disposition::Failed => self.failed += 1,
        }
        self.archives.push(report);
    }

    pub fn total(&self) -> usize {
        self.archives.len()
    }

    /// Tickets created across all archives, including those of failed ones.
    pub fn tickets_created(&self) -> usize {
        self.archives
            .iter()
            .filter_map(|r| r.outcome.as_ref())
            .map(|o| o.tickets_created)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(disposition: Disposition, tickets: usize) -> ArchiveReport {
        ArchiveReport {
            archive: "a.zip".to_string(),
            tag: "20251217_010203_001".to_string(),
            disposition,
            destination: None,
            outcome: Some(ArchiveOutcome {
                tickets_created: tickets,
                ..ArchiveOutcome::default()
            }),
            error: None,
        }
    }

    #[test]
    fn test_record_counts() {
        let mut summary = BatchSummary::new("20251217_010203");
        summary.record(report(Disposition::Success, 2));
        summary.record(report(Disposition::Failed, 0));
        summary.record(report(Disposition::Success, 1));

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.tickets_created(), 3);
    }

    #[test]
    fn test_summary_serialization() {
        let mut summary = BatchSummary::new("b");
        summary.record(report(Disposition::Failed, 0));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"disposition\":\"failed\""));

        let parsed: BatchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}

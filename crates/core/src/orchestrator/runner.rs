//! Batch orchestrator implementation.

use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info, warn};

use crate::config::{Config, PathsConfig};
use crate::disposition::{move_to_done, move_to_failed};
use crate::layout::DirectoryLayout;
use crate::metrics;
use crate::processor::{
    Archive, ArchiveError, ArchiveOutcome, ArchiveProcessor, ArchiveStage, Disposition,
};
use crate::ticketing::TicketingClient;

use super::discovery::{batch_id, discover_archives};
use super::types::{ArchiveReport, BatchSummary, OrchestratorError};

/// The batch orchestrator - drains the inbox through the archive processor.
pub struct BatchOrchestrator {
    paths: PathsConfig,
    processor: ArchiveProcessor,
}

impl BatchOrchestrator {
    /// Creates an orchestrator for `config`, submitting through `client`.
    pub fn new(config: &Config, client: Arc<dyn TicketingClient>) -> Self {
        Self::with_processor(
            config.paths.clone(),
            ArchiveProcessor::new(config.site.clone(), client),
        )
    }

    pub fn with_processor(paths: PathsConfig, processor: ArchiveProcessor) -> Self {
        Self { paths, processor }
    }

    /// Run one batch against the layout for the current local time.
    pub async fn run_once(&self) -> Result<BatchSummary, OrchestratorError> {
        let now = Local::now();
        let layout = DirectoryLayout::resolve(&self.paths, &now);
        layout.ensure().map_err(OrchestratorError::Layout)?;

        self.run_batch(&layout, &batch_id(&now)).await
    }

    /// Process every archive currently in `layout.inbox`.
    ///
    /// Archive failures are contained: each ends up in a report and the next
    /// archive is processed regardless.
    pub async fn run_batch(
        &self,
        layout: &DirectoryLayout,
        batch_id: &str,
    ) -> Result<BatchSummary, OrchestratorError> {
        info!(batch_id, "Run started");

        let paths =
            discover_archives(&layout.inbox).map_err(|source| OrchestratorError::Discovery {
                path: layout.inbox.clone(),
                source,
            })?;

        let mut summary = BatchSummary::new(batch_id);

        if paths.is_empty() {
            info!(batch_id, inbox = %layout.inbox.display(), "No archives found");
            info!(batch_id, ok = 0, failed = 0, "Run finished");
            return Ok(summary);
        }

        info!(batch_id, count = paths.len(), "Archives found");

        for (i, path) in paths.into_iter().enumerate() {
            let archive = Archive::new(path, batch_id, i + 1);
            let report = self.handle_archive(&archive, layout).await;

            metrics::ARCHIVES_PROCESSED
                .with_label_values(&[report.disposition.as_str()])
                .inc();
            summary.record(report);
        }

        info!(
            batch_id,
            ok = summary.succeeded,
            failed = summary.failed,
            tickets = summary.tickets_created(),
            "Run finished"
        );

        Ok(summary)
    }

    async fn handle_archive(&self, archive: &Archive, layout: &DirectoryLayout) -> ArchiveReport {
        let tag = archive.tag();
        info!(
            tag = %tag,
            archive = %archive.file_name(),
            stage = ?ArchiveStage::Discovered,
            "Processing archive"
        );

        match self.processor.process(archive, &layout.work).await {
            Ok(outcome) => match move_to_done(archive, &layout.done).await {
                Ok(destination) => {
                    info!(
                        tag = %tag,
                        stage = ?ArchiveStage::Disposed(Disposition::Success),
                        destination = %destination.display(),
                        "Archive moved to done"
                    );
                    ArchiveReport {
                        archive: archive.file_name(),
                        tag,
                        disposition: Disposition::Success,
                        destination: Some(destination),
                        outcome: Some(outcome),
                        error: None,
                    }
                }
                Err(e) => {
                    let reason = error_chain(&e);
                    error!(tag = %tag, error = %reason, "Failed to move archive to done");
                    self.quarantine(archive, &layout.failed, Some(outcome), reason)
                        .await
                }
            },
            Err(e) => {
                let reason = error_chain(&e);
                error!(tag = %tag, stage = ?e.stage(), error = %reason, "Archive failed");

                let partial = match &e {
                    ArchiveError::TicketCreation { created, .. } if !created.is_empty() => {
                        warn!(
                            tag = %tag,
                            tickets = ?created,
                            "Tickets created before the failure remain on the remote system"
                        );
                        Some(ArchiveOutcome {
                            tickets_created: created.len(),
                            ticket_numbers: created.clone(),
                            ..ArchiveOutcome::default()
                        })
                    }
                    _ => None,
                };

                self.quarantine(archive, &layout.failed, partial, reason)
                    .await
            }
        }
    }

    /// Best-effort move to the failed area. A failed move leaves the archive
    /// in the inbox and is only logged.
    async fn quarantine(
        &self,
        archive: &Archive,
        failed_dir: &Path,
        outcome: Option<ArchiveOutcome>,
        reason: String,
    ) -> ArchiveReport {
        let tag = archive.tag();
        let destination = match move_to_failed(archive, failed_dir).await {
            Ok(destination) => {
                info!(
                    tag = %tag,
                    stage = ?ArchiveStage::Disposed(Disposition::Failed),
                    destination = %destination.display(),
                    "Archive moved to failed"
                );
                Some(destination)
            }
            Err(e) => {
                warn!(tag = %tag, error = %error_chain(&e), "Failed to quarantine archive");
                None
            }
        };

        ArchiveReport {
            archive: archive.file_name(),
            tag,
            disposition: Disposition::Failed,
            destination,
            outcome,
            error: Some(reason),
        }
    }
}

/// `error: cause: cause ...`
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

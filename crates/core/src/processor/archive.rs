//! Archive processor implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::evidence::EvidenceIndex;
use crate::manifest::load_manifest;
use crate::mapper::map_offence;
use crate::metrics;
use crate::ticketing::{AttachmentDirection, TicketingClient};

use super::attachments::upload_event_evidence;
use super::types::{Archive, ArchiveError, ArchiveOutcome, ArchiveStage};
use super::validate::validate_offence;

/// Processes one evidence archive end to end.
///
/// The working directory is exclusive to the archive and is removed whether
/// processing succeeds or fails.
pub struct ArchiveProcessor {
    site: SiteConfig,
    client: Arc<dyn TicketingClient>,
}

impl ArchiveProcessor {
    /// Creates a processor submitting tickets for `site` through `client`.
    pub fn new(site: SiteConfig, client: Arc<dyn TicketingClient>) -> Self {
        Self { site, client }
    }

    /// Extract, parse, submit and upload for one archive.
    pub async fn process(
        &self,
        archive: &Archive,
        work_root: &Path,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let run_dir = archive.work_dir(work_root);
        prepare_workspace(&run_dir).await?;

        let result = self.process_in(archive, &run_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&run_dir).await {
            warn!(dir = %run_dir.display(), error = %e, "Failed to remove work directory");
        }

        result
    }

    async fn process_in(
        &self,
        archive: &Archive,
        run_dir: &Path,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let tag = archive.tag();

        extract_archive(&archive.path, run_dir).await?;
        debug!(tag = %tag, stage = ?ArchiveStage::Extracted, "Archive extracted");

        let manifest = load_manifest(run_dir)?;
        let total = manifest.offences.len();
        debug!(
            tag = %tag,
            stage = ?ArchiveStage::ManifestParsed,
            manifest = %manifest.path.display(),
            offences = total,
            "Manifest parsed"
        );

        let index = EvidenceIndex::build(run_dir);
        debug!(tag = %tag, images = index.len(), "Evidence indexed");

        let mut outcome = ArchiveOutcome {
            offences_total: total,
            ..ArchiveOutcome::default()
        };

        for record in &manifest.offences {
            let offence = match validate_offence(record) {
                Ok(offence) => offence,
                Err(rejection) => {
                    outcome.offences_skipped += 1;
                    metrics::OFFENCES_SKIPPED
                        .with_label_values(&[rejection.reason()])
                        .inc();
                    warn!(
                        tag = %tag,
                        offence = record.index,
                        vrm = record.vrm.as_deref().unwrap_or(""),
                        reason = %rejection,
                        "Skipping offence"
                    );
                    continue;
                }
            };

            let fields = map_offence(&offence, &self.site, Local::now().naive_local());
            let ticket = self.client.create_ticket(&fields).await.map_err(|source| {
                ArchiveError::TicketCreation {
                    offence: offence.index,
                    vrm: offence.vrm.clone(),
                    created: outcome.ticket_numbers.clone(),
                    source,
                }
            })?;

            outcome.tickets_created += 1;
            metrics::TICKETS_CREATED.inc();
            info!(
                tag = %tag,
                ticket_no = %ticket.ticket_no,
                vrm = %offence.vrm,
                "Ticket created (offence {}/{})",
                offence.index,
                total
            );

            for (event, direction) in [
                (&offence.entrance, AttachmentDirection::Entry),
                (&offence.exit, AttachmentDirection::Exit),
            ] {
                outcome.attachments += upload_event_evidence(
                    self.client.as_ref(),
                    &index,
                    &ticket.ticket_no,
                    &offence.vrm,
                    event,
                    direction,
                )
                .await;
            }

            outcome.ticket_numbers.push(ticket.ticket_no);
        }

        info!(
            tag = %tag,
            stage = ?ArchiveStage::OffencesSubmitted,
            tickets_created = outcome.tickets_created,
            skipped = outcome.offences_skipped,
            uploads_ok = outcome.attachments.uploaded,
            missing = outcome.attachments.missing,
            failed = outcome.attachments.failed,
            "Archive summary"
        );

        Ok(outcome)
    }
}

/// Start from an empty directory, discarding leftovers of a crashed attempt.
async fn prepare_workspace(run_dir: &Path) -> Result<(), ArchiveError> {
    let workspace_err = |source| ArchiveError::Workspace {
        path: run_dir.to_path_buf(),
        source,
    };

    match tokio::fs::remove_dir_all(run_dir).await {
        Ok(()) => debug!(dir = %run_dir.display(), "Removed stale work directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(workspace_err(e)),
    }

    tokio::fs::create_dir_all(run_dir).await.map_err(workspace_err)
}

/// Unpack a zip archive into `dest`.
async fn extract_archive(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let archive_path = archive.to_path_buf();
    let dest: PathBuf = dest.to_path_buf();
    let extraction_err = |reason: String| ArchiveError::Extraction {
        path: archive.to_path_buf(),
        reason,
    };

    tokio::task::spawn_blocking(move || -> Result<(), String> {
        let file = std::fs::File::open(&archive_path).map_err(|e| e.to_string())?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
        zip.extract(&dest).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| extraction_err(e.to_string()))?
    .map_err(extraction_err)
}

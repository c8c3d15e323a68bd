//! Evidence upload for one event of a created ticket.

use tracing::{info, warn};

use crate::evidence::EvidenceIndex;
use crate::manifest::EventRecord;
use crate::metrics;
use crate::ticketing::{AttachmentCategory, AttachmentDirection, AttachmentRequest, TicketingClient};

use super::types::AttachmentTally;

/// Upload the overview and patch images referenced by `event`.
///
/// A referenced file absent from the archive counts as missing; a failed
/// upload counts as failed. Neither stops the remaining slots.
pub async fn upload_event_evidence(
    client: &dyn TicketingClient,
    index: &EvidenceIndex,
    ticket_no: &str,
    vrm: &str,
    event: &EventRecord,
    direction: AttachmentDirection,
) -> AttachmentTally {
    let mut tally = AttachmentTally::default();

    for category in [AttachmentCategory::Overview, AttachmentCategory::Patch] {
        let Some(name) = event.image(category) else {
            continue;
        };

        let Some(path) = index.get(name) else {
            tally.missing += 1;
            metrics::ATTACHMENTS.with_label_values(&["missing"]).inc();
            warn!(ticket_no, vrm, image = name, "Missing evidence image");
            continue;
        };

        let request = AttachmentRequest {
            ticket_no: ticket_no.to_string(),
            vrm: vrm.to_string(),
            file_path: path.to_path_buf(),
            direction,
            category,
        };

        match client.upload_attachment(&request).await {
            Ok(_) => {
                tally.uploaded += 1;
                metrics::ATTACHMENTS.with_label_values(&["uploaded"]).inc();
                info!(
                    ticket_no,
                    image = name,
                    direction = direction.as_code(),
                    category = category.as_code(),
                    "Uploaded evidence"
                );
            }
            Err(e) => {
                tally.failed += 1;
                metrics::ATTACHMENTS.with_label_values(&["failed"]).inc();
                warn!(ticket_no, image = name, error = %e, "Evidence upload failed");
            }
        }
    }

    tally
}

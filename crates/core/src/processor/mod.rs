//! Archive processor for evidence packages.
//!
//! This module provides the `ArchiveProcessor`, which takes one archive
//! through its lifecycle:
//! - Extraction into a fresh per-archive work directory
//! - Manifest parsing and evidence indexing
//! - Per-offence validation, ticket creation and attachment upload
//!
//! Offence-level problems (bad records, missing or rejected images) are
//! counted in the `ArchiveOutcome`. Extraction, manifest and ticket creation
//! failures abandon the archive with an `ArchiveError`.
//!
//! # Example
//!
//! ```ignore
//! use parkwarden_core::processor::{Archive, ArchiveProcessor};
//!
//! let processor = ArchiveProcessor::new(config.site.clone(), client);
//! let archive = Archive::new("/srv/inbox/batch.zip", "20251217_010203", 1);
//! let outcome = processor.process(&archive, &layout.work).await?;
//! println!("tickets created: {}", outcome.tickets_created);
//! ```

mod archive;
mod attachments;
mod types;
mod validate;

pub use archive::ArchiveProcessor;
pub use attachments::upload_event_evidence;
pub use types::{
    Archive, ArchiveError, ArchiveOutcome, ArchiveStage, AttachmentTally, Disposition, EventKind,
    OffenceRejection,
};
pub use validate::validate_offence;

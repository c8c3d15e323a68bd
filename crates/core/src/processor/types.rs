//! Types for the processor module.

use std::fmt;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::ManifestError;
use crate::ticketing::TicketingError;

/// One inbox item scheduled for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Location in the inbox.
    pub path: PathBuf,
    /// Identifier shared by every archive discovered in one run.
    pub batch_id: String,
    /// 1-based position within the batch (oldest first).
    pub sequence: usize,
}

impl Archive {
    pub fn new(path: impl Into<PathBuf>, batch_id: impl Into<String>, sequence: usize) -> Self {
        Self {
            path: path.into(),
            batch_id: batch_id.into(),
            sequence,
        }
    }

    /// `<batch_id>_<sequence:03>`, used for work dirs and collision renames.
    pub fn tag(&self) -> String {
        format!("{}_{:03}", self.batch_id, self.sequence)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Per-archive extraction area under the work root.
    pub fn work_dir(&self, work_root: &Path) -> PathBuf {
        work_root.join(format!("run_{}", self.tag()))
    }
}

/// Lifecycle of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStage {
    Discovered,
    Extracted,
    ManifestParsed,
    OffencesSubmitted,
    Disposed(Disposition),
}

/// Where an archive ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Success,
    Failed,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Success => "success",
            Disposition::Failed => "failed",
        }
    }
}

/// Attachment outcomes. Every referenced image lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentTally {
    pub uploaded: usize,
    pub missing: usize,
    pub failed: usize,
}

impl AttachmentTally {
    pub fn total(&self) -> usize {
        self.uploaded + self.missing + self.failed
    }
}

impl AddAssign for AttachmentTally {
    fn add_assign(&mut self, other: Self) {
        self.uploaded += other.uploaded;
        self.missing += other.missing;
        self.failed += other.failed;
    }
}

/// Result of processing one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveOutcome {
    /// Offence elements in the manifest.
    pub offences_total: usize,
    pub tickets_created: usize,
    pub offences_skipped: usize,
    pub attachments: AttachmentTally,
    /// Remote ticket numbers, in submission order.
    pub ticket_numbers: Vec<String>,
}

/// Which event of an offence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Entrance,
    Exit,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Entrance => write!(f, "entrance"),
            EventKind::Exit => write!(f, "exit"),
        }
    }
}

/// Why an offence was skipped. Never fatal to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffenceRejection {
    #[error("missing vehicle id")]
    MissingVehicleId,

    #[error("missing {0} event")]
    MissingEvent(EventKind),

    #[error("bad {event} timestamp {value:?}")]
    BadTimestamp { event: EventKind, value: String },
}

impl OffenceRejection {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            OffenceRejection::MissingVehicleId => "missing_vehicle_id",
            OffenceRejection::MissingEvent(_) => "missing_event",
            OffenceRejection::BadTimestamp { .. } => "bad_timestamp",
        }
    }
}

/// Errors that abandon the whole archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The working directory could not be prepared.
    #[error("Failed to prepare work directory {path}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or unpacked.
    #[error("Failed to extract {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Ticket creation failed; tickets created earlier in the archive remain.
    #[error("Ticket creation failed for offence #{offence} vrm={vrm}")]
    TicketCreation {
        offence: usize,
        vrm: String,
        /// Tickets already created from this archive before the failure.
        created: Vec<String>,
        #[source]
        source: TicketingError,
    },
}

impl ArchiveError {
    /// Last stage reached before the failure.
    pub fn stage(&self) -> ArchiveStage {
        match self {
            ArchiveError::Workspace { .. } | ArchiveError::Extraction { .. } => {
                ArchiveStage::Discovered
            }
            ArchiveError::Manifest(_) => ArchiveStage::Extracted,
            ArchiveError::TicketCreation { .. } => ArchiveStage::ManifestParsed,
        }
    }
}

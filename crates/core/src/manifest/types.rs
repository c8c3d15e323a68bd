//! Manifest record types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticketing::AttachmentCategory;

/// Errors that make a whole archive unusable.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("No XML manifest found under {root}")]
    Missing { root: PathBuf },

    #[error("No <offence> elements found in {path}")]
    NoOffences { path: PathBuf },

    #[error("Failed to read manifest {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// An entrance or exit sighting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Raw `DD/MM/YYYY HH:MM:SS` text, trimmed.
    pub timestamp: Option<String>,
    /// Overview image file name.
    pub overview: Option<String>,
    /// Plate close-up image file name.
    pub patch: Option<String>,
}

impl EventRecord {
    /// Image file name referenced by the given slot, if any.
    pub fn image(&self, category: AttachmentCategory) -> Option<&str> {
        match category {
            AttachmentCategory::Overview => self.overview.as_deref(),
            AttachmentCategory::Patch => self.patch.as_deref(),
        }
    }
}

/// One `offence` element as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenceRecord {
    /// 1-based position in document order.
    pub index: usize,
    pub vrm: Option<String>,
    pub entrance: Option<EventRecord>,
    pub exit: Option<EventRecord>,
}

/// A parsed manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub offences: Vec<OffenceRecord>,
}

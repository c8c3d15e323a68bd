//! Types for remote ticketing operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur talking to the ticketing system.
#[derive(Debug, Error)]
pub enum TicketingError {
    /// The remote system answered and reported an error.
    #[error("Remote rejected request: {message}")]
    Rejected { message: String },

    /// Connection, timeout, HTTP status or unparsable response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The evidence file could not be read.
    #[error("Failed to read attachment {path}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TicketingError {
    /// Short label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            TicketingError::Rejected { .. } => "rejected",
            TicketingError::Transport(_) => "transport",
            TicketingError::Attachment { .. } => "attachment",
        }
    }
}

/// The field set submitted to create one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFields {
    pub enforcement_type: String,
    pub ticket_type: String,
    pub site_code: String,
    /// Remote date-time format, `YYYY-MM-DD HH:MM:SS`.
    pub contravention_datetime: String,
    pub issued_datetime: String,
    pub observed_from_datetime: String,
    pub observed_to_datetime: String,
    pub vrm: String,
    pub primary_contravention: String,
    pub badge_id: String,
}

impl TicketFields {
    /// Form-encoded key/value pairs in wire order.
    pub fn to_form(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("enforcement_type", self.enforcement_type.as_str()),
            ("type", self.ticket_type.as_str()),
            ("site_code", self.site_code.as_str()),
            ("contravention_datetime", self.contravention_datetime.as_str()),
            ("issued_datetime", self.issued_datetime.as_str()),
            ("observed_from_datetime", self.observed_from_datetime.as_str()),
            ("observed_to_datetime", self.observed_to_datetime.as_str()),
            ("vehicle_details[vrm]", self.vrm.as_str()),
            ("contraventions[primary]", self.primary_contravention.as_str()),
            ("badge_id", self.badge_id.as_str()),
        ]
    }
}

/// A ticket the remote system accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTicket {
    /// Opaque ticket number assigned remotely.
    pub ticket_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Acknowledgement of an attachment upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The response was not JSON and was accepted on transport success alone.
    pub implicit: bool,
}

/// Which event an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentDirection {
    Entry,
    Exit,
}

impl AttachmentDirection {
    /// Wire code for `anpr_direction`.
    pub fn as_code(&self) -> &'static str {
        match self {
            AttachmentDirection::Entry => "IN",
            AttachmentDirection::Exit => "OUT",
        }
    }
}

/// Image slot within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentCategory {
    /// Wide scene shot.
    Overview,
    /// Number plate close-up.
    Patch,
}

impl AttachmentCategory {
    /// Wire code for `anpr_type`.
    pub fn as_code(&self) -> &'static str {
        match self {
            AttachmentCategory::Overview => "O",
            AttachmentCategory::Patch => "P",
        }
    }

    /// Manifest attribute name carrying the file name for this slot.
    pub fn attribute(&self) -> &'static str {
        match self {
            AttachmentCategory::Overview => "overview",
            AttachmentCategory::Patch => "patch",
        }
    }
}

/// One image to bind to a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRequest {
    pub ticket_no: String,
    pub vrm: String,
    pub file_path: PathBuf,
    pub direction: AttachmentDirection,
    pub category: AttachmentCategory,
}

/// Trait for remote ticketing backends.
///
/// Every call is a single attempt; callers decide what is fatal.
#[async_trait]
pub trait TicketingClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Create a ticket for one offence.
    async fn create_ticket(&self, fields: &TicketFields) -> Result<CreatedTicket, TicketingError>;

    /// Upload one evidence image against an existing ticket.
    async fn upload_attachment(
        &self,
        request: &AttachmentRequest,
    ) -> Result<UploadReceipt, TicketingError>;
}

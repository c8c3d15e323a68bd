//! Mock ticketing client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ticketing::{
    AttachmentRequest, CreatedTicket, TicketFields, TicketingClient, TicketingError,
    UploadReceipt,
};

/// Mock implementation of the TicketingClient trait.
///
/// Provides controllable behavior for testing:
/// - Records every accepted ticket and attempted upload
/// - Assigns sequential ticket numbers (`T000001`, `T000002`, ...)
/// - Scripts a one-shot ticket failure per vehicle id
/// - Fails uploads for chosen image file names
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTicketingClient::new();
/// client.reject_ticket_for("AB12CDE", TicketingError::Transport("down".into())).await;
///
/// // ... run the processor ...
///
/// assert_eq!(client.tickets().await.len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockTicketingClient {
    /// Fields of every ticket that was created.
    tickets: Arc<RwLock<Vec<TicketFields>>>,
    /// Every upload attempt, including failed ones.
    uploads: Arc<RwLock<Vec<AttachmentRequest>>>,
    /// Pending ticket failures keyed by vehicle id.
    ticket_failures: Arc<RwLock<HashMap<String, TicketingError>>>,
    /// Image file names whose upload fails.
    upload_failures: Arc<RwLock<HashSet<String>>>,
}

impl MockTicketingClient {
    /// Create a new mock client that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next ticket creation for `vrm` with `error`.
    pub async fn reject_ticket_for(&self, vrm: impl Into<String>, error: TicketingError) {
        self.ticket_failures.write().await.insert(vrm.into(), error);
    }

    /// Fail every upload of the image with this file name.
    pub async fn fail_upload_of(&self, file_name: impl Into<String>) {
        self.upload_failures.write().await.insert(file_name.into());
    }

    /// Fields of created tickets, in order.
    pub async fn tickets(&self) -> Vec<TicketFields> {
        self.tickets.read().await.clone()
    }

    /// Upload attempts, in order.
    pub async fn uploads(&self) -> Vec<AttachmentRequest> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl TicketingClient for MockTicketingClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_ticket(&self, fields: &TicketFields) -> Result<CreatedTicket, TicketingError> {
        if let Some(error) = self.ticket_failures.write().await.remove(&fields.vrm) {
            return Err(error);
        }

        let mut tickets = self.tickets.write().await;
        tickets.push(fields.clone());

        Ok(CreatedTicket {
            ticket_no: format!("T{:06}", tickets.len()),
            message: Some("Ticket created".to_string()),
        })
    }

    async fn upload_attachment(
        &self,
        request: &AttachmentRequest,
    ) -> Result<UploadReceipt, TicketingError> {
        self.uploads.write().await.push(request.clone());

        let file_name = request
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if self.upload_failures.read().await.contains(&file_name) {
            return Err(TicketingError::Rejected {
                message: format!("mock upload failure for {}", file_name),
            });
        }

        Ok(UploadReceipt {
            message: Some("Upload OK".to_string()),
            implicit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_sequential_ticket_numbers() {
        let client = MockTicketingClient::new();
        let fields = fixtures::ticket_fields("AB12CDE");

        let first = client.create_ticket(&fields).await.unwrap();
        let second = client.create_ticket(&fields).await.unwrap();
        assert_eq!(first.ticket_no, "T000001");
        assert_eq!(second.ticket_no, "T000002");
    }

    #[tokio::test]
    async fn test_scripted_failure_is_one_shot() {
        let client = MockTicketingClient::new();
        client
            .reject_ticket_for("AB12CDE", TicketingError::Transport("down".into()))
            .await;
        let fields = fixtures::ticket_fields("AB12CDE");

        assert!(client.create_ticket(&fields).await.is_err());
        assert!(client.create_ticket(&fields).await.is_ok());
        assert_eq!(client.tickets().await.len(), 1);
    }
}

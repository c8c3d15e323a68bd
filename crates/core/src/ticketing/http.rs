//! HTTP ticketing client implementation.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::metrics;

use super::{
    AttachmentRequest, CreatedTicket, TicketFields, TicketingClient, TicketingError,
    UploadReceipt,
};

/// Header carrying the API token.
const AUTH_HEADER: &str = "HTTPS_AUTH";

const ADD_TICKET: &str = "add_ticket";
const UPLOAD_ATTACHMENT: &str = "upload_attachment";

/// Client for the enforcement system's HTTP API.
pub struct HttpTicketingClient {
    client: Client,
    config: RemoteConfig,
}

impl HttpTicketingClient {
    /// Create a new client. TLS verification follows `config.verify_tls`.
    pub fn new(config: RemoteConfig) -> Result<Self, TicketingError> {
        let mut builder = Client::builder();
        if !config.verify_tls {
            warn!("TLS certificate verification is disabled for the ticketing API");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| TicketingError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url(), name)
    }

    /// Send a prepared request and return the body of a 2xx response.
    async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<String, TicketingError> {
        let start = Instant::now();
        let result = self.send_inner(request, timeout).await;

        metrics::REMOTE_REQUEST_DURATION
            .with_label_values(&[endpoint, if result.is_ok() { "ok" } else { "error" }])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn send_inner(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<String, TicketingError> {
        let response = request
            .header(AUTH_HEADER, &self.config.auth_token)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TicketingError::Transport(format!(
                        "Request timed out after {}s",
                        timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    TicketingError::Transport(format!("Connection failed: {}", e))
                } else {
                    TicketingError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TicketingError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(TicketingError::Transport(format!(
                "HTTP {}: {}",
                status,
                snippet(&body, 500)
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl TicketingClient for HttpTicketingClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn create_ticket(&self, fields: &TicketFields) -> Result<CreatedTicket, TicketingError> {
        let request = self
            .client
            .post(self.endpoint(ADD_TICKET))
            .form(&fields.to_form());

        let body = self
            .send(
                ADD_TICKET,
                request,
                Duration::from_secs(self.config.ticket_timeout_secs),
            )
            .await?;

        parse_create_response(&body)
    }

    async fn upload_attachment(
        &self,
        request: &AttachmentRequest,
    ) -> Result<UploadReceipt, TicketingError> {
        let form = attachment_form(request).await?;
        let http_request = self
            .client
            .post(self.endpoint(UPLOAD_ATTACHMENT))
            .multipart(form);

        let body = self
            .send(
                UPLOAD_ATTACHMENT,
                http_request,
                Duration::from_secs(self.config.upload_timeout_secs),
            )
            .await?;

        parse_upload_response(&body)
    }
}

/// Build the multipart body: text fields first, file part last.
async fn attachment_form(request: &AttachmentRequest) -> Result<multipart::Form, TicketingError> {
    let bytes = tokio::fs::read(&request.file_path)
        .await
        .map_err(|e| TicketingError::Attachment {
            path: request.file_path.clone(),
            source: e,
        })?;

    let part = multipart::Part::bytes(bytes)
        .file_name(file_name(&request.file_path))
        .mime_str("application/octet-stream")
        .map_err(|e| TicketingError::Transport(e.to_string()))?;

    Ok(multipart::Form::new()
        .text("ticket_no", request.ticket_no.clone())
        .text("vrm", request.vrm.clone())
        .text("anpr_direction", request.direction.as_code())
        .text("anpr_type", request.category.as_code())
        .part("attachment", part))
}

/// Interpret an `add_ticket` response body.
///
/// The body must be a JSON object. A truthy `error` is a rejection; a
/// non-error answer without `ticket_no` is treated as malformed.
pub fn parse_create_response(body: &str) -> Result<CreatedTicket, TicketingError> {
    let value: Value = serde_json::from_str(body).map_err(|_| {
        TicketingError::Transport(format!("add_ticket returned non-JSON: {}", snippet(body, 500)))
    })?;

    let object = value.as_object().ok_or_else(|| {
        TicketingError::Transport(format!("add_ticket returned non-object: {}", snippet(body, 500)))
    })?;

    let message = object.get("message").and_then(value_to_string);

    if object.get("error").is_some_and(is_truthy) {
        return Err(TicketingError::Rejected {
            message: message.unwrap_or_else(|| snippet(body, 500)),
        });
    }

    let ticket_no = object
        .get("ticket_no")
        .and_then(value_to_string)
        .ok_or_else(|| {
            TicketingError::Transport(format!(
                "add_ticket response has no ticket_no: {}",
                snippet(body, 500)
            ))
        })?;

    Ok(CreatedTicket { ticket_no, message })
}

/// Interpret an `upload_attachment` response body.
///
/// Only a JSON `"error": true` counts as failure. A body that is not JSON at
/// all is accepted as an implicit success because the endpoint has
/// historically answered uploads with plain text.
// TODO: drop the non-JSON leniency once the API guarantees JSON bodies; it hides malformed answers.
pub fn parse_upload_response(body: &str) -> Result<UploadReceipt, TicketingError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            debug!(body = %snippet(body, 200), "Non-JSON upload response treated as success");
            return Ok(UploadReceipt {
                message: Some("Upload OK".to_string()),
                implicit: true,
            });
        }
    };

    let message = value.get("message").and_then(value_to_string);

    if value.get("error") == Some(&Value::Bool(true)) {
        return Err(TicketingError::Rejected {
            message: message.unwrap_or_else(|| "unknown".to_string()),
        });
    }

    Ok(UploadReceipt {
        message,
        implicit: false,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "attachment".to_string())
}

fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

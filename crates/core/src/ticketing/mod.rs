//! Remote ticketing system client.
//!
//! This module provides a `TicketingClient` trait for creating tickets and
//! attaching evidence images, and `HttpTicketingClient`, which talks to the
//! enforcement system's form/multipart HTTP API.

mod http;
mod types;

pub use http::{parse_create_response, parse_upload_response, HttpTicketingClient};
pub use types::*;

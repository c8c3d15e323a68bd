//! Batch orchestrator for inbox processing.
//!
//! Each run discovers the archives waiting in the inbox, processes them one
//! at a time in age order and routes each to the done or failed area:
//! - **Discovery**: flat scan of the inbox, oldest first
//! - **Processing**: sequential, handled by ArchiveProcessor
//! - **Disposition**: done on success, failed (tagged) otherwise

mod discovery;
mod runner;
mod types;

pub use discovery::{batch_id, discover_archives};
pub use runner::BatchOrchestrator;
pub use types::{ArchiveReport, BatchSummary, OrchestratorError};

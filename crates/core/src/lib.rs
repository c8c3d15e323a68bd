pub mod config;
pub mod disposition;
pub mod evidence;
pub mod layout;
pub mod manifest;
pub mod mapper;
pub mod metrics;
pub mod orchestrator;
pub mod processor;
pub mod testing;
pub mod ticketing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use layout::DirectoryLayout;
pub use orchestrator::{ArchiveReport, BatchOrchestrator, BatchSummary, OrchestratorError};
pub use processor::{Archive, ArchiveError, ArchiveOutcome, ArchiveProcessor, Disposition};
pub use ticketing::{HttpTicketingClient, TicketingClient, TicketingError};

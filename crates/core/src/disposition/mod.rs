//! Final placement of processed archives.
//!
//! Archives leave the inbox exactly once: to the done area after successful
//! processing, or to the failed area with a `FAILED` tag. Existing files are
//! never overwritten; a colliding name gets the batch tag and, if needed, a
//! numeric suffix.

mod error;
mod mover;

pub use error::DispositionError;
pub use mover::{move_to_done, move_to_failed, sanitize_file_name};

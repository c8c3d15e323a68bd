//! Offence manifest discovery and parsing.
//!
//! Each evidence archive carries one XML manifest listing `offence` elements.
//! Parsing is faithful: malformed offences are returned as-is and judged later
//! by the archive processor, so one bad record never hides its siblings.

mod parser;
mod types;

pub use parser::{find_manifest, load_manifest, parse_offences};
pub use types::*;

//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Study planner persona and rules
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Per-request instruction carrying the student's input
pub const USER: &str = include_str!("../../prompts/user.pmt");

/// Names of all embedded templates
pub const NAMES: [&str; 2] = ["system", "user"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "user" => Some(USER),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

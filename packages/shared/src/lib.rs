//! Utilities shared by the Hiroba crates: logging setup and clock helpers.

pub mod logger;
pub mod time;

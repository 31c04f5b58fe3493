//! Command handlers for memio CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod memory;
pub mod types;

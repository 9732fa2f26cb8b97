//! Subcommand implementations.

pub mod diff;
pub mod pull;
pub mod push;

//! Subcommand implementations

pub mod estimate;
pub mod locations;
pub mod status;

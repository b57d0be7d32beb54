//! Subcommand implementations.

pub mod client;
pub mod schedule;
pub mod seed;
pub mod task;
pub mod visit;

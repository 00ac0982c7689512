//! Subcommand implementations.

pub mod checkpoint;
pub mod config;
pub mod decode;
pub mod dump;
pub mod receivers;

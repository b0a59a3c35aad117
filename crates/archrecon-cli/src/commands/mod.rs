//! Subcommand implementations.

pub(crate) mod call;
pub(crate) mod config;
pub(crate) mod doctor;
pub(crate) mod mcp;
pub(crate) mod setup;
pub(crate) mod tools;

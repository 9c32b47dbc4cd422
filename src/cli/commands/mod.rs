//! CLI command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod forget;
pub mod list;
pub mod status;

//! Shared infrastructure for the kunai vCard crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

//! Command implementations for the wf-export CLI
//!
//! Each command returns the process exit code on success.

pub mod check_config;
pub mod export;

//! Configuration file handling for wf-export
//!
//! This module contains data structures for `config.yml`:
//! - [`export`]: initial variables, global settings and rewrite rule tables
//! - [`resources`]: the configured workflow and pipeline lists

pub mod export;
pub mod resources;

pub use export::{ExportConfig, GlobalSettings, InitialVariables, SparkConfRule};
pub use resources::{PipelineEntry, WorkflowEntry};

//! wfexport - export workspace jobs and pipelines into bundles
//!
//! The export pipeline, per resource: discover the task inventory, run the
//! external bundle generator, classify and fetch the files it did not
//! download, map every origin path to its place in the bundle, move the files
//! there, and rewrite the generated document to match.

pub mod backup;
pub mod bindings;
pub mod classifier;
pub mod common;
pub mod config;
pub mod discovery;
pub mod document;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod hash;
pub mod interrupt;
pub mod orchestrator;
pub mod path_mapper;
pub mod progress;
pub mod workspace_api;

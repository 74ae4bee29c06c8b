//! Error types and handling for wf-export
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Configuration errors
//! - [`generate`]: Bundle generator errors
//! - [`fetch`]: Artifact download errors
//! - [`document`]: Generated document errors
//! - [`api`]: Workspace API errors
//! - [`fs`]: File system errors

pub mod api;
pub mod config;
pub mod document;
pub mod fetch;
pub mod fs;
pub mod generate;

pub use api::request_failed as api_request_failed;
pub use config::{
    invalid as config_invalid, not_found as config_not_found, parse_failed as config_parse_failed,
};
pub use document::{
    invalid as document_invalid, resource_missing as resource_not_in_document,
    validation_failed,
};
pub use fetch::artifact_failed as artifact_fetch_failed;
pub use fs::{
    io_error, not_found as file_not_found, read_failed as file_read_failed,
    write_failed as file_write_failed,
};
pub use generate::{document_missing as generated_document_missing, tool_failed as generator_failed};

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for export operations
#[derive(Error, Diagnostic, Debug)]
pub enum ExportError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(wfexport::config::not_found),
        help("Pass --config or set WF_EXPORT_CONFIG to point at config.yml")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(wfexport::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(wfexport::config::invalid))]
    ConfigInvalid { message: String },

    #[error("No active workflows or pipelines found in configuration")]
    #[diagnostic(
        code(wfexport::config::no_active_resources),
        help("Set is_active: true for at least one workflow or pipeline")
    )]
    NoActiveResources,

    #[error("Bundle manifest not found: {path}")]
    #[diagnostic(
        code(wfexport::config::manifest_not_found),
        help("Ensure databricks.yml exists at the path configured in v_databricks_yml_path")
    )]
    ManifestNotFound { path: String },

    #[error("{kind} {id} has nothing to export")]
    #[diagnostic(code(wfexport::config::no_tasks))]
    NoTasks { kind: String, id: String },

    // Generation errors
    #[error("Bundle generation failed for {id}: {reason}")]
    #[diagnostic(code(wfexport::generate::failed))]
    GeneratorFailed { id: String, reason: String },

    #[error("Generated document not found: {path}")]
    #[diagnostic(
        code(wfexport::generate::document_missing),
        help("The generator exited successfully but did not write the expected resource file")
    )]
    GeneratedDocumentMissing { path: String },

    // Fetch errors
    #[error("Failed to fetch artifact {origin}: {reason}")]
    #[diagnostic(code(wfexport::fetch::artifact_failed))]
    ArtifactFetchFailed { origin: String, reason: String },

    #[error("Workspace API request failed: {endpoint}: {reason}")]
    #[diagnostic(code(wfexport::api::request_failed))]
    ApiRequestFailed { endpoint: String, reason: String },

    // Document errors
    #[error("Invalid bundle document {path}: {reason}")]
    #[diagnostic(code(wfexport::document::invalid))]
    DocumentInvalid { path: String, reason: String },

    #[error("Resource '{name}' not found in bundle document {path}")]
    #[diagnostic(code(wfexport::document::resource_missing))]
    ResourceNotInDocument { name: String, path: String },

    #[error("Export validation failed: {message}")]
    #[diagnostic(code(wfexport::document::validation_failed))]
    ValidationFailed { message: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(wfexport::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(wfexport::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(wfexport::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(wfexport::fs::io_error))]
    IoError { message: String },

    #[error("Export interrupted")]
    #[diagnostic(code(wfexport::interrupted))]
    Interrupted,
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ExportError {
    fn from(err: serde_yaml::Error) -> Self {
        ExportError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::ApiRequestFailed {
            endpoint: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        ExportError::ApiRequestFailed {
            endpoint: err
                .url()
                .map_or_else(|| "unknown".to_string(), |u| u.path().to_string()),
            reason: err.to_string(),
        }
    }
}

impl From<regex::Error> for ExportError {
    fn from(err: regex::Error) -> Self {
        ExportError::ConfigInvalid {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ExportError>;

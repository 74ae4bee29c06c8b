//! Artifact fetch errors

use super::ExportError;

/// Creates an artifact fetch failed error
pub fn artifact_failed(origin: impl Into<String>, reason: impl Into<String>) -> ExportError {
    ExportError::ArtifactFetchFailed {
        origin: origin.into(),
        reason: reason.into(),
    }
}

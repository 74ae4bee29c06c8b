//! Bundle generator errors

use super::ExportError;

/// Creates a generator failed error
pub fn tool_failed(id: impl Into<String>, reason: impl Into<String>) -> ExportError {
    ExportError::GeneratorFailed {
        id: id.into(),
        reason: reason.into(),
    }
}

/// Creates a generated document missing error
pub fn document_missing(path: impl Into<String>) -> ExportError {
    ExportError::GeneratedDocumentMissing { path: path.into() }
}

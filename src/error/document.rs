//! Bundle document errors

use super::ExportError;

/// Creates an invalid document error
pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> ExportError {
    ExportError::DocumentInvalid {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a resource missing from document error
pub fn resource_missing(name: impl Into<String>, path: impl Into<String>) -> ExportError {
    ExportError::ResourceNotInDocument {
        name: name.into(),
        path: path.into(),
    }
}

/// Creates a validation failed error
pub fn validation_failed(message: impl Into<String>) -> ExportError {
    ExportError::ValidationFailed {
        message: message.into(),
    }
}

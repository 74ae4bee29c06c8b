//! Workspace API errors

use super::ExportError;

/// Creates an API request failed error
pub fn request_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> ExportError {
    ExportError::ApiRequestFailed {
        endpoint: endpoint.into(),
        reason: reason.into(),
    }
}

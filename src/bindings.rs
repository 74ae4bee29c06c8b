//! Side file binding pre-existing resources to their generated keys
//!
//! Rows are appended across runs; the header is only written when the file is
//! created.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::common::fs::ensure_parent;
use crate::error::{self, Result};

pub const HEADER: &str = "resource_key,resource_id";

/// One `resource_key,resource_id` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub resource_key: String,
    pub resource_id: String,
}

impl Binding {
    pub fn new(resource_key: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_key: resource_key.into(),
            resource_id: resource_id.into(),
        }
    }

    fn row(&self) -> String {
        format!("{},{}", self.resource_key, self.resource_id)
    }
}

/// Append `bindings` to the CSV at `path`
pub fn append(path: &Path, bindings: &[Binding]) -> Result<()> {
    if bindings.is_empty() {
        return Ok(());
    }

    ensure_parent(path)?;
    let write_failed = |e: std::io::Error| error::file_write_failed(path.display().to_string(), e.to_string());

    let is_new = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_failed)?;

    let mut content = String::new();
    if is_new {
        content.push_str(HEADER);
        content.push('\n');
    }
    for binding in bindings {
        content.push_str(&binding.row());
        content.push('\n');
    }
    file.write_all(content.as_bytes()).map_err(write_failed)?;

    tracing::info!(path = %path.display(), count = bindings.len(), "Recorded resource bindings");
    Ok(())
}

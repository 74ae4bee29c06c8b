//! Common file system operations with unified error handling

use std::fs;
use std::path::Path;

use crate::error::{self, Result};

/// Create the parent directory of `path` if it does not exist
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| error::file_write_failed(parent.display().to_string(), e.to_string()))?;
        }
    }
    Ok(())
}

/// Write bytes to `path`, creating parent directories as needed
pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents)
        .map_err(|e| error::file_write_failed(path.display().to_string(), e.to_string()))
}

/// Read a file to a string
pub fn read_to_string(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(error::file_not_found(path.display().to_string()));
    }
    fs::read_to_string(path)
        .map_err(|e| error::file_read_failed(path.display().to_string(), e.to_string()))
}

/// Move a file, falling back to copy + remove across devices
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    ensure_parent(dst)?;
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst)
        .map_err(|e| error::file_write_failed(dst.display().to_string(), e.to_string()))?;
    fs::remove_file(src)
        .map_err(|e| error::file_write_failed(src.display().to_string(), e.to_string()))
}

/// Copy a file, creating parent directories as needed
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    ensure_parent(dst)?;
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| error::file_write_failed(dst.display().to_string(), e.to_string()))
}

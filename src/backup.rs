//! Scoped backup of a generated resource document
//!
//! ## Usage
//!
//! ```ignore
//! let guard = BackupGuard::create(&document_path)?;
//!
//! // Generate, rewrite, validate...
//!
//! // On success:
//! guard.commit()?;
//!
//! // On error or interrupt (automatic via Drop if not committed):
//! // the previous document is restored, or the new one removed
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::fs::move_file;
use crate::error::Result;

const BACKUP_SUFFIX: &str = ".bak";

/// Sibling `.bak` path of a document
pub fn backup_path_for(document: &Path) -> PathBuf {
    let mut name = document.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Holds the pre-run state of one resource document until the run commits
#[derive(Debug)]
pub struct BackupGuard {
    document: PathBuf,
    backup: PathBuf,
    /// Whether a document existed before this run
    had_original: bool,
    released: bool,
}

impl BackupGuard {
    /// Move any existing document aside to its `.bak` sibling
    ///
    /// An orphaned `.bak` with no document next to it is put back first, so an
    /// earlier interrupted run never loses the last good document.
    pub fn create(document: &Path) -> Result<Self> {
        let backup = backup_path_for(document);

        if backup.exists() {
            if document.exists() {
                tracing::warn!(path = %backup.display(), "Replacing stale backup");
                fs::remove_file(&backup)?;
            } else {
                tracing::warn!(path = %backup.display(), "Recovering orphaned backup");
                move_file(&backup, document)?;
            }
        }

        let had_original = document.is_file();
        if had_original {
            move_file(document, &backup)?;
            tracing::debug!(path = %document.display(), "Backed up document");
        }

        Ok(Self {
            document: document.to_path_buf(),
            backup,
            had_original,
            released: false,
        })
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// The backup file, when a previous document existed
    pub fn backup_path(&self) -> Option<&Path> {
        self.had_original.then_some(self.backup.as_path())
    }

    /// Keep the new document and delete the backup
    pub fn commit(mut self) -> Result<()> {
        self.released = true;
        if self.had_original && self.backup.exists() {
            fs::remove_file(&self.backup)?;
        }
        Ok(())
    }

    /// Put the pre-run state back
    pub fn restore(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        if self.had_original {
            move_file(&self.backup, &self.document)?;
            tracing::info!(path = %self.document.display(), "Restored document from backup");
        } else if self.document.exists() {
            fs::remove_file(&self.document)?;
            tracing::debug!(path = %self.document.display(), "Removed partial document");
        }
        Ok(())
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::error!(path = %self.document.display(), error = %e, "Backup restore failed");
        }
    }
}

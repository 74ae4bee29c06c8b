//! Artifact domain types

use std::path::PathBuf;

use crate::common::string_utils::extension;

/// What an artifact is, which decides how it is transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Notebook,
    Python,
    Sql,
    Wheel,
    Jar,
    File,
    /// A pattern that expands to many files at fetch time
    Glob,
}

impl ArtifactKind {
    /// Infer the kind of a concrete workspace file from its name
    pub fn from_path(path: &str) -> Self {
        match extension(path).as_deref() {
            None => ArtifactKind::Notebook,
            Some("py") => ArtifactKind::Python,
            Some("sql") => ArtifactKind::Sql,
            Some("whl") => ArtifactKind::Wheel,
            Some("jar") => ArtifactKind::Jar,
            Some(_) => ArtifactKind::File,
        }
    }

    /// Archives must round-trip byte-exact
    pub fn is_binary(self) -> bool {
        matches!(self, ArtifactKind::Wheel | ArtifactKind::Jar)
    }

    pub fn is_library(self) -> bool {
        self.is_binary()
    }
}

/// Whether an artifact lands in the source tree or the library tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactCategory {
    Source,
    Library,
}

impl ArtifactCategory {
    pub fn destination_subdir(self) -> &'static str {
        match self {
            ArtifactCategory::Source => "src",
            ArtifactCategory::Library => "libs",
        }
    }
}

/// A file the export needs locally
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactDescriptor {
    /// Path as it appears in the generated document
    pub origin_path: String,
    pub kind: ArtifactKind,
    pub destination_subdir: String,
    pub category: ArtifactCategory,
}

impl ArtifactDescriptor {
    pub fn new(origin_path: impl Into<String>, kind: ArtifactKind, category: ArtifactCategory) -> Self {
        Self {
            origin_path: origin_path.into(),
            kind,
            destination_subdir: category.destination_subdir().to_string(),
            category,
        }
    }

    pub fn source(origin_path: impl Into<String>) -> Self {
        let origin_path = origin_path.into();
        let kind = ArtifactKind::from_path(&origin_path);
        Self::new(origin_path, kind, ArtifactCategory::Source)
    }

    pub fn library(origin_path: impl Into<String>, kind: ArtifactKind) -> Self {
        Self::new(origin_path, kind, ArtifactCategory::Library)
    }
}

/// Outcome of fetching one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub origin_path: String,
    pub kind: ArtifactKind,
    pub category: ArtifactCategory,
    pub local_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn succeeded(
        origin_path: impl Into<String>,
        kind: ArtifactKind,
        category: ArtifactCategory,
        local_path: PathBuf,
    ) -> Self {
        Self {
            origin_path: origin_path.into(),
            kind,
            category,
            local_path: Some(local_path),
            error: None,
        }
    }

    pub fn failed(artifact: &ArtifactDescriptor, error: impl Into<String>) -> Self {
        Self {
            origin_path: artifact.origin_path.clone(),
            kind: artifact.kind,
            category: artifact.category,
            local_path: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.local_path.is_some()
    }
}

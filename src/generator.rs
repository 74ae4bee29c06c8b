//! Bundle generator adapter
//!
//! Drives the external `bundle generate` command for one resource. The
//! command's own output is not trusted: the resource document and the emitted
//! source files are discovered by scanning the file system afterwards.

use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::common::fs::copy_file;
use crate::common::path_utils::normalize_lexically;
use crate::domain::ResourceKind;
use crate::error::{self, ExportError, Result};

/// Manifest file name the generator requires in its working directory
pub const MANIFEST_FILE_NAME: &str = "databricks.yml";

/// Directory, relative to the export root, that holds resource documents
pub const RESOURCES_DIR: &str = "resources";

/// One generator invocation
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub kind: ResourceKind,
    pub resource_id: &'a str,
    /// Resource key the document is written under
    pub resource_key: &'a str,
    /// Export root; the generator runs here
    pub target_dir: &'a Path,
    /// Where emitted source files are written
    pub source_dir: &'a Path,
}

impl GenerateRequest<'_> {
    pub fn resources_dir(&self) -> PathBuf {
        self.target_dir.join(RESOURCES_DIR)
    }

    pub fn document_path(&self) -> PathBuf {
        self.resources_dir()
            .join(self.kind.document_file_name(self.resource_key))
    }
}

/// What a successful generation left on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub document_path: PathBuf,
    /// Source files emitted under the request's source dir, sorted
    pub source_files: Vec<PathBuf>,
}

pub trait BundleGenerator {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<GeneratedOutput>;
}

/// Copy the configured manifest into `target_dir` when it lives elsewhere
pub fn prepare_manifest(manifest_path: &Path, target_dir: &Path) -> Result<PathBuf> {
    if !manifest_path.is_file() {
        return Err(ExportError::ManifestNotFound {
            path: manifest_path.display().to_string(),
        });
    }

    let target = target_dir.join(MANIFEST_FILE_NAME);
    let same_dir = match (
        manifest_path.parent().and_then(normalize_lexically),
        normalize_lexically(target_dir),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };

    if same_dir && manifest_path.file_name() == target.file_name() {
        tracing::debug!(path = %target.display(), "Manifest already in target directory");
    } else {
        copy_file(manifest_path, &target)?;
        tracing::debug!(
            from = %manifest_path.display(),
            to = %target.display(),
            "Copied manifest into target directory"
        );
    }
    Ok(target)
}

/// Inspect the file system after a generator run
pub fn scan_output(request: &GenerateRequest<'_>) -> Result<GeneratedOutput> {
    let document_path = request.document_path();
    if !document_path.is_file() {
        return Err(error::generated_document_missing(
            document_path.display().to_string(),
        ));
    }

    let mut source_files: Vec<PathBuf> = if request.source_dir.is_dir() {
        WalkDir::new(request.source_dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .collect()
    } else {
        Vec::new()
    };
    source_files.sort();

    tracing::debug!(
        document = %document_path.display(),
        sources = source_files.len(),
        "Scanned generator output"
    );
    Ok(GeneratedOutput {
        document_path,
        source_files,
    })
}

/// Runs the workspace CLI's `bundle generate`
#[derive(Debug, Clone)]
pub struct CliBundleGenerator {
    cli_path: String,
    profile: Option<String>,
}

impl CliBundleGenerator {
    pub fn new(cli_path: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
            profile,
        }
    }

    fn args(&self, request: &GenerateRequest<'_>) -> Vec<String> {
        let id_flag = match request.kind {
            ResourceKind::Job => "--existing-job-id",
            ResourceKind::Pipeline => "--existing-pipeline-id",
        };
        let mut args = vec![
            "bundle".to_string(),
            "generate".to_string(),
            request.kind.as_str().to_string(),
            id_flag.to_string(),
            request.resource_id.to_string(),
            "--key".to_string(),
            request.resource_key.to_string(),
            "--config-dir".to_string(),
            request.resources_dir().display().to_string(),
            "--source-dir".to_string(),
            request.source_dir.display().to_string(),
            "--force".to_string(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

impl BundleGenerator for CliBundleGenerator {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<GeneratedOutput> {
        let args = self.args(request);
        tracing::debug!(command = %self.cli_path, args = %args.join(" "), "Running bundle generator");

        let output = Command::new(&self.cli_path)
            .args(&args)
            .current_dir(request.target_dir)
            .output()
            .map_err(|e| error::generator_failed(request.resource_id, e.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(stderr = %stderr.trim(), "Bundle generator finished");

        if !output.status.success() {
            let reason = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(error::generator_failed(request.resource_id, reason));
        }

        scan_output(request)
    }
}

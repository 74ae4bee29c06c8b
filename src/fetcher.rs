//! Artifact fetching
//!
//! Downloads classified artifacts from the workspace file tree or from a
//! managed volume. Individual failures are recorded in the returned
//! [`FetchResult`]s and never abort the batch.

use std::path::{Path, PathBuf};

use wax::{CandidatePath, Glob, Pattern};

use crate::common::fs::write_file;
use crate::common::string_utils::basename;
use crate::domain::{ArtifactCategory, ArtifactDescriptor, ArtifactKind, FetchResult};
use crate::error::Result;
use crate::workspace_api::{WorkspaceApi, WorkspaceObject};

const VOLUME_PREFIXES: [&str; 3] = ["/Volumes/", "/Volume/", "dbfs:/Volumes/"];
const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// Storage namespace an origin path lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Workspace,
    Volume,
}

impl Namespace {
    /// Anything that is not recognisably a volume is read from the workspace
    pub fn of(path: &str) -> Self {
        if VOLUME_PREFIXES.iter().any(|p| path.starts_with(p)) {
            Namespace::Volume
        } else {
            Namespace::Workspace
        }
    }
}

/// Split a glob include into the literal directory to list and the pattern
///
/// An include without glob syntax names a directory and matches everything under it.
fn glob_parts(include: &str) -> (String, String) {
    let segments: Vec<&str> = include.split('/').collect();
    let literal = segments
        .iter()
        .position(|s| s.contains(GLOB_META))
        .unwrap_or(segments.len());

    if literal == segments.len() {
        let dir = include.trim_end_matches('/').to_string();
        return (dir.clone(), format!("{dir}/**"));
    }
    let prefix = segments[..literal].join("/");
    (prefix, include.to_string())
}

/// Notebook-like files are always exported from a glob match set, packaged
/// libraries only with the export-libraries flag
fn glob_member_category(local_name: &str) -> ArtifactCategory {
    if ArtifactKind::from_path(local_name).is_library() {
        ArtifactCategory::Library
    } else {
        ArtifactCategory::Source
    }
}

pub struct ArtifactFetcher<'a, A: WorkspaceApi> {
    api: &'a A,
    export_libraries: bool,
}

impl<'a, A: WorkspaceApi> ArtifactFetcher<'a, A> {
    pub fn new(api: &'a A, export_libraries: bool) -> Self {
        Self {
            api,
            export_libraries,
        }
    }

    fn read(&self, origin: &str, kind: ArtifactKind) -> Result<Vec<u8>> {
        match Namespace::of(origin) {
            Namespace::Volume => self.api.read_volume_file(origin),
            Namespace::Workspace if kind.is_binary() => self.api.export_binary(origin),
            Namespace::Workspace => self.api.export_text(origin).map(String::into_bytes),
        }
    }

    fn download(
        &self,
        origin: &str,
        kind: ArtifactKind,
        category: ArtifactCategory,
        local_path: PathBuf,
    ) -> FetchResult {
        let outcome = self
            .read(origin, kind)
            .and_then(|bytes| write_file(&local_path, &bytes));
        match outcome {
            Ok(()) => {
                tracing::debug!(origin, path = %local_path.display(), "Fetched artifact");
                FetchResult::succeeded(origin, kind, category, local_path)
            }
            Err(e) => {
                tracing::warn!(origin, error = %e, "Failed to fetch artifact");
                FetchResult {
                    origin_path: origin.to_string(),
                    kind,
                    category,
                    local_path: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Fetch one concrete artifact into `local_dir/<basename>`
    pub fn fetch(&self, artifact: &ArtifactDescriptor, local_dir: &Path) -> FetchResult {
        let local_path = local_dir.join(basename(&artifact.origin_path));
        self.download(
            &artifact.origin_path,
            artifact.kind,
            artifact.category,
            local_path,
        )
    }

    /// Fetch every artifact under `base_dir/<destination_subdir>`
    pub fn fetch_all(&self, artifacts: &[ArtifactDescriptor], base_dir: &Path) -> Vec<FetchResult> {
        let mut results = Vec::new();
        for artifact in artifacts {
            let local_dir = base_dir.join(&artifact.destination_subdir);
            if artifact.kind == ArtifactKind::Glob {
                results.extend(self.fetch_glob(artifact, &local_dir));
            } else {
                results.push(self.fetch(artifact, &local_dir));
            }
        }
        results
    }

    fn fetch_listed(&self, object: &WorkspaceObject, listed_root: &str, local_root: &Path) -> FetchResult {
        let local_name = object.local_file_name();
        let relative_dir = object
            .path
            .strip_prefix(listed_root)
            .unwrap_or(&object.path)
            .trim_start_matches('/');
        let relative_dir = match relative_dir.rfind('/') {
            Some(idx) => &relative_dir[..idx],
            None => "",
        };
        let local_path = local_root.join(relative_dir).join(&local_name);
        let kind = ArtifactKind::from_path(&local_name);
        self.download(&object.path, kind, glob_member_category(&local_name), local_path)
    }

    /// Expand a glob artifact against the workspace tree and fetch its members
    pub fn fetch_glob(&self, artifact: &ArtifactDescriptor, local_dir: &Path) -> Vec<FetchResult> {
        let (prefix, pattern) = glob_parts(&artifact.origin_path);
        let glob = match Glob::new(pattern.trim_start_matches('/')) {
            Ok(glob) => glob,
            Err(e) => return vec![FetchResult::failed(artifact, format!("invalid glob: {e}"))],
        };
        let listing = match self.api.list_recursive(&prefix) {
            Ok(listing) => listing,
            Err(e) => return vec![FetchResult::failed(artifact, e.to_string())],
        };

        let local_root = local_dir.join(basename(&prefix));
        listing
            .iter()
            .filter(|object| {
                let candidate = object.path.trim_start_matches('/');
                glob.matched(&CandidatePath::from(candidate)).is_some()
            })
            .filter(|object| {
                let keep = self.export_libraries
                    || glob_member_category(&object.local_file_name()) == ArtifactCategory::Source;
                if !keep {
                    tracing::debug!(path = %object.path, "Skipping library in glob match set");
                }
                keep
            })
            .map(|object| self.fetch_listed(object, &prefix, &local_root))
            .collect()
    }

    /// Mirror a pipeline root folder under `local_dir`
    ///
    /// Fails only when the folder itself cannot be listed.
    pub fn fetch_root_folder(&self, root_path: &str, local_dir: &Path) -> Result<Vec<FetchResult>> {
        let root = root_path.trim_end_matches('/');
        let listing = self.api.list_recursive(root)?;
        tracing::debug!(root_path = root, files = listing.len(), "Listed root folder");
        Ok(listing
            .iter()
            .map(|object| self.fetch_listed(object, root, local_dir))
            .collect())
    }
}

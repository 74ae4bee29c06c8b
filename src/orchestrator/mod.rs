//! Resource export orchestration
//!
//! Each active resource runs through a fixed sequence of states:
//!
//! ```text
//! Discovering -> Generating -> Classifying -> Fetching -> Mapping
//!     -> Relocating -> Rewriting -> Validating -> Cleaning -> Done
//! ```
//!
//! Any error moves the resource to `Failed`. Errors are caught at the
//! resource boundary, so one failed resource never stops the run. The
//! generated document is held by a [`BackupGuard`] from before generation
//! until validation succeeds; dropping the guard early puts the previous
//! document back.
//!
//! Resources are processed one at a time: the external generator writes
//! into a shared target directory.

pub mod relocate;
pub mod report;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub use relocate::{LIBRARY_DIR, MappingInputs, MappingPlan, Relocation, RelocationStats, SOURCE_DIR};
pub use report::{ArtifactSummary, ResourceOutcome, ResourceReport, RunReport};

use crate::backup::BackupGuard;
use crate::bindings::{self, Binding};
use crate::classifier::classify;
use crate::common::fs::copy_file;
use crate::common::path_utils::resolve_mapped;
use crate::common::string_utils::slugify;
use crate::config::ExportConfig;
use crate::discovery::discover;
use crate::document::{self, BundleDocument, RewriteContext};
use crate::domain::{ArtifactDescriptor, FetchResult, ResourceDescriptor};
use crate::error::{self, ExportError, Result};
use crate::fetcher::ArtifactFetcher;
use crate::generator::{BundleGenerator, GenerateRequest, RESOURCES_DIR, prepare_manifest};
use crate::hash::hash_file;
use crate::interrupt;
use crate::path_mapper::PathMapper;
use crate::progress::ProgressDisplay;
use crate::workspace_api::{PermissionsProvider, WorkspaceApi};

/// Prefix of the per-resource staging directory inside the export root
pub const STAGING_PREFIX: &str = ".wfexport-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Discovering,
    Generating,
    Classifying,
    Fetching,
    Mapping,
    Relocating,
    Rewriting,
    Validating,
    Cleaning,
    Done,
}

impl ExportState {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportState::Discovering => "discovering",
            ExportState::Generating => "generating",
            ExportState::Classifying => "classifying",
            ExportState::Fetching => "fetching",
            ExportState::Mapping => "mapping",
            ExportState::Relocating => "relocating",
            ExportState::Rewriting => "rewriting",
            ExportState::Validating => "validating",
            ExportState::Cleaning => "cleaning",
            ExportState::Done => "done",
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document key for a resource: the workspace name, else the configured name, else the id
fn resource_key(resource: &ResourceDescriptor, discovered_name: Option<&str>) -> String {
    let name = discovered_name
        .or(resource.display_name.as_deref())
        .unwrap_or(&resource.id);
    let key = slugify(name);
    if key.is_empty() {
        slugify(&format!("{}_{}", resource.kind, resource.id))
    } else {
        key
    }
}

pub struct ResourceExportOrchestrator<'a, A, G> {
    config: &'a ExportConfig,
    api: &'a A,
    generator: &'a G,
    mapper: PathMapper,
    substitutions: Vec<(String, String)>,
    progress: Option<&'a ProgressDisplay>,
}

impl<'a, A, G> ResourceExportOrchestrator<'a, A, G>
where
    A: WorkspaceApi + PermissionsProvider,
    G: BundleGenerator,
{
    pub fn new(config: &'a ExportConfig, api: &'a A, generator: &'a G) -> Result<Self> {
        Ok(Self {
            config,
            api,
            generator,
            mapper: PathMapper::new(&config.path_rules()?)?,
            substitutions: config.value_replacements()?,
            progress: None,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a ProgressDisplay) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Export every active resource in configured order
    ///
    /// Only a configuration without active resources fails the run itself.
    pub fn run(&self) -> Result<RunReport> {
        let resources = self.config.require_active_resources()?;
        let global = self.config.export_libraries();
        tracing::info!(count = resources.len(), "Exporting resources");

        let mut report = RunReport::default();
        for resource in &resources {
            if interrupt::is_interrupted() {
                report.interrupted = true;
                break;
            }

            let entry = self.export(resource, global);
            if entry.outcome == ResourceOutcome::SucceededWithBinding {
                if let Some(key) = &entry.resource_key {
                    report.bindings.push(Binding::new(key.clone(), resource.id.clone()));
                }
            }
            report.resources.push(entry);
            if let Some(progress) = self.progress {
                progress.inc_resource();
            }

            if interrupt::is_interrupted() {
                tracing::warn!("Interrupted; skipping remaining resources");
                report.interrupted = true;
                break;
            }
        }

        if let Err(e) = bindings::append(&self.config.bindings_csv_path(), &report.bindings) {
            tracing::error!(error = %e, "Failed to record resource bindings");
        }

        tracing::info!(
            succeeded = report.successful().len(),
            failed = report.failed().len(),
            "Export finished"
        );
        Ok(report)
    }

    /// Export one resource, converting any failure into a `Failed` report
    pub fn export(&self, resource: &ResourceDescriptor, global_export_libraries: bool) -> ResourceReport {
        let mut report = ResourceReport::new(resource);
        match self.export_resource(resource, global_export_libraries, &mut report) {
            Ok(()) => {
                report.outcome = if resource.is_existing {
                    ResourceOutcome::SucceededWithBinding
                } else {
                    ResourceOutcome::Succeeded
                };
                tracing::info!(resource_id = %resource.id, kind = %resource.kind, "Exported");
            }
            Err(e) => {
                tracing::error!(resource_id = %resource.id, kind = %resource.kind, error = %e, "Export failed");
                report.error = Some(e.to_string());
                report.outcome = ResourceOutcome::Failed;
            }
        }
        report
    }

    fn enter(&self, state: ExportState, resource: &ResourceDescriptor) -> Result<()> {
        if interrupt::is_interrupted() {
            return Err(ExportError::Interrupted);
        }
        tracing::debug!(resource_id = %resource.id, kind = %resource.kind, %state, "Entering state");
        if let Some(progress) = self.progress {
            progress.update_resource(&resource.label(), state.as_str());
        }
        Ok(())
    }

    fn export_resource(
        &self,
        resource: &ResourceDescriptor,
        global_export_libraries: bool,
        report: &mut ResourceReport,
    ) -> Result<()> {
        let export_libraries = resource.effective_export_libraries(global_export_libraries);
        let target_dir = self.config.start_path();
        let resources_dir = target_dir.join(RESOURCES_DIR);

        self.enter(ExportState::Discovering, resource)?;
        let raw = self.api.resource_definition(resource.kind, &resource.id)?;
        let discovered = discover(resource.kind, &resource.id, &raw)?;
        let key = resource_key(resource, discovered.name.as_deref());
        report.resource_key = Some(key.clone());
        tracing::debug!(
            resource_id = %resource.id,
            key = %key,
            tasks = discovered.tasks.len(),
            export_libraries,
            "Discovered resource"
        );

        self.enter(ExportState::Generating, resource)?;
        fs::create_dir_all(&resources_dir)
            .map_err(|e| error::file_write_failed(resources_dir.display().to_string(), e.to_string()))?;
        prepare_manifest(&self.config.manifest_path(), &target_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&target_dir)?;
        let source_dir = staging.path().join("src");
        fs::create_dir_all(&source_dir)?;
        let request = GenerateRequest {
            kind: resource.kind,
            resource_id: &resource.id,
            resource_key: &key,
            target_dir: &target_dir,
            source_dir: &source_dir,
        };
        let guard = BackupGuard::create(&request.document_path())?;
        let output = self.generator.generate(&request)?;
        self.keep_generated_copy(&output.document_path);

        self.enter(ExportState::Classifying, resource)?;
        let artifacts = if discovered.is_root_folder() {
            tracing::debug!(resource_id = %resource.id, "Root-folder pipeline; per-task classification skipped");
            Vec::new()
        } else {
            classify(&discovered.tasks, export_libraries)
        };

        self.enter(ExportState::Fetching, resource)?;
        let fetcher = ArtifactFetcher::new(self.api, export_libraries);
        let fetch_dir = staging.path().join("fetched");
        let fetched = fetcher.fetch_all(&artifacts, &fetch_dir);
        let root_folder = match discovered.root_path.as_deref() {
            Some(root) => fetcher
                .fetch_root_folder(root, &fetch_dir.join("root"))
                .unwrap_or_else(|e| {
                    tracing::warn!(root_path = root, error = %e, "Failed to list root folder");
                    vec![FetchResult::failed(&ArtifactDescriptor::source(root), e.to_string())]
                }),
            None => Vec::new(),
        };
        report.artifacts.record(&fetched);
        report.artifacts.record(&root_folder);

        self.enter(ExportState::Mapping, resource)?;
        let plan = relocate::plan(
            &self.mapper,
            &MappingInputs {
                resources_dir: &resources_dir,
                generated_root: &source_dir,
                generated: &output.source_files,
                tasks: &discovered.tasks,
                fetched: &fetched,
                root_folder: &root_folder,
                root_path: discovered.root_path.as_deref(),
            },
        );

        self.enter(ExportState::Relocating, resource)?;
        let stats = relocate::relocate(&plan.relocations);

        self.enter(ExportState::Rewriting, resource)?;
        let mut doc = BundleDocument::load(&output.document_path)?;
        let ctx = RewriteContext {
            kind: resource.kind,
            resource_id: &resource.id,
            resource_key: &key,
            tasks: &discovered.tasks,
            mapping: &plan.mapping,
            substitutions: &self.substitutions,
            spark_conf_rules: &self.config.spark_conf_key_replacements,
            export_libraries,
        };
        let summary = document::rewrite(&mut doc, &ctx, self.api)?;
        doc.save()?;
        report.unmapped_paths = summary.paths.unmapped;

        self.enter(ExportState::Validating, resource)?;
        validate(resource, &key, &output.document_path, &resources_dir, &plan, &stats)?;
        report.document_digest = Some(hash_file(&output.document_path)?);
        report.document_path = Some(output.document_path);

        self.enter(ExportState::Cleaning, resource)?;
        guard.commit()?;
        if let Err(e) = staging.close() {
            tracing::warn!(error = %e, "Failed to remove staging directory");
        }

        tracing::debug!(resource_id = %resource.id, state = %ExportState::Done, "Resource complete");
        Ok(())
    }

    /// Save the generator's document, before any rewrite, to the backup directory
    fn keep_generated_copy(&self, document_path: &Path) {
        let Some(name) = document_path.file_name() else {
            return;
        };
        let copy = self.config.backup_dir().join(name);
        if let Err(e) = copy_file(document_path, &copy) {
            tracing::warn!(path = %copy.display(), error = %e, "Failed to save generated document copy");
        }
    }
}

/// The final document holds the resource, every moved file is in place, and
/// each export directory the plan targeted exists
fn validate(
    resource: &ResourceDescriptor,
    key: &str,
    document_path: &Path,
    resources_dir: &Path,
    plan: &MappingPlan,
    stats: &RelocationStats,
) -> Result<()> {
    if !document_path.is_file() {
        return Err(error::validation_failed(format!(
            "expected document {} is missing",
            document_path.display()
        )));
    }

    let doc = BundleDocument::load(document_path)?;
    if doc.resource(resource.kind, key).is_none() {
        return Err(error::resource_not_in_document(
            key,
            document_path.display().to_string(),
        ));
    }

    let missing: Vec<&PathBuf> = stats.moved.iter().filter(|to| !to.is_file()).collect();
    if !missing.is_empty() {
        return Err(error::validation_failed(format!(
            "relocated files are missing: {missing:?}"
        )));
    }

    for name in [SOURCE_DIR, LIBRARY_DIR] {
        let Some(dir) = resolve_mapped(resources_dir, &format!("../{name}")) else {
            continue;
        };
        let targeted = plan.relocations.iter().any(|r| r.to.starts_with(&dir));
        if targeted && !dir.is_dir() {
            return Err(error::validation_failed(format!(
                "expected directory {} is missing",
                dir.display()
            )));
        }
    }
    Ok(())
}

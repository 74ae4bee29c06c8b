//! Common test utilities for wf-export integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use wfexport::common::path_utils::relative_to;
use wfexport::config::ExportConfig;
use wfexport::domain::ResourceKind;
use wfexport::error::{self, Result};
use wfexport::generator::{BundleGenerator, GenerateRequest, GeneratedOutput, scan_output};
use wfexport::workspace_api::{
    ObjectType, PermissionEntry, PermissionsProvider, PrincipalKind, WorkspaceApi, WorkspaceObject,
};

/// A test workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace with a bundle manifest
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        let workspace = Self { temp, path };
        workspace.write_file("databricks.yml", "bundle:\n  name: exported\n");
        workspace
    }

    /// Export root used by every config this fixture writes
    pub fn export_dir(&self) -> PathBuf {
        self.path.join("export")
    }

    /// Config YAML with locations inside this workspace, followed by `body`
    pub fn config_yaml(&self, body: &str) -> String {
        format!(
            "initial_variables:\n  v_start_path: {}\n  v_databricks_yml_path: {}\n{body}",
            self.export_dir().display(),
            self.path.join("databricks.yml").display()
        )
    }

    pub fn config(&self, body: &str) -> ExportConfig {
        ExportConfig::from_yaml(&self.config_yaml(body)).expect("Failed to parse test config")
    }

    /// Write config.yml and return its path
    pub fn write_config(&self, body: &str) -> PathBuf {
        self.write_file("config.yml", &self.config_yaml(body));
        self.path.join("config.yml")
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Names in the export root that look like staging directories
    pub fn staging_dirs(&self) -> Vec<String> {
        std::fs::read_dir(self.export_dir())
            .map(|entries| {
                entries
                    .filter_map(std::result::Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| name.starts_with(".wfexport-"))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get path to wf-export binary
    pub fn wf_export_bin() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_wf-export"))
    }
}

fn not_found(endpoint: &str) -> error::ExportError {
    error::api_request_failed(endpoint, "404 Not Found: RESOURCE_DOES_NOT_EXIST")
}

/// In-memory workspace: definitions, files, listings and permissions
#[derive(Default)]
pub struct FakeWorkspace {
    pub jobs: HashMap<String, Value>,
    pub pipelines: HashMap<String, Value>,
    pub text: HashMap<String, String>,
    pub binary: HashMap<String, Vec<u8>>,
    pub volume: HashMap<String, Vec<u8>>,
    pub tree: HashMap<String, Vec<WorkspaceObject>>,
    pub permissions: Vec<PermissionEntry>,
    /// Every file read, in order
    pub reads: RefCell<Vec<String>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self {
            permissions: vec![
                PermissionEntry::new(PrincipalKind::User, "amy@corp.com", "IS_OWNER"),
                PermissionEntry::new(PrincipalKind::Group, "data-eng", "CAN_MANAGE_RUN"),
            ],
            ..Self::default()
        }
    }

    pub fn with_job(mut self, id: &str, settings: Value) -> Self {
        self.jobs.insert(id.to_string(), serde_json::json!({ "job_id": id, "settings": settings }));
        self
    }

    pub fn with_pipeline(mut self, id: &str, spec: Value) -> Self {
        self.pipelines.insert(id.to_string(), serde_json::json!({ "pipeline_id": id, "spec": spec }));
        self
    }

    pub fn with_text(mut self, path: &str, content: &str) -> Self {
        self.text.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_volume_file(mut self, path: &str, content: &[u8]) -> Self {
        self.volume.insert(path.to_string(), content.to_vec());
        self
    }

    pub fn with_listing(mut self, dir: &str, objects: Vec<WorkspaceObject>) -> Self {
        self.tree.insert(dir.to_string(), objects);
        self
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.borrow().clone()
    }
}

impl WorkspaceApi for FakeWorkspace {
    fn job_settings(&self, job_id: &str) -> Result<Value> {
        self.jobs.get(job_id).cloned().ok_or_else(|| not_found("/api/2.1/jobs/get"))
    }

    fn pipeline_spec(&self, pipeline_id: &str) -> Result<Value> {
        self.pipelines
            .get(pipeline_id)
            .cloned()
            .ok_or_else(|| not_found("/api/2.0/pipelines"))
    }

    fn export_text(&self, path: &str) -> Result<String> {
        self.reads.borrow_mut().push(path.to_string());
        self.text.get(path).cloned().ok_or_else(|| not_found("/api/2.0/workspace/export"))
    }

    fn export_binary(&self, path: &str) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push(path.to_string());
        self.binary.get(path).cloned().ok_or_else(|| not_found("/api/2.0/workspace/export"))
    }

    fn read_volume_file(&self, path: &str) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push(path.to_string());
        self.volume.get(path).cloned().ok_or_else(|| not_found("/api/2.0/fs/files"))
    }

    fn list(&self, path: &str) -> Result<Vec<WorkspaceObject>> {
        self.tree.get(path).cloned().ok_or_else(|| not_found("/api/2.0/workspace/list"))
    }
}

impl PermissionsProvider for FakeWorkspace {
    fn permissions(&self, _kind: ResourceKind, _id: &str) -> Result<Vec<PermissionEntry>> {
        Ok(self.permissions.clone())
    }
}

pub fn notebook(path: &str) -> WorkspaceObject {
    WorkspaceObject::new(path, ObjectType::Notebook).with_language("PYTHON")
}

pub fn file(path: &str) -> WorkspaceObject {
    WorkspaceObject::new(path, ObjectType::File)
}

pub fn directory(path: &str) -> WorkspaceObject {
    WorkspaceObject::new(path, ObjectType::Directory)
}

/// What the fake generator does for one resource id
pub enum Script {
    /// Write `document` (with `{src}` replaced by the `resources/`-relative
    /// source dir) and the given source files
    Emit {
        document: String,
        files: Vec<(String, String)>,
    },
    Fail(String),
}

/// Stands in for the external `bundle generate` command
#[derive(Default)]
pub struct FakeGenerator {
    scripts: HashMap<String, Script>,
    /// Runs after a successful emit, e.g. to simulate Ctrl-C
    pub after_emit: Option<Box<dyn Fn()>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(mut self, id: &str, document: &str, files: &[(&str, &str)]) -> Self {
        self.scripts.insert(
            id.to_string(),
            Script::Emit {
                document: document.to_string(),
                files: files
                    .iter()
                    .map(|(name, content)| ((*name).to_string(), (*content).to_string()))
                    .collect(),
            },
        );
        self
    }

    pub fn fail(mut self, id: &str, stderr: &str) -> Self {
        self.scripts.insert(id.to_string(), Script::Fail(stderr.to_string()));
        self
    }
}

impl BundleGenerator for FakeGenerator {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<GeneratedOutput> {
        self.calls.borrow_mut().push(request.resource_id.to_string());
        match self.scripts.get(request.resource_id) {
            Some(Script::Emit { document, files }) => {
                for (name, content) in files {
                    let path = request.source_dir.join(name);
                    std::fs::create_dir_all(path.parent().unwrap_or(Path::new("."))).unwrap();
                    std::fs::write(path, content).unwrap();
                }
                let src = relative_to(request.source_dir, &request.resources_dir()).unwrap();
                std::fs::create_dir_all(request.resources_dir()).unwrap();
                std::fs::write(request.document_path(), document.replace("{src}", &src)).unwrap();
                if let Some(hook) = &self.after_emit {
                    hook();
                }
                scan_output(request)
            }
            Some(Script::Fail(stderr)) => Err(error::generator_failed(request.resource_id, stderr.clone())),
            None => Err(error::generator_failed(request.resource_id, "no script")),
        }
    }
}

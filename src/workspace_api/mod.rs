//! Workspace access capability
//!
//! The export core only talks to the workspace through [`WorkspaceApi`] and
//! [`PermissionsProvider`]. Credentials are the caller's concern; the REST
//! implementation in [`rest`] receives an already-issued token.

pub mod rest;

pub use rest::RestWorkspaceClient;

use serde_json::Value;

use crate::common::string_utils::basename;
use crate::domain::ResourceKind;
use crate::error::Result;

/// Administrative group; implicit on every resource
pub const ADMINS_GROUP: &str = "admins";

/// Type of a workspace tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Notebook,
    File,
    Directory,
    Repo,
    Library,
    Other,
}

impl ObjectType {
    pub fn from_api(value: &str) -> Self {
        match value {
            "NOTEBOOK" => ObjectType::Notebook,
            "FILE" => ObjectType::File,
            "DIRECTORY" => ObjectType::Directory,
            "REPO" => ObjectType::Repo,
            "LIBRARY" => ObjectType::Library,
            _ => ObjectType::Other,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ObjectType::Directory | ObjectType::Repo)
    }
}

/// One entry of a workspace directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceObject {
    pub path: String,
    pub object_type: ObjectType,
    /// Notebook language (`PYTHON`, `SQL`, `SCALA`, `R`)
    pub language: Option<String>,
}

impl WorkspaceObject {
    pub fn new(path: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            path: path.into(),
            object_type,
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Local file name; notebooks gain the extension of their language
    pub fn local_file_name(&self) -> String {
        let name = basename(&self.path);
        if self.object_type != ObjectType::Notebook {
            return name.to_string();
        }
        let extension = match self.language.as_deref() {
            Some("SQL") => "sql",
            Some("SCALA") => "scala",
            Some("R") => "r",
            _ => "py",
        };
        format!("{name}.{extension}")
    }
}

/// Principal an access-control entry applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrincipalKind {
    User,
    Group,
    ServicePrincipal,
}

impl PrincipalKind {
    /// Field name used both by the API and the bundle document
    pub fn field(self) -> &'static str {
        match self {
            PrincipalKind::User => "user_name",
            PrincipalKind::Group => "group_name",
            PrincipalKind::ServicePrincipal => "service_principal_name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PermissionEntry {
    pub principal_kind: PrincipalKind,
    pub principal: String,
    pub level: String,
}

impl PermissionEntry {
    pub fn new(
        principal_kind: PrincipalKind,
        principal: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            principal_kind,
            principal: principal.into(),
            level: level.into(),
        }
    }
}

/// Read access to resource definitions and workspace files
pub trait WorkspaceApi {
    /// Raw `jobs/get` response
    fn job_settings(&self, job_id: &str) -> Result<Value>;

    /// Raw `pipelines/{id}` response
    fn pipeline_spec(&self, pipeline_id: &str) -> Result<Value>;

    /// Export a workspace file or notebook as UTF-8 source
    fn export_text(&self, path: &str) -> Result<String>;

    /// Export a workspace file byte-exact
    fn export_binary(&self, path: &str) -> Result<Vec<u8>>;

    /// Read a file from a managed volume
    fn read_volume_file(&self, path: &str) -> Result<Vec<u8>>;

    /// List one level of a workspace directory
    fn list(&self, path: &str) -> Result<Vec<WorkspaceObject>>;

    fn resource_definition(&self, kind: ResourceKind, id: &str) -> Result<Value> {
        match kind {
            ResourceKind::Job => self.job_settings(id),
            ResourceKind::Pipeline => self.pipeline_spec(id),
        }
    }

    /// List every non-directory entry below `path`, depth first, sorted by path
    fn list_recursive(&self, path: &str) -> Result<Vec<WorkspaceObject>> {
        let mut files = Vec::new();
        let mut pending = vec![path.to_string()];
        while let Some(dir) = pending.pop() {
            for object in self.list(&dir)? {
                if object.object_type.is_container() {
                    pending.push(object.path);
                } else {
                    files.push(object);
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

/// Source of a resource's access-control list
pub trait PermissionsProvider {
    fn permissions(&self, kind: ResourceKind, id: &str) -> Result<Vec<PermissionEntry>>;
}

/// Convert a permissions API response into sorted entries, without `admins`
///
/// Each entry keeps its first non-inherited level, or its first level when all
/// are inherited.
pub fn parse_access_control_list(response: &Value) -> Vec<PermissionEntry> {
    let Some(entries) = response.get("access_control_list").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut permissions: Vec<PermissionEntry> = entries
        .iter()
        .filter_map(|entry| {
            let (kind, principal) = [
                PrincipalKind::User,
                PrincipalKind::Group,
                PrincipalKind::ServicePrincipal,
            ]
            .into_iter()
            .find_map(|kind| {
                entry
                    .get(kind.field())
                    .and_then(Value::as_str)
                    .map(|name| (kind, name))
            })?;

            if kind == PrincipalKind::Group && principal == ADMINS_GROUP {
                return None;
            }

            let levels = entry.get("all_permissions").and_then(Value::as_array)?;
            let level = levels
                .iter()
                .find(|l| !l.get("inherited").and_then(Value::as_bool).unwrap_or(false))
                .or_else(|| levels.first())
                .and_then(|l| l.get("permission_level"))
                .and_then(Value::as_str)?;

            Some(PermissionEntry::new(kind, principal, level))
        })
        .collect();

    permissions.sort();
    permissions.dedup();
    permissions
}

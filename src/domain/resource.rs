//! Resource domain types

use std::fmt;

/// Kind of exported resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Job,
    Pipeline,
}

impl ResourceKind {
    /// Singular name, also the generated document suffix (`<slug>.job.yml`)
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Job => "job",
            ResourceKind::Pipeline => "pipeline",
        }
    }

    /// Key of the resource collection inside a bundle document
    pub fn collection_key(self) -> &'static str {
        match self {
            ResourceKind::Job => "jobs",
            ResourceKind::Pipeline => "pipelines",
        }
    }

    /// File name of the generated document for a resource key
    pub fn document_file_name(self, resource_key: &str) -> String {
        format!("{}.{}.yml", resource_key, self.as_str())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured job or pipeline, immutable while it is being processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub id: String,
    /// Name given in configuration; the authoritative name comes from the workspace
    pub display_name: Option<String>,
    /// Resource already deployed and should be bound rather than recreated
    pub is_existing: bool,
    pub is_active: bool,
    pub export_libraries_override: Option<bool>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            display_name: None,
            is_existing: false,
            is_active: true,
            export_libraries_override: None,
        }
    }

    /// Resolve the export-libraries flag for this resource
    ///
    /// A global `false` always wins over a resource-level `true`.
    pub fn effective_export_libraries(&self, global: bool) -> bool {
        global && self.export_libraries_override.unwrap_or(true)
    }

    /// Short human label, e.g. `job 123 (Daily ETL)`
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) => format!("{} {} ({})", self.kind, self.id, name),
            None => format!("{} {}", self.kind, self.id),
        }
    }
}

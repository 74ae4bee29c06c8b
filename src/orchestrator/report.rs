//! Per-resource and run-level results

use std::path::PathBuf;

use crate::bindings::Binding;
use crate::domain::{FetchResult, ResourceDescriptor, ResourceKind};

/// Terminal outcome of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOutcome {
    /// Exported, and recorded in the bindings file
    SucceededWithBinding,
    Succeeded,
    Failed,
}

impl ResourceOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, ResourceOutcome::Failed)
    }
}

/// Fetch counters for one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_origins: Vec<String>,
}

impl ArtifactSummary {
    pub fn record(&mut self, results: &[FetchResult]) {
        for result in results {
            self.attempted += 1;
            if result.is_success() {
                self.succeeded += 1;
            } else {
                self.failed += 1;
                self.failed_origins.push(result.origin_path.clone());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReport {
    pub kind: ResourceKind,
    pub resource_id: String,
    pub label: String,
    /// Slug the document is keyed by, once known
    pub resource_key: Option<String>,
    pub outcome: ResourceOutcome,
    pub artifacts: ArtifactSummary,
    pub document_path: Option<PathBuf>,
    /// BLAKE3 digest of the final document
    pub document_digest: Option<String>,
    /// Document paths left unmodified for lack of a mapping entry
    pub unmapped_paths: Vec<String>,
    pub error: Option<String>,
}

impl ResourceReport {
    pub fn new(resource: &ResourceDescriptor) -> Self {
        Self {
            kind: resource.kind,
            resource_id: resource.id.clone(),
            label: resource.label(),
            resource_key: None,
            outcome: ResourceOutcome::Failed,
            artifacts: ArtifactSummary::default(),
            document_path: None,
            document_digest: None,
            unmapped_paths: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub resources: Vec<ResourceReport>,
    /// Rows appended to the bindings file
    pub bindings: Vec<Binding>,
    /// The run stopped early on Ctrl-C
    pub interrupted: bool,
}

impl RunReport {
    pub fn successful(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|r| r.outcome.is_success())
            .map(|r| r.resource_id.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.resource_id.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.interrupted && self.resources.iter().all(|r| r.outcome.is_success())
    }

    pub fn get(&self, resource_id: &str) -> Option<&ResourceReport> {
        self.resources.iter().find(|r| r.resource_id == resource_id)
    }
}

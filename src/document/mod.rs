//! Generated bundle document: load, rewrite, persist
//!
//! The document is loaded once, run through the ordered passes in
//! [`passes`], and serialized once with [`emit::emit`].

pub mod emit;
pub mod passes;
pub mod schema;

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::common::fs::{read_to_string, write_file};
use crate::config::SparkConfRule;
use crate::domain::{PathMapping, ResourceKind, TaskDescriptor};
use crate::error::{self, Result};
use crate::workspace_api::PermissionsProvider;

pub use passes::PathRewriteStats;

/// Everything the rewrite passes need besides the document itself
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    pub kind: ResourceKind,
    pub resource_id: &'a str,
    /// Key the resource is stored under in the document
    pub resource_key: &'a str,
    pub tasks: &'a [TaskDescriptor],
    pub mapping: &'a PathMapping,
    pub substitutions: &'a [(String, String)],
    pub spark_conf_rules: &'a [SparkConfRule],
    pub export_libraries: bool,
}

/// What the passes changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub pause_status_removed: usize,
    pub permissions_injected: usize,
    pub paths: PathRewriteStats,
    pub clusters_transformed: usize,
}

/// A generated `<key>.<kind>.yml` document
#[derive(Debug, Clone)]
pub struct BundleDocument {
    path: PathBuf,
    root: Value,
}

impl BundleDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_to_string(path)?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)
            .map_err(|e| error::document_invalid(path.display().to_string(), e.to_string()))?;
        if !root.is_mapping() {
            return Err(error::document_invalid(
                path.display().to_string(),
                "top level is not a mapping",
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// `resources.<jobs|pipelines>.<key>`, or the only entry when the key differs
    pub fn resource(&self, kind: ResourceKind, key: &str) -> Option<&Mapping> {
        let collection = self
            .root
            .get("resources")?
            .get(kind.collection_key())?
            .as_mapping()?;
        let entry = match collection.get(key) {
            Some(entry) => entry,
            None if collection.len() == 1 => collection.values().next()?,
            None => return None,
        };
        entry.as_mapping()
    }

    pub fn resource_mut(&mut self, kind: ResourceKind, key: &str) -> Result<&mut Mapping> {
        let path = self.path.display().to_string();
        let missing = || error::resource_not_in_document(key, path.clone());

        let collection = self
            .root
            .get_mut("resources")
            .and_then(|resources| resources.get_mut(kind.collection_key()))
            .and_then(Value::as_mapping_mut)
            .ok_or_else(missing)?;

        let entry = if collection.contains_key(key) {
            collection.get_mut(key)
        } else if collection.len() == 1 {
            tracing::debug!(key, "Resource key not found; using the only entry");
            collection.values_mut().next()
        } else {
            None
        };
        entry.and_then(Value::as_mapping_mut).ok_or_else(missing)
    }

    pub fn to_yaml(&self) -> String {
        emit::emit(&self.root)
    }

    pub fn save(&self) -> Result<()> {
        write_file(&self.path, self.to_yaml().as_bytes())
    }
}

/// Run every pass, in order, against the resource entry of `doc`
pub fn rewrite<P: PermissionsProvider>(
    doc: &mut BundleDocument,
    ctx: &RewriteContext<'_>,
    permissions: &P,
) -> Result<RewriteSummary> {
    let path_keys = schema::path_valued_keys();
    let resource = doc.resource_mut(ctx.kind, ctx.resource_key)?;
    let mut summary = RewriteSummary {
        pause_status_removed: passes::remove_pause_status(resource),
        ..RewriteSummary::default()
    };

    summary.permissions_injected =
        passes::inject_permissions(resource, permissions, ctx.kind, ctx.resource_id)?;

    let mut tree = Value::Mapping(std::mem::take(resource));
    passes::substitute_values(&mut tree, ctx.substitutions, &path_keys);
    passes::normalize_nulls(&mut tree);
    if let Value::Mapping(map) = tree {
        *resource = map;
    }

    summary.paths = passes::rewrite_paths(
        resource,
        ctx.kind,
        ctx.tasks,
        ctx.mapping,
        ctx.export_libraries,
    );
    summary.clusters_transformed = passes::transform_clusters(resource, ctx.kind, ctx.spark_conf_rules);

    tracing::debug!(
        resource_id = ctx.resource_id,
        rewritten = summary.paths.rewritten,
        unmapped = summary.paths.unmapped.len(),
        permissions = summary.permissions_injected,
        "Rewrote document"
    );
    Ok(summary)
}

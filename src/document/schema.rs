//! Path-valued fields of bundle documents
//!
//! Every document field that holds a workspace path is declared here, per
//! resource dialect and task kind. Substitution skips values held under any
//! of these keys and path rewriting only touches these fields, so a new task
//! kind must be registered here before either pass will handle it.

use std::collections::BTreeSet;

use crate::domain::{LibraryKind, ResourceKind, TaskKind};

/// Location of a path value relative to a task (or pipeline library entry)
pub type FieldPath = &'static [&'static str];

const JOB_NOTEBOOK: &[FieldPath] = &[&["notebook_task", "notebook_path"]];
const JOB_SPARK_PYTHON: &[FieldPath] = &[&["spark_python_task", "python_file"]];
const JOB_SQL: &[FieldPath] = &[&["sql_task", "file", "path"]];

const PIPELINE_NOTEBOOK: &[FieldPath] = &[&["notebook", "path"]];
const PIPELINE_FILE: &[FieldPath] = &[&["file", "path"]];
const PIPELINE_GLOB: &[FieldPath] = &[&["glob", "include"]];

/// Library fields inside a library entry (`{whl: ...}` / `{jar: ...}`)
pub const LIBRARY_FIELDS: [LibraryKind; 2] = [LibraryKind::Wheel, LibraryKind::Jar];

/// Resource-level source root of folder-rooted pipelines
pub const ROOT_PATH_FIELD: &str = "root_path";

/// Key holding environment dependency lists
pub const DEPENDENCIES_FIELD: &str = "dependencies";

/// Source path fields of one task kind
pub fn source_fields(resource: ResourceKind, kind: TaskKind) -> &'static [FieldPath] {
    match (resource, kind) {
        (ResourceKind::Job, TaskKind::Notebook) => JOB_NOTEBOOK,
        (ResourceKind::Job, TaskKind::SparkPython) => JOB_SPARK_PYTHON,
        (ResourceKind::Job, TaskKind::Sql) => JOB_SQL,
        (ResourceKind::Pipeline, TaskKind::Notebook) => PIPELINE_NOTEBOOK,
        (ResourceKind::Pipeline, TaskKind::SparkPython | TaskKind::Sql) => PIPELINE_FILE,
        (ResourceKind::Pipeline, TaskKind::Glob) => PIPELINE_GLOB,
        _ => &[],
    }
}

const ALL_TASK_KINDS: [TaskKind; 7] = [
    TaskKind::Notebook,
    TaskKind::SparkPython,
    TaskKind::PythonWheel,
    TaskKind::Sql,
    TaskKind::Environment,
    TaskKind::Library,
    TaskKind::Glob,
];

/// Every key whose value is a path, derived from the declarations above
pub fn path_valued_keys() -> BTreeSet<&'static str> {
    let mut keys = BTreeSet::new();
    for resource in [ResourceKind::Job, ResourceKind::Pipeline] {
        for kind in ALL_TASK_KINDS {
            for field in source_fields(resource, kind) {
                if let Some(leaf) = field.last() {
                    keys.insert(*leaf);
                }
            }
        }
    }
    for library in LIBRARY_FIELDS {
        keys.insert(library.field());
    }
    keys.insert(ROOT_PATH_FIELD);
    keys.insert(DEPENDENCIES_FIELD);
    keys
}

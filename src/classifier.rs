//! Artifact classification
//!
//! Enumerates the files a resource needs locally, independent of how they are
//! obtained. Notebooks are left to the bundle generator. Library artifacts are
//! emitted only when the export-libraries flag is on; source files always are.

use std::collections::HashSet;

use crate::domain::{
    ArtifactCategory, ArtifactDescriptor, ArtifactKind, LibraryKind, LibraryRef, TaskDescriptor,
    TaskPayload,
};

/// Paths the workspace can serve; relative paths belong to a git source
pub fn is_workspace_path(path: &str) -> bool {
    path.starts_with('/') || path.starts_with("dbfs:/")
}

fn library_artifact(library: &LibraryRef) -> ArtifactDescriptor {
    let kind = match library.kind {
        LibraryKind::Wheel => ArtifactKind::Wheel,
        LibraryKind::Jar => ArtifactKind::Jar,
    };
    ArtifactDescriptor::library(library.path.clone(), kind)
}

/// Classify the artifacts required by `tasks`
pub fn classify(tasks: &[TaskDescriptor], export_libraries: bool) -> Vec<ArtifactDescriptor> {
    let mut seen = HashSet::new();
    let mut artifacts = Vec::new();
    let mut push = |artifact: ArtifactDescriptor| {
        if seen.insert(artifact.origin_path.clone()) {
            artifacts.push(artifact);
        }
    };

    for task in tasks {
        match &task.payload {
            TaskPayload::Notebook { .. }
            | TaskPayload::PythonWheel { .. }
            | TaskPayload::Library => {}
            TaskPayload::SparkPython { python_file: path } | TaskPayload::Sql { sql_file: path } => {
                if is_workspace_path(path) {
                    push(ArtifactDescriptor::source(path.clone()));
                } else {
                    tracing::debug!(task_key = %task.task_key, path = %path, "Skipping relative source path");
                }
            }
            TaskPayload::Environment { dependencies } => {
                if export_libraries {
                    for dependency in dependencies.iter().filter(|d| is_workspace_path(d)) {
                        push(ArtifactDescriptor::library(
                            dependency.clone(),
                            ArtifactKind::from_path(dependency),
                        ));
                    }
                }
            }
            TaskPayload::Glob { include } => {
                push(ArtifactDescriptor::new(
                    include.clone(),
                    ArtifactKind::Glob,
                    ArtifactCategory::Source,
                ));
            }
        }

        if export_libraries {
            for library in &task.libraries {
                push(library_artifact(library));
            }
        }
    }

    artifacts
}

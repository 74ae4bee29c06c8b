//! Path mapping construction and file relocation
//!
//! Every file that ends up in the export has an origin key (the literal the
//! generated document uses for it) and a mapped path relative to
//! `resources/`. The mapped path also decides where the file lands on disk.

use std::path::{Path, PathBuf};

use crate::common::fs::move_file;
use crate::common::path_utils::{relative_to, resolve_mapped, to_slash};
use crate::common::string_utils::{basename, file_stem};
use crate::domain::{ArtifactCategory, FetchResult, PathMapping, TaskDescriptor, TaskPayload};
use crate::path_mapper::{PathMapper, RenameTable, rename_table_from};

/// Export-root directory for source files
pub const SOURCE_DIR: &str = "src";
/// Export-root directory for library files
pub const LIBRARY_DIR: &str = "libs";

/// Where a staged file has to move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Everything the mapping step reads
#[derive(Debug, Clone, Copy)]
pub struct MappingInputs<'a> {
    pub resources_dir: &'a Path,
    /// Directory the generator wrote its source files to
    pub generated_root: &'a Path,
    pub generated: &'a [PathBuf],
    pub tasks: &'a [TaskDescriptor],
    pub fetched: &'a [FetchResult],
    /// Files mirrored from a pipeline root folder
    pub root_folder: &'a [FetchResult],
    pub root_path: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct MappingPlan {
    pub mapping: PathMapping,
    pub relocations: Vec<Relocation>,
}

impl MappingPlan {
    fn add(&mut self, resources_dir: &Path, origin: String, mapped: String, local: Option<&Path>) {
        if let Some(local) = local {
            match resolve_mapped(resources_dir, &mapped) {
                // First claim on a target wins; a second file would overwrite it
                Some(to) if self.relocations.iter().any(|r| r.to == to) => {
                    tracing::warn!(
                        origin = %origin,
                        target = %to.display(),
                        "Another file already maps to this target; skipping"
                    );
                    return;
                }
                Some(to) => self.relocations.push(Relocation {
                    from: local.to_path_buf(),
                    to,
                }),
                None => tracing::warn!(
                    origin = %origin,
                    mapped = %mapped,
                    "Mapped path has no local location; file stays staged"
                ),
            }
        }
        self.mapping.insert(origin, mapped);
    }
}

/// Library files are collected flat under `libs/`
fn library_path(local_name: &str) -> String {
    format!("../{LIBRARY_DIR}/{local_name}")
}

fn replace_final_segment(path: &str, name: &str) -> String {
    let dir_len = path.len() - basename(path).len();
    format!("{}{}", &path[..dir_len], name)
}

/// Notebook path of the task whose notebook the generator emitted as `emitted_name`
///
/// The generator only writes notebooks; script and SQL files arrive through
/// the fetcher and must not claim a generated file.
fn generated_origin<'t>(tasks: &'t [TaskDescriptor], emitted_name: &str) -> Option<&'t str> {
    let stem = file_stem(emitted_name);
    tasks
        .iter()
        .filter_map(TaskDescriptor::notebook_path)
        .find(|origin| file_stem(origin) == stem)
}

fn local_name(result: &FetchResult, local: &Path) -> String {
    local
        .file_name()
        .map_or_else(|| basename(&result.origin_path).to_string(), |n| n.to_string_lossy().into_owned())
}

/// Build the path mapping and the list of moves for one resource
pub fn plan(mapper: &PathMapper, inputs: &MappingInputs<'_>) -> MappingPlan {
    let mut plan = MappingPlan::default();
    let resources_dir = inputs.resources_dir;

    let emitted_names: Vec<String> = inputs
        .generated
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    let rename_table: RenameTable = rename_table_from(emitted_names.iter().map(String::as_str));

    for staged in inputs.generated {
        let Some(key) = relative_to(staged, resources_dir) else {
            continue;
        };
        let name = staged
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.ends_with(".yml") || name.ends_with(".yaml") {
            continue;
        }

        let mapped = match generated_origin(inputs.tasks, &name) {
            Some(origin) => mapper.map(origin, &rename_table),
            None => {
                let relative = staged
                    .strip_prefix(inputs.generated_root)
                    .map_or_else(|_| name.clone(), to_slash);
                tracing::debug!(file = %name, "Generated file matches no task; keeping its relative path");
                format!("../{SOURCE_DIR}/{relative}")
            }
        };
        plan.add(resources_dir, key, mapped, Some(staged));
    }

    for result in inputs.fetched.iter().filter(|r| r.is_success()) {
        let Some(local) = result.local_path.as_deref() else {
            continue;
        };
        let name = local_name(result, local);
        let mapped = match result.category {
            ArtifactCategory::Library => library_path(&name),
            ArtifactCategory::Source => replace_final_segment(&mapper.map_prefix(&result.origin_path), &name),
        };
        if mapped == result.origin_path {
            tracing::warn!(origin = %result.origin_path, "No path rule matches; file stays staged");
            continue;
        }
        plan.add(resources_dir, result.origin_path.clone(), mapped, Some(local));
    }

    // Root folders are mirrored as a unit, libraries included
    for result in inputs.root_folder.iter().filter(|r| r.is_success()) {
        let Some(local) = result.local_path.as_deref() else {
            continue;
        };
        let name = local_name(result, local);
        let mapped = replace_final_segment(&mapper.map_prefix(&result.origin_path), &name);
        plan.add(resources_dir, result.origin_path.clone(), mapped, Some(local));
    }

    for task in inputs.tasks {
        if let TaskPayload::Glob { include } = &task.payload {
            plan.add(resources_dir, include.clone(), mapper.map_prefix(include), None);
        }
    }
    if let Some(root) = inputs.root_path {
        plan.add(resources_dir, root.to_string(), mapper.map_prefix(root), None);
    }

    tracing::debug!(
        entries = plan.mapping.len(),
        moves = plan.relocations.len(),
        "Built path mapping"
    );
    plan
}

/// Outcome of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationStats {
    /// Targets of the moves that succeeded
    pub moved: Vec<PathBuf>,
    pub skipped: usize,
}

/// Move staged files to their final location; missing sources are skipped
pub fn relocate(relocations: &[Relocation]) -> RelocationStats {
    let mut stats = RelocationStats::default();
    for relocation in relocations {
        if !relocation.from.is_file() {
            tracing::warn!(path = %relocation.from.display(), "Staged file missing; skipping");
            stats.skipped += 1;
            continue;
        }
        match move_file(&relocation.from, &relocation.to) {
            Ok(()) => {
                tracing::debug!(
                    from = %relocation.from.display(),
                    to = %relocation.to.display(),
                    "Relocated file"
                );
                stats.moved.push(relocation.to.clone());
            }
            Err(e) => {
                tracing::warn!(path = %relocation.from.display(), error = %e, "Failed to relocate file");
                stats.skipped += 1;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactKind;
    use std::fs;
    use tempfile::TempDir;

    fn mapper() -> PathMapper {
        PathMapper::new(&[
            ("^/Workspace/Repos/[^/]+/".to_string(), "../src/".to_string()),
            ("^/Workspace/".to_string(), "../src/".to_string()),
            ("^/".to_string(), "../src/".to_string()),
        ])
        .unwrap()
    }

    fn notebook(key: &str, path: &str) -> TaskDescriptor {
        TaskDescriptor::new(
            key,
            TaskPayload::Notebook {
                notebook_path: path.to_string(),
            },
        )
    }

    #[test]
    fn test_generated_notebook_is_mapped_by_stem() {
        let root = Path::new("/export");
        let staged = root.join(".stage/src/ingest.py");
        let tasks = vec![notebook("ingest", "/Workspace/Repos/amy/etl/ingest")];
        let generated = vec![staged.clone()];

        let plan = plan(
            &mapper(),
            &MappingInputs {
                resources_dir: &root.join("resources"),
                generated_root: &root.join(".stage/src"),
                generated: &generated,
                tasks: &tasks,
                fetched: &[],
                root_folder: &[],
                root_path: None,
            },
        );

        assert_eq!(
            plan.mapping.get("../.stage/src/ingest.py"),
            Some("../src/etl/ingest.py")
        );
        assert_eq!(
            plan.relocations,
            vec![Relocation {
                from: staged,
                to: root.join("src/etl/ingest.py"),
            }]
        );
    }

    #[test]
    fn test_notebook_and_script_with_same_stem_stay_apart() {
        let root = Path::new("/export");
        let generated = vec![root.join(".stage/src/etl.py")];
        let tasks = vec![
            TaskDescriptor::new(
                "script",
                TaskPayload::SparkPython {
                    python_file: "/Workspace/scripts/etl.py".to_string(),
                },
            ),
            notebook("nb", "/Workspace/nb/etl"),
        ];
        let fetched = vec![FetchResult::succeeded(
            "/Workspace/scripts/etl.py",
            ArtifactKind::Python,
            ArtifactCategory::Source,
            root.join(".stage/fetched/src/etl.py"),
        )];

        let plan = plan(
            &mapper(),
            &MappingInputs {
                resources_dir: &root.join("resources"),
                generated_root: &root.join(".stage/src"),
                generated: &generated,
                tasks: &tasks,
                fetched: &fetched,
                root_folder: &[],
                root_path: None,
            },
        );

        assert_eq!(plan.mapping.get("../.stage/src/etl.py"), Some("../src/nb/etl.py"));
        assert_eq!(plan.mapping.get("/Workspace/scripts/etl.py"), Some("../src/scripts/etl.py"));
        let targets: Vec<PathBuf> = plan.relocations.iter().map(|r| r.to.clone()).collect();
        assert_eq!(
            targets,
            vec![root.join("src/nb/etl.py"), root.join("src/scripts/etl.py")]
        );
    }

    #[test]
    fn test_second_file_for_same_target_is_skipped() {
        let root = Path::new("/export");
        let generated = vec![root.join(".stage/src/run.py")];
        let tasks = vec![notebook("run", "/Workspace/jobs/run")];
        let fetched = vec![FetchResult::succeeded(
            "/Workspace/jobs/run.py",
            ArtifactKind::Python,
            ArtifactCategory::Source,
            root.join(".stage/fetched/src/run.py"),
        )];

        let plan = plan(
            &mapper(),
            &MappingInputs {
                resources_dir: &root.join("resources"),
                generated_root: &root.join(".stage/src"),
                generated: &generated,
                tasks: &tasks,
                fetched: &fetched,
                root_folder: &[],
                root_path: None,
            },
        );

        assert_eq!(
            plan.relocations,
            vec![Relocation {
                from: root.join(".stage/src/run.py"),
                to: root.join("src/jobs/run.py"),
            }]
        );
        assert_eq!(plan.mapping.get("../.stage/src/run.py"), Some("../src/jobs/run.py"));
        assert!(!plan.mapping.contains("/Workspace/jobs/run.py"));
    }

    #[test]
    fn test_fetched_source_and_library() {
        let root = Path::new("/export");
        let fetched = vec![
            FetchResult::succeeded(
                "/Workspace/jobs/run.py",
                ArtifactKind::Python,
                ArtifactCategory::Source,
                root.join(".stage/fetched/src/run.py"),
            ),
            FetchResult::succeeded(
                "/Volumes/main/libs/x.whl",
                ArtifactKind::Wheel,
                ArtifactCategory::Library,
                root.join(".stage/fetched/libs/x.whl"),
            ),
            FetchResult {
                origin_path: "/Workspace/missing.sql".to_string(),
                kind: ArtifactKind::Sql,
                category: ArtifactCategory::Source,
                local_path: None,
                error: Some("404".to_string()),
            },
        ];

        let plan = plan(
            &mapper(),
            &MappingInputs {
                resources_dir: &root.join("resources"),
                generated_root: &root.join(".stage/src"),
                generated: &[],
                tasks: &[],
                fetched: &fetched,
                root_folder: &[],
                root_path: None,
            },
        );

        assert_eq!(plan.mapping.get("/Workspace/jobs/run.py"), Some("../src/jobs/run.py"));
        assert_eq!(plan.mapping.get("/Volumes/main/libs/x.whl"), Some("../libs/x.whl"));
        assert!(!plan.mapping.contains("/Workspace/missing.sql"));
        assert_eq!(plan.relocations.len(), 2);
        assert_eq!(plan.relocations[1].to, root.join("libs/x.whl"));
    }

    #[test]
    fn test_root_folder_and_glob_keys() {
        let root = Path::new("/export");
        let root_files = vec![FetchResult::succeeded(
            "/Workspace/pipelines/p1/transformations/bronze",
            ArtifactKind::Notebook,
            ArtifactCategory::Source,
            root.join(".stage/root/transformations/bronze.py"),
        )];
        let tasks = vec![TaskDescriptor::new(
            "libraries[0]",
            TaskPayload::Glob {
                include: "/Workspace/pipelines/p1/transformations/**".to_string(),
            },
        )];

        let plan = plan(
            &mapper(),
            &MappingInputs {
                resources_dir: &root.join("resources"),
                generated_root: &root.join(".stage/src"),
                generated: &[],
                tasks: &tasks,
                fetched: &[],
                root_folder: &root_files,
                root_path: Some("/Workspace/pipelines/p1"),
            },
        );

        assert_eq!(plan.mapping.get("/Workspace/pipelines/p1"), Some("../src/pipelines/p1"));
        assert_eq!(
            plan.mapping.get("/Workspace/pipelines/p1/transformations/**"),
            Some("../src/pipelines/p1/transformations/**")
        );
        assert_eq!(
            plan.relocations[0].to,
            root.join("src/pipelines/p1/transformations/bronze.py")
        );
    }

    #[test]
    fn test_relocate_moves_and_skips_missing() {
        let temp = TempDir::new().unwrap();
        let staged = temp.path().join(".stage/a.py");
        fs::create_dir_all(staged.parent().unwrap()).unwrap();
        fs::write(&staged, "print(1)\n").unwrap();

        let stats = relocate(&[
            Relocation {
                from: staged.clone(),
                to: temp.path().join("src/a.py"),
            },
            Relocation {
                from: temp.path().join(".stage/gone.py"),
                to: temp.path().join("src/gone.py"),
            },
        ]);

        assert_eq!(
            stats,
            RelocationStats {
                moved: vec![temp.path().join("src/a.py")],
                skipped: 1,
            }
        );
        assert!(!staged.exists());
        assert_eq!(fs::read_to_string(temp.path().join("src/a.py")).unwrap(), "print(1)\n");
    }
}

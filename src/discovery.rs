//! Task inventory discovery
//!
//! Turns the raw settings returned by the workspace API into typed
//! [`TaskDescriptor`]s. Jobs and pipelines are two different dialects: jobs
//! have `tasks` (plus job-level `environments`), pipelines have `libraries`
//! (plus an optional `root_path` and `environment`).

use serde_json::Value;

use crate::domain::{LibraryKind, LibraryRef, ResourceKind, TaskDescriptor, TaskPayload};
use crate::error::{ExportError, Result};

/// Task key used for a pipeline's environment dependency set
pub const PIPELINE_ENVIRONMENT_KEY: &str = "environment";

/// What discovery learned about one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredResource {
    /// Name as defined in the workspace
    pub name: Option<String>,
    pub tasks: Vec<TaskDescriptor>,
    /// Source root of a folder-rooted pipeline
    pub root_path: Option<String>,
}

impl DiscoveredResource {
    pub fn is_root_folder(&self) -> bool {
        self.root_path.is_some()
    }
}

/// Discover the task inventory of a job or pipeline
pub fn discover(kind: ResourceKind, id: &str, raw: &Value) -> Result<DiscoveredResource> {
    match kind {
        ResourceKind::Job => discover_job(id, raw),
        ResourceKind::Pipeline => discover_pipeline(id, raw),
    }
}

fn no_tasks(kind: ResourceKind, id: &str) -> ExportError {
    ExportError::NoTasks {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn discover_job(id: &str, raw: &Value) -> Result<DiscoveredResource> {
    let settings = raw.get("settings").unwrap_or(raw);
    let raw_tasks = settings
        .get("tasks")
        .and_then(Value::as_array)
        .filter(|tasks| !tasks.is_empty())
        .ok_or_else(|| no_tasks(ResourceKind::Job, id))?;

    let mut tasks: Vec<TaskDescriptor> = raw_tasks.iter().filter_map(job_task).collect();

    if let Some(environments) = settings.get("environments").and_then(Value::as_array) {
        for environment in environments {
            let Some(key) = str_at(environment, "/environment_key") else {
                continue;
            };
            let dependencies = string_list(environment.pointer("/spec/dependencies"));
            tasks.push(
                TaskDescriptor::new(key, TaskPayload::Environment { dependencies })
                    .with_environment_key(Some(key.to_string())),
            );
        }
    }

    if tasks.is_empty() {
        tracing::info!(resource_id = id, "No exportable tasks; exporting the job definition only");
    }
    tracing::debug!(resource_id = id, tasks = tasks.len(), "Discovered job tasks");

    Ok(DiscoveredResource {
        name: str_at(settings, "/name").map(str::to_string),
        tasks,
        root_path: None,
    })
}

fn job_task(task: &Value) -> Option<TaskDescriptor> {
    let task_key = str_at(task, "/task_key").unwrap_or_default().to_string();
    let libraries = task_libraries(task.get("libraries"));

    let payload = if let Some(path) = str_at(task, "/notebook_task/notebook_path") {
        TaskPayload::Notebook {
            notebook_path: path.to_string(),
        }
    } else if let Some(path) = str_at(task, "/spark_python_task/python_file") {
        TaskPayload::SparkPython {
            python_file: path.to_string(),
        }
    } else if task.get("python_wheel_task").is_some() {
        TaskPayload::PythonWheel {
            package_name: str_at(task, "/python_wheel_task/package_name").map(str::to_string),
            entry_point: str_at(task, "/python_wheel_task/entry_point").map(str::to_string),
        }
    } else if let Some(path) = str_at(task, "/sql_task/file/path") {
        TaskPayload::Sql {
            sql_file: path.to_string(),
        }
    } else if !libraries.is_empty() {
        TaskPayload::Library
    } else {
        tracing::debug!(task_key = %task_key, "Skipping task without exportable files");
        return None;
    };

    Some(
        TaskDescriptor::new(task_key, payload)
            .with_libraries(libraries)
            .with_environment_key(str_at(task, "/environment_key").map(str::to_string)),
    )
}

fn task_libraries(libraries: Option<&Value>) -> Vec<LibraryRef> {
    libraries
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(library_ref).collect())
        .unwrap_or_default()
}

fn library_ref(entry: &Value) -> Option<LibraryRef> {
    [LibraryKind::Wheel, LibraryKind::Jar]
        .into_iter()
        .find_map(|kind| {
            entry
                .get(kind.field())
                .and_then(Value::as_str)
                .filter(|p| !p.is_empty())
                .map(|p| LibraryRef::new(kind, p))
        })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn discover_pipeline(id: &str, raw: &Value) -> Result<DiscoveredResource> {
    let spec = raw.get("spec").unwrap_or(raw);
    let root_path = str_at(spec, "/root_path").map(str::to_string);
    let raw_libraries = spec
        .get("libraries")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if raw_libraries.is_empty() && root_path.is_none() {
        return Err(no_tasks(ResourceKind::Pipeline, id));
    }

    let mut tasks: Vec<TaskDescriptor> = raw_libraries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| pipeline_library(i, entry))
        .collect();

    if let Some(environment) = spec.get("environment") {
        let dependencies = string_list(environment.get("dependencies"));
        if !dependencies.is_empty() {
            tasks.push(TaskDescriptor::new(
                PIPELINE_ENVIRONMENT_KEY,
                TaskPayload::Environment { dependencies },
            ));
        }
    }

    tracing::debug!(
        resource_id = id,
        tasks = tasks.len(),
        root_path = root_path.as_deref().unwrap_or("-"),
        "Discovered pipeline libraries"
    );

    Ok(DiscoveredResource {
        name: str_at(spec, "/name").map(str::to_string),
        tasks,
        root_path,
    })
}

fn pipeline_library(index: usize, entry: &Value) -> Option<TaskDescriptor> {
    let key = format!("libraries[{index}]");

    let payload = if let Some(path) = str_at(entry, "/notebook/path") {
        TaskPayload::Notebook {
            notebook_path: path.to_string(),
        }
    } else if let Some(path) = str_at(entry, "/file/path") {
        if std::path::Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        {
            TaskPayload::Sql {
                sql_file: path.to_string(),
            }
        } else {
            TaskPayload::SparkPython {
                python_file: path.to_string(),
            }
        }
    } else if let Some(include) = str_at(entry, "/glob/include") {
        TaskPayload::Glob {
            include: include.to_string(),
        }
    } else if let Some(library) = library_ref(entry) {
        return Some(TaskDescriptor::new(key, TaskPayload::Library).with_libraries(vec![library]));
    } else {
        tracing::debug!(library = %key, "Skipping pipeline library without exportable files");
        return None;
    };

    Some(TaskDescriptor::new(key, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskKind;
    use serde_json::json;

    #[test]
    fn test_job_task_kinds() {
        let raw = json!({
            "job_id": 1,
            "settings": {
                "name": "Daily ETL",
                "tasks": [
                    {"task_key": "nb", "notebook_task": {"notebook_path": "/Workspace/Users/a/etl"}},
                    {"task_key": "py", "spark_python_task": {"python_file": "/Workspace/Users/a/job.py"}},
                    {"task_key": "whl", "python_wheel_task": {"package_name": "pkg", "entry_point": "main"},
                     "libraries": [{"whl": "/Volumes/main/libs/pkg.whl"}]},
                    {"task_key": "sql", "sql_task": {"file": {"path": "/Workspace/q.sql"}}},
                    {"task_key": "jar", "spark_jar_task": {"main_class_name": "Main"},
                     "libraries": [{"jar": "/Volumes/main/libs/app.jar"}, {"pypi": {"package": "x"}}]},
                    {"task_key": "noop", "condition_task": {"op": "EQUAL_TO"}}
                ]
            }
        });

        let discovered = discover(ResourceKind::Job, "1", &raw).unwrap();
        assert_eq!(discovered.name.as_deref(), Some("Daily ETL"));
        let kinds: Vec<_> = discovered.tasks.iter().map(TaskDescriptor::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::Notebook,
                TaskKind::SparkPython,
                TaskKind::PythonWheel,
                TaskKind::Sql,
                TaskKind::Library
            ]
        );
        assert_eq!(discovered.tasks[2].libraries.len(), 1);
        assert_eq!(discovered.tasks[4].libraries[0].kind, LibraryKind::Jar);
        assert!(!discovered.is_root_folder());
    }

    #[test]
    fn test_job_environments_become_environment_tasks() {
        let raw = json!({
            "settings": {
                "name": "Serverless",
                "tasks": [{"task_key": "py", "environment_key": "default",
                           "spark_python_task": {"python_file": "/Workspace/a.py"}}],
                "environments": [{"environment_key": "default",
                                  "spec": {"client": "1", "dependencies": ["/Volumes/l/x.whl", "pandas"]}}]
            }
        });

        let discovered = discover(ResourceKind::Job, "7", &raw).unwrap();
        assert_eq!(discovered.tasks.len(), 2);
        assert_eq!(discovered.tasks[0].environment_key.as_deref(), Some("default"));
        assert_eq!(
            discovered.tasks[1].payload,
            TaskPayload::Environment {
                dependencies: vec!["/Volumes/l/x.whl".to_string(), "pandas".to_string()]
            }
        );
    }

    #[test]
    fn test_job_without_tasks_is_rejected() {
        let raw = json!({"settings": {"name": "empty", "tasks": []}});
        assert!(matches!(
            discover(ResourceKind::Job, "9", &raw),
            Err(ExportError::NoTasks { .. })
        ));
        let raw = json!({"settings": {"name": "missing"}});
        assert!(discover(ResourceKind::Job, "9", &raw).is_err());
    }

    #[test]
    fn test_job_of_orchestration_tasks_exports_definition_only() {
        let raw = json!({"settings": {"name": "fan-out", "tasks": [
            {"task_key": "child", "run_job_task": {"job_id": 5}},
            {"task_key": "gate", "condition_task": {"op": "EQUAL_TO", "left": "1", "right": "1"}}
        ]}});

        let discovered = discover(ResourceKind::Job, "9", &raw).unwrap();
        assert_eq!(discovered.name.as_deref(), Some("fan-out"));
        assert!(discovered.tasks.is_empty());
    }

    #[test]
    fn test_pipeline_library_dialect() {
        let raw = json!({
            "pipeline_id": "p1",
            "spec": {
                "name": "Ingest",
                "libraries": [
                    {"notebook": {"path": "/Workspace/p/bronze"}},
                    {"file": {"path": "/Workspace/p/silver.py"}},
                    {"file": {"path": "/Workspace/p/gold.sql"}},
                    {"glob": {"include": "/Workspace/p/transformations/**"}},
                    {"whl": "/Volumes/l/dep.whl"},
                    {"maven": {"coordinates": "a:b:1"}}
                ],
                "environment": {"dependencies": ["/Volumes/l/env.whl"]}
            }
        });

        let discovered = discover(ResourceKind::Pipeline, "p1", &raw).unwrap();
        let keys: Vec<_> = discovered.tasks.iter().map(|t| t.task_key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "libraries[0]",
                "libraries[1]",
                "libraries[2]",
                "libraries[3]",
                "libraries[4]",
                "environment"
            ]
        );
        let kinds: Vec<_> = discovered.tasks.iter().map(TaskDescriptor::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::Notebook,
                TaskKind::SparkPython,
                TaskKind::Sql,
                TaskKind::Glob,
                TaskKind::Library,
                TaskKind::Environment
            ]
        );
    }

    #[test]
    fn test_root_folder_pipeline() {
        let raw = json!({"spec": {"name": "Rooted", "root_path": "/Workspace/Users/a/pipeline"}});
        let discovered = discover(ResourceKind::Pipeline, "p2", &raw).unwrap();
        assert!(discovered.is_root_folder());
        assert!(discovered.tasks.is_empty());
    }

    #[test]
    fn test_pipeline_without_sources_is_rejected() {
        let raw = json!({"spec": {"name": "Empty", "libraries": []}});
        assert!(matches!(
            discover(ResourceKind::Pipeline, "p3", &raw),
            Err(ExportError::NoTasks { .. })
        ));
    }
}

//! Ordered rewrite passes over one resource of a bundle document
//!
//! Later passes assume the normalization of earlier ones: substitution must
//! not see path fields, and path lookup must see the values exactly as the
//! generator wrote them.

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

use super::schema::{DEPENDENCIES_FIELD, FieldPath, LIBRARY_FIELDS, ROOT_PATH_FIELD, source_fields};
use crate::classifier::is_workspace_path;
use crate::config::SparkConfRule;
use crate::domain::{PathMapping, ResourceKind, TaskDescriptor};
use crate::error::Result;
use crate::workspace_api::{ADMINS_GROUP, PermissionsProvider, PrincipalKind};

/// Blocks that carry a generation-time `pause_status`
const SCHEDULE_BLOCKS: [&str; 3] = ["schedule", "trigger", "continuous"];
const PAUSE_STATUS: &str = "pause_status";
const PERMISSIONS: &str = "permissions";
const NULL_TOKEN: &str = "null";
const EXISTING_VALUE: &str = "{existing_value}";
const DEFAULT_EXISTING_VALUE: &str = "auto";

/// Counters reported by the path pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRewriteStats {
    pub rewritten: usize,
    /// Path values with no mapping entry, left unmodified
    pub unmapped: Vec<String>,
}

/// Drop `pause_status` from schedule-like blocks; returns how many were removed
pub fn remove_pause_status(resource: &mut Mapping) -> usize {
    let mut removed = 0;
    for block in SCHEDULE_BLOCKS {
        if let Some(Value::Mapping(schedule)) = resource.get_mut(block) {
            if schedule.remove(PAUSE_STATUS).is_some() {
                tracing::debug!(block, "Removed pause_status");
                removed += 1;
            }
        }
    }
    removed
}

/// Attach the access-control list unless the document already has one
///
/// Returns the number of injected entries.
pub fn inject_permissions<P: PermissionsProvider>(
    resource: &mut Mapping,
    provider: &P,
    kind: ResourceKind,
    id: &str,
) -> Result<usize> {
    if resource.contains_key(PERMISSIONS) {
        tracing::debug!(resource_id = id, "Document already has permissions");
        return Ok(0);
    }

    let entries: Vec<Value> = provider
        .permissions(kind, id)?
        .into_iter()
        .filter(|e| !(e.principal_kind == PrincipalKind::Group && e.principal == ADMINS_GROUP))
        .map(|entry| {
            let mut map = Mapping::new();
            map.insert(
                Value::from(entry.principal_kind.field()),
                Value::from(entry.principal),
            );
            map.insert(Value::from("level"), Value::from(entry.level));
            Value::Mapping(map)
        })
        .collect();

    let count = entries.len();
    if count > 0 {
        resource.insert(Value::from(PERMISSIONS), Value::Sequence(entries));
    }
    tracing::debug!(resource_id = id, count, "Injected permissions");
    Ok(count)
}

/// Apply literal substitutions to every string value not held under a path key
pub fn substitute_values(
    value: &mut Value,
    substitutions: &[(String, String)],
    path_keys: &BTreeSet<&'static str>,
) {
    match value {
        Value::String(s) => {
            for (from, to) in substitutions {
                if !from.is_empty() && s.contains(from.as_str()) {
                    *s = s.replace(from.as_str(), to);
                }
            }
        }
        Value::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                if key.as_str().is_some_and(|k| path_keys.contains(k)) {
                    continue;
                }
                substitute_values(child, substitutions, path_keys);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                substitute_values(item, substitutions, path_keys);
            }
        }
        Value::Tagged(tagged) => substitute_values(&mut tagged.value, substitutions, path_keys),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Replace absent values with the explicit `null` token string
pub fn normalize_nulls(value: &mut Value) {
    match value {
        Value::Null => *value = Value::from(NULL_TOKEN),
        Value::Mapping(map) => map.values_mut().for_each(normalize_nulls),
        Value::Sequence(items) => items.iter_mut().for_each(normalize_nulls),
        Value::Tagged(tagged) => normalize_nulls(&mut tagged.value),
        Value::String(_) | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn value_at_mut<'v>(node: &'v mut Value, field: FieldPath) -> Option<&'v mut Value> {
    field
        .iter()
        .try_fold(node, |current, key| current.get_mut(*key))
}

struct PathRewriter<'a> {
    mapping: &'a PathMapping,
    export_libraries: bool,
    stats: PathRewriteStats,
}

impl PathRewriter<'_> {
    fn rewrite(&mut self, slot: &mut Value) {
        let Value::String(current) = slot else {
            return;
        };
        if let Some(mapped) = self.mapping.get(current) {
            tracing::debug!(from = %current, to = mapped, "Rewrote path");
            *current = mapped.to_string();
            self.stats.rewritten += 1;
        } else if is_workspace_path(current) || current.starts_with("../") {
            tracing::warn!(path = %current, "No mapping for path; leaving it unchanged");
            self.stats.unmapped.push(current.clone());
        }
    }

    fn rewrite_fields(&mut self, node: &mut Value, fields: &[FieldPath]) {
        for &field in fields {
            if let Some(slot) = value_at_mut(node, field) {
                self.rewrite(slot);
            }
        }
    }

    /// `{whl: ...}` / `{jar: ...}` entries
    fn rewrite_library_entry(&mut self, entry: &mut Value) {
        if !self.export_libraries {
            return;
        }
        for kind in LIBRARY_FIELDS {
            if let Some(slot) = entry.get_mut(kind.field()) {
                self.rewrite(slot);
            }
        }
    }

    fn rewrite_dependencies(&mut self, dependencies: Option<&mut Value>) {
        if !self.export_libraries {
            return;
        }
        let Some(Value::Sequence(items)) = dependencies else {
            return;
        };
        for item in items {
            if item.as_str().is_some_and(|d| is_workspace_path(d) || self.mapping.contains(d)) {
                self.rewrite(item);
            }
        }
    }

    fn job(&mut self, resource: &mut Mapping, tasks: &[TaskDescriptor]) {
        if let Some(Value::Sequence(doc_tasks)) = resource.get_mut("tasks") {
            for doc_task in doc_tasks {
                let descriptor = doc_task
                    .get("task_key")
                    .and_then(Value::as_str)
                    .and_then(|key| tasks.iter().find(|t| t.task_key == key));
                if let Some(descriptor) = descriptor {
                    self.rewrite_fields(doc_task, source_fields(ResourceKind::Job, descriptor.kind()));
                }
                if let Some(Value::Sequence(libraries)) = doc_task.get_mut("libraries") {
                    for library in libraries {
                        self.rewrite_library_entry(library);
                    }
                }
            }
        }

        if let Some(Value::Sequence(environments)) = resource.get_mut("environments") {
            for environment in environments {
                let dependencies = environment
                    .get_mut("spec")
                    .and_then(|spec| spec.get_mut(DEPENDENCIES_FIELD));
                self.rewrite_dependencies(dependencies);
            }
        }
    }

    fn pipeline(&mut self, resource: &mut Mapping, tasks: &[TaskDescriptor]) {
        if let Some(slot) = resource.get_mut(ROOT_PATH_FIELD) {
            self.rewrite(slot);
        }

        if let Some(Value::Sequence(libraries)) = resource.get_mut("libraries") {
            for (index, entry) in libraries.iter_mut().enumerate() {
                let key = format!("libraries[{index}]");
                if let Some(descriptor) = tasks.iter().find(|t| t.task_key == key) {
                    self.rewrite_fields(entry, source_fields(ResourceKind::Pipeline, descriptor.kind()));
                }
                self.rewrite_library_entry(entry);
            }
        }

        let dependencies = resource
            .get_mut("environment")
            .and_then(|environment| environment.get_mut(DEPENDENCIES_FIELD));
        self.rewrite_dependencies(dependencies);
    }
}

/// Rewrite every file-valued reference through `mapping`
///
/// Library references are only touched when `export_libraries` is set.
pub fn rewrite_paths(
    resource: &mut Mapping,
    kind: ResourceKind,
    tasks: &[TaskDescriptor],
    mapping: &PathMapping,
    export_libraries: bool,
) -> PathRewriteStats {
    let mut rewriter = PathRewriter {
        mapping,
        export_libraries,
        stats: PathRewriteStats::default(),
    };
    match kind {
        ResourceKind::Job => rewriter.job(resource, tasks),
        ResourceKind::Pipeline => rewriter.pipeline(resource, tasks),
    }
    rewriter.stats
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Apply the first matching spark_conf rule to one cluster definition
fn transform_cluster(cluster: &mut Value, rules: &[SparkConfRule]) -> bool {
    let Some(Value::Mapping(spark_conf)) = cluster.get_mut("spark_conf") else {
        return false;
    };

    let Some(rule) = rules
        .iter()
        .find(|rule| spark_conf.contains_key(rule.search_key.as_str()))
    else {
        return false;
    };

    spark_conf.remove(rule.search_key.as_str());
    let existing = spark_conf
        .get(rule.target_key.as_str())
        .and_then(scalar_string)
        .unwrap_or_else(|| DEFAULT_EXISTING_VALUE.to_string());
    let value = rule.target_value.replace(EXISTING_VALUE, &existing);
    spark_conf.insert(Value::from(rule.target_key.as_str()), Value::from(value));
    tracing::debug!(
        search_key = %rule.search_key,
        target_key = %rule.target_key,
        "Transformed cluster spark_conf"
    );
    true
}

/// Apply spark_conf rules to every inline cluster; returns clusters changed
pub fn transform_clusters(resource: &mut Mapping, kind: ResourceKind, rules: &[SparkConfRule]) -> usize {
    if rules.is_empty() {
        return 0;
    }

    let mut clusters: Vec<&mut Value> = Vec::new();
    match kind {
        ResourceKind::Job => {
            let mut job_clusters = None;
            let mut tasks = None;
            for (key, value) in resource.iter_mut() {
                match key.as_str() {
                    Some("job_clusters") => job_clusters = Some(value),
                    Some("tasks") => tasks = Some(value),
                    _ => {}
                }
            }
            for list in [job_clusters, tasks].into_iter().flatten() {
                if let Value::Sequence(items) = list {
                    clusters.extend(items.iter_mut().filter_map(|item| item.get_mut("new_cluster")));
                }
            }
        }
        ResourceKind::Pipeline => {
            if let Some(Value::Sequence(items)) = resource.get_mut("clusters") {
                clusters.extend(items.iter_mut());
            }
        }
    }

    clusters
        .into_iter()
        .map(|cluster| transform_cluster(cluster, rules))
        .filter(|changed| *changed)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::schema::path_valued_keys;
    use crate::domain::{LibraryKind, LibraryRef, TaskPayload};
    use crate::workspace_api::PermissionEntry;
    use std::cell::Cell;

    fn mapping_of(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    struct StaticPermissions {
        entries: Vec<PermissionEntry>,
        calls: Cell<usize>,
    }

    impl PermissionsProvider for StaticPermissions {
        fn permissions(&self, _: ResourceKind, _: &str) -> Result<Vec<PermissionEntry>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.entries.clone())
        }
    }

    fn provider() -> StaticPermissions {
        StaticPermissions {
            entries: vec![
                PermissionEntry::new(PrincipalKind::User, "amy@corp.com", "IS_OWNER"),
                PermissionEntry::new(PrincipalKind::Group, "admins", "CAN_MANAGE"),
                PermissionEntry::new(PrincipalKind::Group, "data-eng", "CAN_MANAGE_RUN"),
            ],
            calls: Cell::new(0),
        }
    }

    #[test]
    fn test_remove_pause_status() {
        let mut resource = mapping_of(
            "schedule:\n  quartz_cron_expression: 0 0 * * * ?\n  pause_status: UNPAUSED\ntrigger:\n  pause_status: PAUSED\n",
        );
        assert_eq!(remove_pause_status(&mut resource), 2);
        assert!(resource["schedule"].get("pause_status").is_none());
        assert!(resource["schedule"].get("quartz_cron_expression").is_some());
        assert_eq!(remove_pause_status(&mut resource), 0);
    }

    #[test]
    fn test_inject_permissions_skips_admins() {
        let mut resource = mapping_of("name: etl\n");
        let provider = provider();

        let count = inject_permissions(&mut resource, &provider, ResourceKind::Job, "1").unwrap();

        assert_eq!(count, 2);
        let expected: Value = serde_yaml::from_str(
            "- user_name: amy@corp.com\n  level: IS_OWNER\n- group_name: data-eng\n  level: CAN_MANAGE_RUN\n",
        )
        .unwrap();
        assert_eq!(resource["permissions"], expected);
    }

    #[test]
    fn test_existing_permissions_are_kept() {
        let mut resource = mapping_of("permissions:\n- user_name: x\n  level: CAN_VIEW\n");
        let provider = provider();
        let count = inject_permissions(&mut resource, &provider, ResourceKind::Job, "1").unwrap();
        assert_eq!(count, 0);
        assert_eq!(provider.calls.get(), 0);
        assert_eq!(resource["permissions"].as_sequence().map(Vec::len), Some(1));
    }

    #[test]
    fn test_substitution_skips_path_keys() {
        let mut doc: Value = serde_yaml::from_str(
            "name: ${env} job\ntasks:\n- task_key: a\n  notebook_task:\n    notebook_path: /Workspace/${env}/etl\n    base_parameters:\n      target: ${env}\n",
        )
        .unwrap();
        let subs = vec![("${".to_string(), "$${".to_string())];

        substitute_values(&mut doc, &subs, &path_valued_keys());

        assert_eq!(doc["name"], Value::from("$${env} job"));
        assert_eq!(
            doc["tasks"][0]["notebook_task"]["notebook_path"],
            Value::from("/Workspace/${env}/etl")
        );
        assert_eq!(
            doc["tasks"][0]["notebook_task"]["base_parameters"]["target"],
            Value::from("$${env}")
        );
    }

    #[test]
    fn test_substitution_round_trip() {
        let original: Value = serde_yaml::from_str("a: ${x}\nb:\n- ${y} and ${z}\n").unwrap();
        let mut doc = original.clone();
        let keys = path_valued_keys();
        substitute_values(&mut doc, &[("${".to_string(), "$${".to_string())], &keys);
        assert_ne!(doc, original);
        substitute_values(&mut doc, &[("$${".to_string(), "${".to_string())], &keys);
        assert_eq!(doc, original);
    }

    #[test]
    fn test_substitutions_apply_in_order() {
        let mut doc = Value::from("dev_catalog");
        let subs = vec![
            ("dev".to_string(), "prod".to_string()),
            ("prod_catalog".to_string(), "${var.catalog}".to_string()),
        ];
        substitute_values(&mut doc, &subs, &BTreeSet::new());
        assert_eq!(doc, Value::from("${var.catalog}"));
    }

    #[test]
    fn test_normalize_nulls() {
        let mut doc: Value = serde_yaml::from_str("a: null\nb:\n- ~\n- 1\nc:\n  d:\n").unwrap();
        normalize_nulls(&mut doc);
        assert_eq!(doc["a"], Value::from("null"));
        assert_eq!(doc["b"][0], Value::from("null"));
        assert_eq!(doc["b"][1], Value::from(1));
        assert_eq!(doc["c"]["d"], Value::from("null"));
    }

    fn job_tasks() -> Vec<TaskDescriptor> {
        vec![
            TaskDescriptor::new(
                "nb",
                TaskPayload::Notebook {
                    notebook_path: "/Workspace/Users/a/etl".to_string(),
                },
            ),
            TaskDescriptor::new(
                "sql",
                TaskPayload::Sql {
                    sql_file: "/Workspace/q.sql".to_string(),
                },
            ),
            TaskDescriptor::new(
                "whl",
                TaskPayload::PythonWheel {
                    package_name: None,
                    entry_point: None,
                },
            )
            .with_libraries(vec![LibraryRef::new(LibraryKind::Wheel, "/Volumes/l/x.whl")]),
        ]
    }

    const JOB_DOC: &str = r"
tasks:
- task_key: nb
  notebook_task:
    notebook_path: ../.stage/src/etl.py
- task_key: sql
  sql_task:
    file:
      path: /Workspace/q.sql
- task_key: whl
  python_wheel_task:
    package_name: x
  libraries:
  - whl: /Volumes/l/x.whl
environments:
- environment_key: default
  spec:
    dependencies:
    - /Volumes/l/env.whl
    - pandas
";

    fn job_mapping() -> PathMapping {
        let mut mapping = PathMapping::new();
        mapping.insert("../.stage/src/etl.py", "../src/Users/a/etl.py");
        mapping.insert("/Workspace/q.sql", "../src/q.sql");
        mapping.insert("/Volumes/l/x.whl", "../libs/x.whl");
        mapping.insert("/Volumes/l/env.whl", "../libs/env.whl");
        mapping
    }

    #[test]
    fn test_rewrite_job_paths() {
        let mut resource = mapping_of(JOB_DOC);
        let stats = rewrite_paths(&mut resource, ResourceKind::Job, &job_tasks(), &job_mapping(), true);

        assert_eq!(stats.rewritten, 4);
        assert!(stats.unmapped.is_empty());
        assert_eq!(
            resource["tasks"][0]["notebook_task"]["notebook_path"],
            Value::from("../src/Users/a/etl.py")
        );
        assert_eq!(resource["tasks"][1]["sql_task"]["file"]["path"], Value::from("../src/q.sql"));
        assert_eq!(resource["tasks"][2]["libraries"][0]["whl"], Value::from("../libs/x.whl"));
        assert_eq!(
            resource["environments"][0]["spec"]["dependencies"][0],
            Value::from("../libs/env.whl")
        );
        assert_eq!(
            resource["environments"][0]["spec"]["dependencies"][1],
            Value::from("pandas")
        );
    }

    #[test]
    fn test_library_paths_untouched_without_flag() {
        let mut resource = mapping_of(JOB_DOC);
        let stats = rewrite_paths(&mut resource, ResourceKind::Job, &job_tasks(), &job_mapping(), false);

        assert_eq!(stats.rewritten, 2);
        assert_eq!(resource["tasks"][2]["libraries"][0]["whl"], Value::from("/Volumes/l/x.whl"));
        assert_eq!(
            resource["environments"][0]["spec"]["dependencies"][0],
            Value::from("/Volumes/l/env.whl")
        );
    }

    #[test]
    fn test_unmapped_path_is_left_and_reported() {
        let mut resource = mapping_of(JOB_DOC);
        let stats = rewrite_paths(
            &mut resource,
            ResourceKind::Job,
            &job_tasks(),
            &PathMapping::new(),
            false,
        );
        assert_eq!(stats.rewritten, 0);
        assert_eq!(stats.unmapped.len(), 2);
        assert_eq!(resource["tasks"][1]["sql_task"]["file"]["path"], Value::from("/Workspace/q.sql"));
    }

    #[test]
    fn test_rewrite_pipeline_paths() {
        let mut resource = mapping_of(
            "root_path: /Workspace/p\nlibraries:\n- glob:\n    include: /Workspace/p/transformations/**\n- notebook:\n    path: ../.stage/src/bronze.py\n- jar: /Volumes/l/a.jar\n",
        );
        let tasks = vec![
            TaskDescriptor::new(
                "libraries[0]",
                TaskPayload::Glob {
                    include: "/Workspace/p/transformations/**".to_string(),
                },
            ),
            TaskDescriptor::new(
                "libraries[1]",
                TaskPayload::Notebook {
                    notebook_path: "/Workspace/p/bronze".to_string(),
                },
            ),
            TaskDescriptor::new("libraries[2]", TaskPayload::Library)
                .with_libraries(vec![LibraryRef::new(LibraryKind::Jar, "/Volumes/l/a.jar")]),
        ];
        let mut mapping = PathMapping::new();
        mapping.insert("/Workspace/p", "../src/p");
        mapping.insert("/Workspace/p/transformations/**", "../src/p/transformations/**");
        mapping.insert("../.stage/src/bronze.py", "../src/p/bronze.py");
        mapping.insert("/Volumes/l/a.jar", "../libs/a.jar");

        let stats = rewrite_paths(&mut resource, ResourceKind::Pipeline, &tasks, &mapping, true);

        assert_eq!(stats.rewritten, 4);
        assert_eq!(resource["root_path"], Value::from("../src/p"));
        assert_eq!(
            resource["libraries"][0]["glob"]["include"],
            Value::from("../src/p/transformations/**")
        );
        assert_eq!(resource["libraries"][1]["notebook"]["path"], Value::from("../src/p/bronze.py"));
        assert_eq!(resource["libraries"][2]["jar"], Value::from("../libs/a.jar"));
    }

    fn profile_rule() -> Vec<SparkConfRule> {
        vec![
            SparkConfRule {
                search_key: "spark.databricks.cluster.profile".to_string(),
                target_key: "spark.master".to_string(),
                target_value: "{existing_value}[*, 4]".to_string(),
            },
            SparkConfRule {
                search_key: "spark.master".to_string(),
                target_key: "unused".to_string(),
                target_value: "x".to_string(),
            },
        ]
    }

    #[test]
    fn test_cluster_transform_first_match_wins() {
        let mut resource = mapping_of(
            "job_clusters:\n- job_cluster_key: main\n  new_cluster:\n    spark_conf:\n      spark.databricks.cluster.profile: singleNode\n      spark.master: local\n",
        );

        let changed = transform_clusters(&mut resource, ResourceKind::Job, &profile_rule());

        assert_eq!(changed, 1);
        let conf = &resource["job_clusters"][0]["new_cluster"]["spark_conf"];
        assert!(conf.get("spark.databricks.cluster.profile").is_none());
        assert_eq!(conf["spark.master"], Value::from("local[*, 4]"));
        assert!(conf.get("unused").is_none());
    }

    #[test]
    fn test_cluster_transform_defaults_existing_value() {
        let mut resource = mapping_of(
            "tasks:\n- task_key: a\n  new_cluster:\n    spark_conf:\n      spark.databricks.cluster.profile: singleNode\n",
        );
        transform_clusters(&mut resource, ResourceKind::Job, &profile_rule());
        assert_eq!(
            resource["tasks"][0]["new_cluster"]["spark_conf"]["spark.master"],
            Value::from("auto[*, 4]")
        );
    }

    #[test]
    fn test_pipeline_clusters_are_transformed() {
        let mut resource = mapping_of(
            "clusters:\n- label: default\n  spark_conf:\n    spark.databricks.cluster.profile: singleNode\n- label: maintenance\n",
        );
        assert_eq!(transform_clusters(&mut resource, ResourceKind::Pipeline, &profile_rule()), 1);
        assert_eq!(
            resource["clusters"][0]["spark_conf"]["spark.master"],
            Value::from("auto[*, 4]")
        );
    }
}

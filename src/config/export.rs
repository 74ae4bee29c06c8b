//! Export configuration (`config.yml`) data structures

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::resources::{PipelineEntry, WorkflowEntry};
use crate::domain::ResourceDescriptor;
use crate::error::{self, ExportError, Result};
use crate::path_mapper::PathMapper;

const START_PATH_PLACEHOLDER: &str = "{v_start_path}";

const DEFAULT_BINDINGS_CSV: &str = "{v_start_path}/bind_scripts/resource_key_job_id_mapping.csv";
const DEFAULT_BACKUP_DIR: &str = "{v_start_path}/backup_jobs_yaml/";
const DEFAULT_MANIFEST: &str = "{v_start_path}/databricks.yml";
const DEFAULT_CLI: &str = "databricks";

/// Ordered path rewrite rules used when `path_replacement` is absent
const DEFAULT_PATH_RULES: [(&str, &str); 5] = [
    ("^/Workspace/Repos/[^/]+/", "../src/"),
    ("^/Repos/[^/]+/", "../src/"),
    ("^/Workspace/", "../src/"),
    ("^/Shared/", "../src/Shared/"),
    ("^/", "../src/"),
];

/// Export configuration (config.yml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub initial_variables: InitialVariables,

    pub global_settings: GlobalSettings,

    /// Ordered `pattern: replacement` table; mapping order is rule order
    pub path_replacement: Option<serde_yaml::Mapping>,

    /// Ordered literal substitutions applied to document values
    pub value_replacements: Option<serde_yaml::Mapping>,

    pub spark_conf_key_replacements: Vec<SparkConfRule>,

    pub workflows: Vec<WorkflowEntry>,

    pub pipelines: Vec<PipelineEntry>,
}

/// File system locations and tool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialVariables {
    pub v_start_path: Option<String>,
    pub v_resource_key_job_id_mapping_csv_file_path: Option<String>,
    pub v_backup_jobs_yaml_path: Option<String>,
    pub v_databricks_yml_path: Option<String>,
    pub v_databricks_cli_path: Option<String>,
    pub v_databricks_config_profile: Option<String>,
    pub v_log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub export_libraries: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            export_libraries: true,
        }
    }
}

/// Cluster spark_conf rewrite: drop `search_key`, fold its value into `target_key`
///
/// `target_value` may contain `{existing_value}`, which is replaced with the
/// current value of `target_key` (or `auto` when it is unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkConfRule {
    pub search_key: String,
    pub target_key: String,
    pub target_value: String,
}

impl ExportConfig {
    /// Parse export configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(error::config_not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| error::config_parse_failed(path.display().to_string(), e.to_string()))?;
        let config = Self::from_yaml(&content).map_err(|e| match e {
            ExportError::ConfigParseFailed { reason, .. } => {
                error::config_parse_failed(path.display().to_string(), reason)
            }
            other => other,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked without touching the workspace
    pub fn validate(&self) -> Result<()> {
        PathMapper::new(&self.path_rules()?)?;
        for rule in &self.spark_conf_key_replacements {
            if rule.search_key.is_empty() || rule.target_key.is_empty() {
                return Err(error::config_invalid(
                    "spark_conf_key_replacements entries need search_key and target_key",
                ));
            }
        }
        for (from, _) in self.value_replacements()? {
            if from.is_empty() {
                return Err(error::config_invalid(
                    "value_replacements keys must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Export root; the generator runs here
    pub fn start_path(&self) -> PathBuf {
        PathBuf::from(self.start_path_str())
    }

    fn start_path_str(&self) -> &str {
        self.initial_variables
            .v_start_path
            .as_deref()
            .unwrap_or(".")
    }

    fn expand(&self, template: &str) -> PathBuf {
        PathBuf::from(template.replace(START_PATH_PLACEHOLDER, self.start_path_str()))
    }

    pub fn bindings_csv_path(&self) -> PathBuf {
        self.expand(
            self.initial_variables
                .v_resource_key_job_id_mapping_csv_file_path
                .as_deref()
                .unwrap_or(DEFAULT_BINDINGS_CSV),
        )
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.expand(
            self.initial_variables
                .v_backup_jobs_yaml_path
                .as_deref()
                .unwrap_or(DEFAULT_BACKUP_DIR),
        )
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.expand(
            self.initial_variables
                .v_databricks_yml_path
                .as_deref()
                .unwrap_or(DEFAULT_MANIFEST),
        )
    }

    pub fn cli_path(&self) -> &str {
        self.initial_variables
            .v_databricks_cli_path
            .as_deref()
            .unwrap_or(DEFAULT_CLI)
    }

    pub fn profile(&self) -> Option<&str> {
        self.initial_variables.v_databricks_config_profile.as_deref()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.initial_variables.v_log_level.as_deref()
    }

    pub fn export_libraries(&self) -> bool {
        self.global_settings.export_libraries
    }

    /// Path rewrite rules in configured order, or the defaults
    pub fn path_rules(&self) -> Result<Vec<(String, String)>> {
        match &self.path_replacement {
            Some(mapping) => ordered_pairs(mapping, "path_replacement"),
            None => Ok(DEFAULT_PATH_RULES
                .iter()
                .map(|(p, r)| ((*p).to_string(), (*r).to_string()))
                .collect()),
        }
    }

    /// Literal substitutions in configured order, or the interpolation escape
    ///
    /// Keys starting with `(` are regex-style entries and are not applied.
    pub fn value_replacements(&self) -> Result<Vec<(String, String)>> {
        let Some(mapping) = &self.value_replacements else {
            return Ok(vec![("${".to_string(), "$${".to_string())]);
        };
        let mut pairs = ordered_pairs(mapping, "value_replacements")?;
        pairs.retain(|(from, _)| {
            let literal = !from.starts_with('(');
            if !literal {
                tracing::debug!(key = %from, "Skipping regex-style value replacement");
            }
            literal
        });
        Ok(pairs)
    }

    /// Active workflows in order, followed by active pipelines in order
    pub fn active_resources(&self) -> Vec<ResourceDescriptor> {
        self.workflows
            .iter()
            .filter(|w| w.is_active)
            .map(ResourceDescriptor::from)
            .chain(
                self.pipelines
                    .iter()
                    .filter(|p| p.is_active)
                    .map(ResourceDescriptor::from),
            )
            .collect()
    }

    /// Active resources, failing the whole run when there are none
    pub fn require_active_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        let resources = self.active_resources();
        if resources.is_empty() {
            return Err(ExportError::NoActiveResources);
        }
        Ok(resources)
    }
}

fn ordered_pairs(mapping: &serde_yaml::Mapping, section: &str) -> Result<Vec<(String, String)>> {
    mapping
        .iter()
        .map(|(k, v)| match (k.as_str(), scalar_text(v)) {
            (Some(key), Some(value)) => Ok((key.to_string(), value)),
            _ => Err(error::config_invalid(format!(
                "{section} entries must map strings to strings"
            ))),
        })
        .collect()
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

//! Workflow and pipeline entries of `config.yml`

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{ResourceDescriptor, ResourceKind};

/// A configured job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowEntry {
    #[serde(default)]
    pub job_name: Option<String>,

    #[serde(deserialize_with = "id_as_string")]
    pub job_id: String,

    #[serde(default)]
    pub is_existing: bool,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub export_libraries: Option<bool>,
}

/// A configured pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineEntry {
    #[serde(default)]
    pub pipeline_name: Option<String>,

    #[serde(deserialize_with = "id_as_string")]
    pub pipeline_id: String,

    #[serde(default)]
    pub is_existing: bool,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub export_libraries: Option<bool>,
}

impl From<&WorkflowEntry> for ResourceDescriptor {
    fn from(entry: &WorkflowEntry) -> Self {
        ResourceDescriptor {
            kind: ResourceKind::Job,
            id: entry.job_id.clone(),
            display_name: entry.job_name.clone(),
            is_existing: entry.is_existing,
            is_active: entry.is_active,
            export_libraries_override: entry.export_libraries,
        }
    }
}

impl From<&PipelineEntry> for ResourceDescriptor {
    fn from(entry: &PipelineEntry) -> Self {
        ResourceDescriptor {
            kind: ResourceKind::Pipeline,
            id: entry.pipeline_id.clone(),
            display_name: entry.pipeline_name.clone(),
            is_existing: entry.is_existing,
            is_active: entry.is_active,
            export_libraries_override: entry.export_libraries,
        }
    }
}

/// Job ids are numbers in the workspace but often quoted in config
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other:?}"
        ))),
    }
}

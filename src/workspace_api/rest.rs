//! REST implementation of the workspace capability

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde_json::Value;

use super::{
    ObjectType, PermissionEntry, PermissionsProvider, WorkspaceApi, WorkspaceObject,
    parse_access_control_list,
};
use crate::domain::ResourceKind;
use crate::error::{self, Result};

const USER_AGENT: &str = concat!("wf-export/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Blocking client for the workspace REST API, authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct RestWorkspaceClient {
    base: Url,
    token: String,
    client: Client,
}

impl RestWorkspaceClient {
    pub fn new(host: &str, token: impl Into<String>) -> Result<Self> {
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let base = Url::parse(&host)
            .map_err(|e| error::config_invalid(format!("invalid workspace host '{host}': {e}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base,
            token: token.into(),
            client,
        })
    }

    /// `endpoint` appended to any path the host carries, e.g. a proxy prefix
    fn url(&self, endpoint: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{endpoint}", self.base.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Response> {
        tracing::debug!(endpoint, "GET");
        let response = self
            .client
            .get(self.url(endpoint))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|e| error::api_request_failed(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(error::api_request_failed(
                endpoint,
                format!("{status}: {}", detail.trim()),
            ));
        }
        Ok(response)
    }

    fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.get(endpoint, query)?
            .json::<Value>()
            .map_err(|e| error::api_request_failed(endpoint, e.to_string()))
    }

    fn get_bytes(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        self.get(endpoint, query)?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| error::api_request_failed(endpoint, e.to_string()))
    }
}

/// `dbfs:/Volumes/...` is served by the files API as `/Volumes/...`
fn volume_api_path(path: &str) -> &str {
    path.strip_prefix("dbfs:").unwrap_or(path)
}

impl WorkspaceApi for RestWorkspaceClient {
    fn job_settings(&self, job_id: &str) -> Result<Value> {
        self.get_json("/api/2.1/jobs/get", &[("job_id", job_id)])
    }

    fn pipeline_spec(&self, pipeline_id: &str) -> Result<Value> {
        self.get_json(&format!("/api/2.0/pipelines/{pipeline_id}"), &[])
    }

    fn export_text(&self, path: &str) -> Result<String> {
        let endpoint = "/api/2.0/workspace/export";
        let response = self.get_json(endpoint, &[("path", path), ("format", "SOURCE")])?;
        let encoded = response
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| error::api_request_failed(endpoint, "response has no content"))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| error::api_request_failed(endpoint, e.to_string()))?;
        String::from_utf8(bytes)
            .map_err(|e| error::artifact_fetch_failed(path, format!("not UTF-8 text: {e}")))
    }

    fn export_binary(&self, path: &str) -> Result<Vec<u8>> {
        self.get_bytes(
            "/api/2.0/workspace/export",
            &[("path", path), ("format", "AUTO"), ("direct_download", "true")],
        )
    }

    fn read_volume_file(&self, path: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/api/2.0/fs/files{}", volume_api_path(path)), &[])
    }

    fn list(&self, path: &str) -> Result<Vec<WorkspaceObject>> {
        let response = self.get_json("/api/2.0/workspace/list", &[("path", path)])?;
        let objects = response
            .get("objects")
            .and_then(Value::as_array)
            .map(|objects| {
                objects
                    .iter()
                    .filter_map(|object| {
                        let path = object.get("path").and_then(Value::as_str)?;
                        let object_type = object
                            .get("object_type")
                            .and_then(Value::as_str)
                            .map_or(ObjectType::Other, ObjectType::from_api);
                        let mut entry = WorkspaceObject::new(path, object_type);
                        if let Some(language) = object.get("language").and_then(Value::as_str) {
                            entry = entry.with_language(language);
                        }
                        Some(entry)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(objects)
    }
}

impl PermissionsProvider for RestWorkspaceClient {
    fn permissions(&self, kind: ResourceKind, id: &str) -> Result<Vec<PermissionEntry>> {
        let response =
            self.get_json(&format!("/api/2.0/permissions/{}/{id}", kind.collection_key()), &[])?;
        Ok(parse_access_control_list(&response))
    }
}

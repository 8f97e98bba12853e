//! Export and import of Kibana saved objects as an NDJSON bundle file.
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;

pub const DEFAULT_DASHBOARD_ID: &str = "ead49010-3ec2-11ed-8d8c-37728a319e21";
pub const DEFAULT_INDEX_PATTERN_ID: &str = "14ed31a0-3ec2-11ed-8d8c-37728a319e21";

/// Reference to one saved object, e.g. a dashboard or an index pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedObjectRef {
    #[serde(rename = "type")]
    pub typ: String,
    pub id: String,
}

impl SavedObjectRef {
    pub fn new(typ: &str, id: &str) -> Self {
        Self {
            typ: typ.to_string(),
            id: id.to_string(),
        }
    }

    /// The board dashboard and the index pattern it is built on.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("dashboard", DEFAULT_DASHBOARD_ID),
            Self::new("index-pattern", DEFAULT_INDEX_PATTERN_ID),
        ]
    }
}

#[derive(Clone)]
pub struct KibanaClient {
    http: Client,
    base_api_url: String,
    api_key: String,
}

impl fmt::Debug for KibanaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KibanaClient")
            .field("base_api_url", &self.base_api_url)
            .finish_non_exhaustive()
    }
}

pub fn build_export_request(objects: &[SavedObjectRef]) -> Value {
    json!({
        "objects": objects,
        "excludeExportDetails": true,
    })
}

impl KibanaClient {
    pub fn new(base_api_url: &str, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("trello-kibana/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_api_url: base_api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.kibana.base_api_url, cfg.elastic.api_key.clone())
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/{}", self.base_api_url, endpoint))
            .header("kbn-xsrf", "true")
            .header("Authorization", format!("ApiKey {}", self.api_key))
    }

    pub fn build_export(&self, objects: &[SavedObjectRef]) -> Result<reqwest::Request> {
        self.post("saved_objects/_export")
            .json(&build_export_request(objects))
            .build()
            .context("failed to build Kibana export request")
    }

    /// Export `objects` and write the bundle verbatim to `path`.
    pub async fn export_objects(&self, objects: &[SavedObjectRef], path: &Path) -> Result<()> {
        let request = self.build_export(objects)?;
        info!(url = %request.url(), objects = objects.len(), "exporting Kibana objects");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Kibana")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("kibana export error {}: {}", status, body));
        }
        let bundle = res
            .text()
            .await
            .context("failed to read Kibana export")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, bundle.as_bytes())
            .await
            .with_context(|| format!("failed to write bundle {}", path.display()))?;
        info!(path = %path.display(), bytes = bundle.len(), "wrote Kibana bundle");
        Ok(())
    }

    /// Upload the bundle at `path` with overwrite enabled and return the raw
    /// response body.
    pub async fn import_objects(&self, path: &Path) -> Result<String> {
        let content = fs::read(path)
            .await
            .with_context(|| format!("failed to read bundle {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("export.ndjson")
            .to_string();
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(content)
                .file_name(file_name)
                .mime_str("application/ndjson")?,
        );

        info!(path = %path.display(), "importing Kibana objects");
        let res = self
            .post("saved_objects/_import")
            .query(&[("overwrite", "true")])
            .multipart(form)
            .send()
            .await
            .context("failed to reach Kibana")?;
        let status = res.status();
        let body = res
            .text()
            .await
            .context("failed to read Kibana import response")?;
        if !status.is_success() {
            warn!("Kibana import error - Status: {}, Body: {}", status, body);
        }
        Ok(body)
    }
}

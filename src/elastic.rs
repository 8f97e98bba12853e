use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ProjectionError;
use crate::pipeline::BulkAction;

pub type ActionStream<'a> = dyn Iterator<Item = Result<BulkAction, ProjectionError>> + Send + 'a;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub indexed: usize,
    pub requests: usize,
}

/// Destination for projected documents.
#[async_trait]
pub trait IndexSink: Send + Sync {
    /// Drain `actions` into the index. The first projection or transport
    /// error aborts the remainder of the stream.
    async fn bulk(&self, actions: &mut ActionStream<'_>) -> Result<BulkSummary>;
}

#[derive(Clone)]
pub struct ElasticClient {
    http: Client,
    bulk_url: Url,
    api_key: String,
    chunk_size: usize,
}

impl fmt::Debug for ElasticClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticClient")
            .field("bulk_url", &self.bulk_url)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl ElasticClient {
    pub fn new(host: &str, api_key: String, chunk_size: usize) -> Result<Self> {
        let bulk_url = Url::parse(&format!("{}/_bulk", host.trim_end_matches('/')))
            .with_context(|| format!("invalid Elasticsearch host {:?}", host))?;
        let http = Client::builder()
            .user_agent(concat!("trello-kibana/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            bulk_url,
            api_key,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.elastic.host,
            cfg.elastic.api_key.clone(),
            cfg.elastic.bulk_chunk_size,
        )
    }

    pub fn build_request(&self, body: String) -> Result<reqwest::Request> {
        let mut builder = self
            .http
            .post(self.bulk_url.clone())
            .header("Content-Type", "application/x-ndjson");
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("ApiKey {}", self.api_key));
        }
        builder
            .body(body)
            .build()
            .context("failed to build bulk request")
    }

    async fn send_chunk(&self, body: String, docs: usize) -> Result<()> {
        let request = self.build_request(body)?;
        debug!(docs, url = %request.url(), "sending bulk chunk");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Elasticsearch")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("Elasticsearch bulk error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("elasticsearch bulk error {}: {}", status, body));
        }
        let payload: BulkResponse = res
            .json()
            .await
            .context("invalid Elasticsearch bulk response")?;
        if payload.errors {
            let failed: Vec<&BulkItemResult> = payload
                .items
                .iter()
                .flat_map(|item| item.values())
                .filter(|r| r.error.is_some())
                .collect();
            let first = failed
                .first()
                .map(|r| {
                    format!(
                        "{} ({}): {}",
                        r.id.as_deref().unwrap_or("?"),
                        r.status,
                        r.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                    )
                })
                .unwrap_or_default();
            return Err(anyhow!(
                "{} document(s) failed to index, first: {}",
                failed.len(),
                first
            ));
        }
        Ok(())
    }
}

/// Append one action/document pair to an NDJSON bulk body.
pub fn push_action(body: &mut String, action: &BulkAction) -> Result<()> {
    let meta = json!({ "index": { "_index": action.index, "_id": action.id() } });
    body.push_str(&serde_json::to_string(&meta)?);
    body.push('\n');
    let doc = serde_json::to_string(&action.record).context("failed to serialize card record")?;
    body.push_str(&doc);
    body.push('\n');
    Ok(())
}

#[async_trait]
impl IndexSink for ElasticClient {
    async fn bulk(&self, actions: &mut ActionStream<'_>) -> Result<BulkSummary> {
        let mut summary = BulkSummary::default();
        loop {
            let mut body = String::new();
            let mut docs = 0;
            while docs < self.chunk_size {
                let Some(action) = actions.next() else { break };
                push_action(&mut body, &action?)?;
                docs += 1;
            }
            if docs == 0 {
                break;
            }
            self.send_chunk(body, docs).await?;
            summary.indexed += docs;
            summary.requests += 1;
            if docs < self.chunk_size {
                break;
            }
        }
        info!(indexed = summary.indexed, requests = summary.requests, "bulk complete");
        Ok(summary)
    }
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemResult>>,
}

#[derive(Deserialize)]
struct BulkItemResult {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(default)]
    status: u16,
    error: Option<serde_json::Value>,
}

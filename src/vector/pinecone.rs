//! Pinecone data-plane client

use super::{ChunkRecord, MetadataFilter, RetrievedChunk, VectorError, VectorResult, VectorStore};
use crate::config::VectorConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const API_VERSION: &str = "2024-07";

/// Vectors written per upsert request
pub const UPSERT_BATCH_SIZE: usize = 100;

pub struct PineconeStore {
    client: Client,
    api_key: String,
    index: String,
    namespace: Option<String>,
    control_plane_url: String,
    host: OnceCell<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RetrievedChunk,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: usize,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

impl PineconeStore {
    pub fn new(config: &VectorConfig) -> VectorResult<Self> {
        if config.api_key.is_empty() {
            return Err(VectorError::ConfigError("Pinecone requires an API key".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorError::ConfigError(e.to_string()))?;

        let host = OnceCell::new();
        if let Some(configured) = config.host.as_deref().filter(|h| !h.is_empty()) {
            let _ = host.set(normalize_host(configured));
        }

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            index: config.index.clone(),
            namespace: config.namespace.clone(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            host,
        })
    }

    /// Data-plane base URL, resolved through the control plane on first use
    async fn host(&self) -> VectorResult<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!("{}/indexes/{}", self.control_plane_url, self.index);
                let resp = self
                    .client
                    .get(&url)
                    .header("Api-Key", &self.api_key)
                    .header("X-Pinecone-API-Version", API_VERSION)
                    .send()
                    .await
                    .map_err(VectorError::from_transport)?;
                if !resp.status().is_success() {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(VectorError::ApiError(format!(
                        "describe index {} returned {}: {}",
                        self.index, status, text
                    )));
                }
                let described: DescribeIndexResponse =
                    resp.json().await.map_err(|e| VectorError::SerializationError(e.to_string()))?;
                info!(index = %self.index, host = %described.host, "resolved Pinecone index host");
                Ok::<_, VectorError>(normalize_host(&described.host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> VectorResult<R> {
        let url = format!("{}{}", self.host().await?, path);
        let resp = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(VectorError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(VectorError::ApiError(format!("Pinecone returned {}: {}", status, text)));
        }
        resp.json().await.map_err(|e| VectorError::SerializationError(e.to_string()))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// `{"key": {"$eq": value}}` for every filter entry
pub fn filter_expression(filter: &MetadataFilter) -> Value {
    let mut expr = Map::new();
    for (key, value) in filter.iter() {
        expr.insert(key.clone(), json!({ "$eq": value }));
    }
    Value::Object(expr)
}

fn chunk_from_match(m: Match) -> VectorResult<RetrievedChunk> {
    let metadata = m
        .metadata
        .ok_or_else(|| VectorError::SerializationError(format!("match {} has no metadata", m.id)))?;
    let field = |key: &str| metadata.get(key).and_then(Value::as_str).map(str::to_string);
    let text = field("text")
        .ok_or_else(|| VectorError::SerializationError(format!("match {} has no text metadata", m.id)))?;
    Ok(RetrievedChunk {
        text,
        source_file: field("source_file").unwrap_or_default(),
        policy_type: field("policy_type").unwrap_or_default(),
    })
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<RetrievedChunk>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            filter: filter.filter(|f| !f.is_empty()).map(filter_expression),
            namespace: self.namespace.as_deref(),
        };
        let response: QueryResponse = self.post("/query", &request).await?;
        debug!(matches = response.matches.len(), "Pinecone query complete");
        response.matches.into_iter().map(chunk_from_match).collect()
    }

    async fn upsert(&self, records: Vec<ChunkRecord>) -> VectorResult<usize> {
        let mut written = 0;
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|r| UpsertVector {
                        id: &r.id,
                        values: &r.values,
                        metadata: &r.chunk,
                    })
                    .collect(),
                namespace: self.namespace.as_deref(),
            };
            let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
            written += response.upserted_count;
        }
        Ok(written)
    }
}

//! Neo4j over the HTTP transactional endpoint

use super::{DocumentRegistry, GraphContext, GraphError, GraphResult, Role, RosterEntry, RosterStrategy, UserContext};
use crate::config::GraphConfig;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

const USER_CONTEXT_QUERY: &str = "\
MATCH (e:Employee {id: $id})
OPTIONAL MATCH (e)-[:WORKS_IN]->(d:Department)
OPTIONAL MATCH (e)-[:REPORTS_TO]->(m:Manager)
OPTIONAL MATCH (e)-[:MENTORED_BY]->(t:Mentor)
OPTIONAL MATCH (e)-[:STUDIED_AT]->(c:College)
OPTIONAL MATCH (e)-[:HAS_TYPE]->(et:EmploymentType)
RETURN e.name AS name, d.name AS department, m.name AS manager,
       t.name AS mentor, c.name AS college, et.name AS employment_type
LIMIT 1";

const EMPLOYMENT_TYPE_ROSTER_QUERY: &str = "\
MATCH (e:Employee)-[:HAS_TYPE]->(:EmploymentType {name: $type})
RETURN e.id AS id, e.name AS name
ORDER BY e.id";

const REGISTER_DOCUMENT_QUERY: &str = "\
MERGE (d:PolicyDocument {policy_type: $policy_type})
SET d.filename = $filename, d.ingested_at = $ingested_at";

/// Map a driver URI onto the HTTP API base.
///
/// `bolt://` and `neo4j://` go to port 7474 over http, their `+s`/`+ssc`
/// variants to 7473 over https. `http(s)://` URIs are used as given.
pub fn http_base_from_uri(uri: &str) -> GraphResult<String> {
    let url = Url::parse(uri).map_err(|e| GraphError::ConfigError(format!("invalid graph URI {}: {}", uri, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| GraphError::ConfigError(format!("graph URI has no host: {}", uri)))?;

    match url.scheme() {
        "http" | "https" => Ok(uri.trim_end_matches('/').to_string()),
        "bolt" | "neo4j" => Ok(format!("http://{}:7474", host)),
        "bolt+s" | "bolt+ssc" | "neo4j+s" | "neo4j+ssc" => Ok(format!("https://{}:7473", host)),
        other => Err(GraphError::ConfigError(format!("unsupported graph URI scheme: {}", other))),
    }
}

pub struct Neo4jClient {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Deserialize)]
struct Row {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl Neo4jClient {
    pub fn new(config: &GraphConfig) -> GraphResult<Self> {
        let base = http_base_from_uri(&config.uri)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GraphError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/db/{}/tx/commit", base, config.database),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Run one statement in an auto-commit transaction; rows come back keyed by column
    async fn run(&self, statement: &str, parameters: Value) -> GraphResult<Vec<Map<String, Value>>> {
        let request = CommitRequest {
            statements: [Statement { statement, parameters }],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(GraphError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GraphError::ApiError(format!("Neo4j returned {}: {}", status, text)));
        }

        let body: CommitResponse = resp.json().await.map_err(|e| GraphError::SerializationError(e.to_string()))?;
        if let Some(err) = body.errors.first() {
            return Err(GraphError::ApiError(format!("{}: {}", err.code, err.message)));
        }

        let Some(result) = body.results.into_iter().next() else {
            return Ok(Vec::new());
        };
        result
            .data
            .into_iter()
            .map(|row| {
                if row.row.len() != result.columns.len() {
                    return Err(GraphError::Malformed(format!(
                        "row has {} values for {} columns",
                        row.row.len(),
                        result.columns.len()
                    )));
                }
                Ok(result.columns.iter().cloned().zip(row.row).collect())
            })
            .collect()
    }
}

#[async_trait]
impl GraphContext for Neo4jClient {
    async fn user_context(&self, user_id: &str) -> GraphResult<Option<UserContext>> {
        let rows = self.run(USER_CONTEXT_QUERY, json!({ "id": user_id })).await?;
        rows.first().map(UserContext::from_record).transpose()
    }

    async fn roster(&self, role: Role) -> GraphResult<Vec<RosterEntry>> {
        let rows = match role.roster_strategy() {
            RosterStrategy::EmploymentType(name) => {
                self.run(EMPLOYMENT_TYPE_ROSTER_QUERY, json!({ "type": name })).await?
            }
            RosterStrategy::Label(label) => {
                // labels cannot be parameters; they come from a closed set
                let statement = format!("MATCH (m:{}) RETURN m.id AS id, m.name AS name ORDER BY m.id", label);
                self.run(&statement, json!({})).await?
            }
        };
        debug!(role = %role, rows = rows.len(), "roster lookup");
        rows.iter().map(RosterEntry::from_record).collect()
    }
}

#[async_trait]
impl DocumentRegistry for Neo4jClient {
    async fn register_document(&self, policy_type: &str, filename: &str) -> GraphResult<()> {
        let params = json!({
            "policy_type": policy_type,
            "filename": filename,
            "ingested_at": chrono::Utc::now().to_rfc3339(),
        });
        self.run(REGISTER_DOCUMENT_QUERY, params).await?;
        Ok(())
    }
}

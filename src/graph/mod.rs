//! Graph context client
//!
//! Resolves an employee's organizational context (department, manager,
//! mentor, college, employment type) and lists people holding a role.
//! Backend rows are validated here, so callers only ever see typed records.

pub mod memory;
pub mod neo4j;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use memory::{DirectorySeed, MemoryDirectory};
pub use neo4j::Neo4jClient;

/// Employment type used when the graph has none for an employee
pub const UNSPECIFIED_EMPLOYMENT: &str = "unspecified";

/// Graph errors
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A row that does not have the expected shape
    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GraphError::Timeout(e.to_string())
        } else {
            GraphError::NetworkError(e.to_string())
        }
    }
}

/// Organizational context of one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub name: String,
    pub department: Option<String>,
    pub manager: Option<String>,
    pub mentor: Option<String>,
    pub college: Option<String>,
    pub employment_type: String,
}

impl UserContext {
    /// Build from a record keyed by column name.
    ///
    /// `name` is mandatory; every other column may be missing or null.
    pub fn from_record(record: &Map<String, Value>) -> GraphResult<Self> {
        let name = optional_str(record, "name")?
            .ok_or_else(|| GraphError::Malformed("employee record has no name".to_string()))?;
        Ok(Self {
            name,
            department: optional_str(record, "department")?,
            manager: optional_str(record, "manager")?,
            mentor: optional_str(record, "mentor")?,
            college: optional_str(record, "college")?,
            employment_type: optional_str(record, "employment_type")?
                .unwrap_or_else(|| UNSPECIFIED_EMPLOYMENT.to_string()),
        })
    }
}

/// A person listed under a role
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

impl RosterEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn from_record(record: &Map<String, Value>) -> GraphResult<Self> {
        let id = optional_str(record, "id")?
            .ok_or_else(|| GraphError::Malformed("roster record has no id".to_string()))?;
        let name = optional_str(record, "name")?
            .ok_or_else(|| GraphError::Malformed(format!("roster record {} has no name", id)))?;
        Ok(Self { id, name })
    }
}

fn optional_str(record: &Map<String, Value>, key: &str) -> GraphResult<Option<String>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(GraphError::Malformed(format!("{} is not a string: {}", key, other))),
    }
}

/// Roles a roster can be listed for. Parsing is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Intern,
    FullTime,
    Manager,
    Mentor,
}

/// How a role is found in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterStrategy {
    /// Employees linked by `HAS_TYPE` to the named `EmploymentType`
    EmploymentType(&'static str),
    /// Every node carrying the label
    Label(&'static str),
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Intern, Role::FullTime, Role::Manager, Role::Mentor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Intern => "intern",
            Role::FullTime => "full_time",
            Role::Manager => "manager",
            Role::Mentor => "mentor",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }

    pub fn roster_strategy(&self) -> RosterStrategy {
        match self {
            Role::Intern => RosterStrategy::EmploymentType("intern"),
            Role::FullTime => RosterStrategy::EmploymentType("full_time"),
            Role::Manager => RosterStrategy::Label("Manager"),
            Role::Mentor => RosterStrategy::Label("Mentor"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Read access to the organization graph
#[async_trait]
pub trait GraphContext: Send + Sync {
    /// `None` when no employee has this id
    async fn user_context(&self, user_id: &str) -> GraphResult<Option<UserContext>>;

    /// Everyone holding `role`, in backend order
    async fn roster(&self, role: Role) -> GraphResult<Vec<RosterEntry>>;

    /// Roster for a role name, ascending by id. Unknown names list nobody
    /// and never reach the backend.
    async fn list_by_role(&self, role: &str) -> GraphResult<Vec<RosterEntry>> {
        let Some(role) = Role::parse(role) else {
            return Ok(Vec::new());
        };
        let mut entries = self.roster(role).await?;
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }
}

/// Records ingested policy documents in the graph
#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    async fn register_document(&self, policy_type: &str, filename: &str) -> GraphResult<()>;
}

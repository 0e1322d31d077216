//! In-process organization directory, seeded from JSON.
//!
//! Seed layout:
//!
//! ```json
//! {
//!   "employees": [{ "id": "EMP001", "name": "Asha", "department": "Engineering",
//!                   "manager": "MGR001", "mentor": "MEN001", "college": "NIT",
//!                   "employment_type": "intern" }],
//!   "managers":  [{ "id": "MGR001", "name": "Ravi" }],
//!   "mentors":   [{ "id": "MEN001", "name": "Meera" }]
//! }
//! ```
//!
//! An employee's `manager` and `mentor` are ids into the other two lists.

use super::{DocumentRegistry, GraphContext, GraphError, GraphResult, Role, RosterEntry, RosterStrategy, UserContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub employees: Vec<EmployeeSeed>,
    #[serde(default)]
    pub managers: Vec<RosterEntry>,
    #[serde(default)]
    pub mentors: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub mentor: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
}

/// A registered policy document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    pub filename: String,
    pub ingested_at: String,
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    seed: DirectorySeed,
    documents: RwLock<BTreeMap<String, PolicyDocument>>,
}

impl MemoryDirectory {
    pub fn new(seed: DirectorySeed) -> Self {
        Self {
            seed,
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_json(json: &str) -> GraphResult<Self> {
        let seed: DirectorySeed = serde_json::from_str(json).map_err(|e| GraphError::SerializationError(e.to_string()))?;
        Ok(Self::new(seed))
    }

    pub async fn from_file(path: &Path) -> GraphResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let directory = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            employees = directory.seed.employees.len(),
            "loaded directory seed"
        );
        Ok(directory)
    }

    /// Registered documents keyed by policy type
    pub async fn documents(&self) -> BTreeMap<String, PolicyDocument> {
        self.documents.read().await.clone()
    }

    fn name_of(list: &[RosterEntry], id: Option<&String>) -> Option<String> {
        let id = id?;
        list.iter().find(|e| &e.id == id).map(|e| e.name.clone())
    }
}

#[async_trait]
impl GraphContext for MemoryDirectory {
    async fn user_context(&self, user_id: &str) -> GraphResult<Option<UserContext>> {
        let Some(employee) = self.seed.employees.iter().find(|e| e.id == user_id) else {
            return Ok(None);
        };
        Ok(Some(UserContext {
            name: employee.name.clone(),
            department: employee.department.clone(),
            manager: Self::name_of(&self.seed.managers, employee.manager.as_ref()),
            mentor: Self::name_of(&self.seed.mentors, employee.mentor.as_ref()),
            college: employee.college.clone(),
            employment_type: employee
                .employment_type
                .clone()
                .unwrap_or_else(|| super::UNSPECIFIED_EMPLOYMENT.to_string()),
        }))
    }

    async fn roster(&self, role: Role) -> GraphResult<Vec<RosterEntry>> {
        let entries = match role.roster_strategy() {
            RosterStrategy::EmploymentType(kind) => self
                .seed
                .employees
                .iter()
                .filter(|e| e.employment_type.as_deref() == Some(kind))
                .map(|e| RosterEntry::new(e.id.clone(), e.name.clone()))
                .collect(),
            RosterStrategy::Label("Manager") => self.seed.managers.clone(),
            RosterStrategy::Label("Mentor") => self.seed.mentors.clone(),
            RosterStrategy::Label(other) => {
                return Err(GraphError::ConfigError(format!("no {} nodes in the directory", other)));
            }
        };
        Ok(entries)
    }
}

#[async_trait]
impl DocumentRegistry for MemoryDirectory {
    async fn register_document(&self, policy_type: &str, filename: &str) -> GraphResult<()> {
        self.documents.write().await.insert(
            policy_type.to_string(),
            PolicyDocument {
                filename: filename.to_string(),
                ingested_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "employees": [
            { "id": "EMP002", "name": "Bala", "employment_type": "full_time", "manager": "MGR001" },
            { "id": "EMP001", "name": "Asha", "department": "Engineering", "manager": "MGR001",
              "mentor": "MEN001", "college": "NIT Trichy", "employment_type": "intern" },
            { "id": "EMP003", "name": "Chitra", "mentor": "MEN404" }
        ],
        "managers": [{ "id": "MGR001", "name": "Ravi" }],
        "mentors": [{ "id": "MEN001", "name": "Meera" }]
    }"#;

    #[tokio::test]
    async fn test_user_context_resolves_relations() {
        let dir = MemoryDirectory::from_json(SEED).unwrap();
        let ctx = dir.user_context("EMP001").await.unwrap().unwrap();
        assert_eq!(ctx.name, "Asha");
        assert_eq!(ctx.manager.as_deref(), Some("Ravi"));
        assert_eq!(ctx.mentor.as_deref(), Some("Meera"));
        assert_eq!(ctx.college.as_deref(), Some("NIT Trichy"));
        assert_eq!(ctx.employment_type, "intern");

        // dangling mentor id and missing type
        let ctx = dir.user_context("EMP003").await.unwrap().unwrap();
        assert_eq!(ctx.mentor, None);
        assert_eq!(ctx.employment_type, "unspecified");

        assert!(dir.user_context("EMP999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roster_by_role() {
        let dir = MemoryDirectory::from_json(SEED).unwrap();
        assert_eq!(dir.list_by_role("intern").await.unwrap(), vec![RosterEntry::new("EMP001", "Asha")]);
        assert_eq!(dir.list_by_role("full_time").await.unwrap(), vec![RosterEntry::new("EMP002", "Bala")]);
        assert_eq!(dir.list_by_role("manager").await.unwrap(), vec![RosterEntry::new("MGR001", "Ravi")]);
        assert_eq!(dir.list_by_role("mentor").await.unwrap(), vec![RosterEntry::new("MEN001", "Meera")]);
        assert!(dir.list_by_role("Manager").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_document_replaces_by_policy_type() {
        let dir = MemoryDirectory::default();
        dir.register_document("leave", "leave.txt").await.unwrap();
        dir.register_document("leave", "leave_v2.txt").await.unwrap();
        let docs = dir.documents().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs["leave"].filename, "leave_v2.txt");
    }

    #[test]
    fn test_invalid_seed() {
        assert!(matches!(
            MemoryDirectory::from_json(r#"{ "employees": [{ "id": "EMP001" }] }"#),
            Err(GraphError::SerializationError(_))
        ));
    }
}

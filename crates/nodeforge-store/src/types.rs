use chrono::{DateTime, Utc};
use nodeforge_config::{ExecutionType, WorkflowDef};
use nodeforge_orchestrator::{NodeStatus, RunStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A saved graph as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SavedWorkflow {
  pub id: String,
  pub user_id: String,
  pub name: String,
  pub description: Option<String>,
  pub data: Json<WorkflowDef>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Who ran what, supplied alongside a run result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
  pub user_id: String,
  /// The saved graph the run was started from, if any.
  pub workflow_id: Option<String>,
}

/// A run as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRun {
  pub id: String,
  pub user_id: String,
  pub workflow_id: Option<String>,
  pub execution_type: String,
  pub status: String,
  pub duration: i64,
  pub node_ids: Json<Vec<String>>,
  pub created_at: DateTime<Utc>,
}

/// One node's result within a stored run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NodeRun {
  pub run_id: String,
  pub position: i64,
  pub node_id: String,
  pub node_type: String,
  pub status: String,
  pub inputs: Json<serde_json::Value>,
  pub outputs: Option<Json<serde_json::Value>>,
  pub error: Option<String>,
  pub duration: i64,
}

fn parse_tag<T: serde::de::DeserializeOwned>(tag: &str) -> Option<T> {
  serde_json::from_value(serde_json::Value::String(tag.to_string())).ok()
}

impl WorkflowRun {
  pub fn execution_type(&self) -> Option<ExecutionType> {
    parse_tag(&self.execution_type)
  }

  pub fn run_status(&self) -> Option<RunStatus> {
    parse_tag(&self.status)
  }
}

impl NodeRun {
  pub fn node_status(&self) -> Option<NodeStatus> {
    parse_tag(&self.status)
  }
}

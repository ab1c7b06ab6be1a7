//! Nodeforge Store
//!
//! Persistence for saved graphs and execution history. The orchestrator
//! never touches storage itself; callers hand a finished
//! [`WorkflowExecutionResult`] to a [`Store`] together with the run's
//! metadata.
//!
//! The [`Store`] trait defines operations for:
//! - Saving and loading graph definitions per user
//! - Recording a run and its per-node results
//! - Querying run history

mod sqlite;
mod types;

use std::collections::HashMap;

use async_trait::async_trait;
use nodeforge_config::{Node, WorkflowDef};
use nodeforge_orchestrator::WorkflowExecutionResult;

pub use sqlite::SqliteStore;
pub use types::{NodeRun, RunMetadata, SavedWorkflow, WorkflowRun};

/// Number of runs returned by [`Store::list_runs`].
pub const HISTORY_LIMIT: i64 = 50;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Storage for saved graphs and execution history.
#[async_trait]
pub trait Store: Send + Sync {
  /// Save a graph for a user. A definition with an `id` replaces the
  /// existing record; one without gets a fresh id.
  async fn save_workflow(
    &self,
    user_id: &str,
    def: &WorkflowDef,
    name: &str,
    description: Option<&str>,
  ) -> Result<SavedWorkflow, Error>;

  async fn get_workflow(&self, workflow_id: &str) -> Result<SavedWorkflow, Error>;

  /// Saved graphs of a user, most recently updated first.
  async fn list_workflows(&self, user_id: &str) -> Result<Vec<SavedWorkflow>, Error>;

  /// Record a finished run and one row per node result.
  ///
  /// `node_types` maps node ids to their type tag; see [`node_types`].
  async fn record_run(
    &self,
    meta: &RunMetadata,
    result: &WorkflowExecutionResult,
    node_types: &HashMap<String, String>,
  ) -> Result<WorkflowRun, Error>;

  async fn get_run(&self, run_id: &str) -> Result<WorkflowRun, Error>;

  /// A user's runs, newest first, optionally limited to one saved graph.
  async fn list_runs(
    &self,
    user_id: &str,
    workflow_id: Option<&str>,
  ) -> Result<Vec<WorkflowRun>, Error>;

  /// Node results of a run, in the order they were recorded.
  async fn list_node_runs(&self, run_id: &str) -> Result<Vec<NodeRun>, Error>;
}

/// Map node ids to their type tag, for [`Store::record_run`].
pub fn node_types(nodes: &[Node]) -> HashMap<String, String> {
  nodes
    .iter()
    .map(|n| (n.id.clone(), n.kind().to_string()))
    .collect()
}

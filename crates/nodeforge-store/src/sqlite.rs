use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use nodeforge_config::WorkflowDef;
use nodeforge_orchestrator::WorkflowExecutionResult;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;

use crate::{Error, HISTORY_LIMIT, NodeRun, RunMetadata, SavedWorkflow, Store, WorkflowRun};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) a database file and apply migrations.
  pub async fn open(path: &Path) -> Result<Self, Error> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true)
      .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// A migrated, private in-memory database.
  pub async fn in_memory() -> Result<Self, Error> {
    // Every connection to :memory: is a separate database, so keep exactly one alive.
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect("sqlite::memory:")
      .await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), Error> {
    sqlx::migrate!().run(&self.pool).await?;
    Ok(())
  }
}

fn to_i64(value: u64) -> i64 {
  i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl Store for SqliteStore {
  async fn save_workflow(
    &self,
    user_id: &str,
    def: &WorkflowDef,
    name: &str,
    description: Option<&str>,
  ) -> Result<SavedWorkflow, Error> {
    let id = def
      .id
      .clone()
      .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let data = WorkflowDef {
      id: Some(id.clone()),
      name: Some(name.to_string()),
      description: description.map(str::to_string),
      ..def.clone()
    };
    let now = Utc::now();

    sqlx::query(
      r#"
      INSERT INTO workflows (id, user_id, name, description, data, created_at, updated_at)
      VALUES (?, ?, ?, ?, ?, ?, ?)
      ON CONFLICT (id) DO UPDATE SET
        name = excluded.name,
        description = excluded.description,
        data = excluded.data,
        updated_at = excluded.updated_at
      WHERE workflows.user_id = excluded.user_id
      "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(Json(&data))
    .bind(now)
    .bind(now)
    .execute(&self.pool)
    .await?;

    // Another user's record with the same id is left untouched.
    let saved = self.get_workflow(&id).await?;
    if saved.user_id != user_id {
      return Err(Error::NotFound(id));
    }
    Ok(saved)
  }

  async fn get_workflow(&self, workflow_id: &str) -> Result<SavedWorkflow, Error> {
    sqlx::query_as(
      r#"
      SELECT id, user_id, name, description, data, created_at, updated_at
      FROM workflows
      WHERE id = ?
      "#,
    )
    .bind(workflow_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| Error::NotFound(workflow_id.to_string()))
  }

  async fn list_workflows(&self, user_id: &str) -> Result<Vec<SavedWorkflow>, Error> {
    let workflows = sqlx::query_as(
      r#"
      SELECT id, user_id, name, description, data, created_at, updated_at
      FROM workflows
      WHERE user_id = ?
      ORDER BY updated_at DESC, rowid DESC
      "#,
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(workflows)
  }

  async fn record_run(
    &self,
    meta: &RunMetadata,
    result: &WorkflowExecutionResult,
    node_types: &HashMap<String, String>,
  ) -> Result<WorkflowRun, Error> {
    let mut tx = self.pool.begin().await?;

    sqlx::query(
      r#"
      INSERT INTO workflow_runs (id, user_id, workflow_id, execution_type, status, duration, node_ids, created_at)
      VALUES (?, ?, ?, ?, ?, ?, ?, ?)
      "#,
    )
    .bind(&result.run_id)
    .bind(&meta.user_id)
    .bind(&meta.workflow_id)
    .bind(result.execution_type.as_str())
    .bind(result.status.as_str())
    .bind(to_i64(result.duration))
    .bind(Json(&result.node_ids))
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    for (position, node) in result.node_results.iter().enumerate() {
      let node_type = node_types
        .get(&node.node_id)
        .map(String::as_str)
        .unwrap_or_default();

      sqlx::query(
        r#"
        INSERT INTO node_runs (run_id, position, node_id, node_type, status, inputs, outputs, error, duration)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
      )
      .bind(&result.run_id)
      .bind(position as i64)
      .bind(&node.node_id)
      .bind(node_type)
      .bind(node.status.as_str())
      .bind(Json(&node.inputs))
      .bind(node.outputs.as_ref().map(Json))
      .bind(&node.error)
      .bind(to_i64(node.duration))
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    self.get_run(&result.run_id).await
  }

  async fn get_run(&self, run_id: &str) -> Result<WorkflowRun, Error> {
    sqlx::query_as(
      r#"
      SELECT id, user_id, workflow_id, execution_type, status, duration, node_ids, created_at
      FROM workflow_runs
      WHERE id = ?
      "#,
    )
    .bind(run_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| Error::NotFound(run_id.to_string()))
  }

  async fn list_runs(
    &self,
    user_id: &str,
    workflow_id: Option<&str>,
  ) -> Result<Vec<WorkflowRun>, Error> {
    let runs = sqlx::query_as(
      r#"
      SELECT id, user_id, workflow_id, execution_type, status, duration, node_ids, created_at
      FROM workflow_runs
      WHERE user_id = ? AND (? IS NULL OR workflow_id = ?)
      ORDER BY rowid DESC
      LIMIT ?
      "#,
    )
    .bind(user_id)
    .bind(workflow_id)
    .bind(workflow_id)
    .bind(HISTORY_LIMIT)
    .fetch_all(&self.pool)
    .await?;

    Ok(runs)
  }

  async fn list_node_runs(&self, run_id: &str) -> Result<Vec<NodeRun>, Error> {
    let nodes = sqlx::query_as(
      r#"
      SELECT run_id, position, node_id, node_type, status, inputs, outputs, error, duration
      FROM node_runs
      WHERE run_id = ?
      ORDER BY position ASC
      "#,
    )
    .bind(run_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(nodes)
  }
}

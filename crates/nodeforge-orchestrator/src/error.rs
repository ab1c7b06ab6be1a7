use nodeforge_workflow::WorkflowError;
use thiserror::Error;

/// Errors that abort a run before any node executes.
#[derive(Debug, Error)]
pub enum OrchestratorError {
  /// The graph snapshot is structurally invalid (cycle, duplicate ids).
  #[error(transparent)]
  Workflow(#[from] WorkflowError),

  /// A requested node does not exist and the missing-node policy is `error`.
  #[error("node not found: {0}")]
  NodeNotFound(String),
}

impl OrchestratorError {
  pub fn is_cycle(&self) -> bool {
    matches!(self, Self::Workflow(WorkflowError::Cycle { .. }))
  }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("workflow contains a cycle through nodes: {}", nodes.join(", "))]
  Cycle { nodes: Vec<String> },

  #[error("duplicate node id: {0}")]
  DuplicateNodeId(String),
}

/// Reasons a new connection is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
  #[error("node not found: {0}")]
  UnknownNode(String),

  #[error("node '{0}' cannot be connected to itself")]
  SelfConnection(String),

  #[error("connecting {from} -> {to} would create a cycle")]
  WouldCreateCycle { from: String, to: String },
}

use serde::{Deserialize, Serialize};

/// What happens to a node whose upstream dependency failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyFailurePolicy {
  /// Run the node anyway; the failed edge contributes no value and the
  /// processor decides whether that is fatal.
  #[default]
  Proceed,
  /// Record the node as failed without dispatching it.
  FailDependents,
}

/// What happens when a requested node id is not in the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingNodePolicy {
  /// Log a warning and leave it out of the run.
  #[default]
  Skip,
  /// Abort the run with [`OrchestratorError::NodeNotFound`](crate::OrchestratorError::NodeNotFound).
  Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
  /// Maximum number of processors running at once. `1` runs nodes strictly
  /// one after another in topological order.
  pub max_concurrency: usize,
  pub on_dependency_failure: DependencyFailurePolicy,
  pub on_missing_node: MissingNodePolicy,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      max_concurrency: 1,
      on_dependency_failure: DependencyFailurePolicy::default(),
      on_missing_node: MissingNodePolicy::default(),
    }
  }
}

impl OrchestratorConfig {
  pub fn is_parallel(&self) -> bool {
    self.max_concurrency > 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_config_uses_defaults() {
    let config: OrchestratorConfig =
      serde_json::from_str(r#"{ "on_dependency_failure": "fail_dependents" }"#).unwrap();
    assert_eq!(config.max_concurrency, 1);
    assert_eq!(
      config.on_dependency_failure,
      DependencyFailurePolicy::FailDependents
    );
    assert_eq!(config.on_missing_node, MissingNodePolicy::Skip);
    assert!(!config.is_parallel());
  }
}

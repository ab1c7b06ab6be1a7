//! Per-node and per-run result records.

use nodeforge_config::{ExecutionType, Node};
use nodeforge_processor::{Inputs, Outputs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
  Success,
  Failed,
}

impl NodeStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeStatus::Success => "success",
      NodeStatus::Failed => "failed",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Success,
  Failed,
  Partial,
}

impl RunStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      RunStatus::Success => "success",
      RunStatus::Failed => "failed",
      RunStatus::Partial => "partial",
    }
  }
}

impl std::fmt::Display for RunStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Outcome of one node in one run. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionResult {
  pub node_id: String,
  pub status: NodeStatus,
  /// The resolved inputs the node was (or would have been) dispatched with.
  pub inputs: Inputs,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub outputs: Option<Outputs>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  /// Elapsed time in milliseconds.
  pub duration: u64,
}

impl NodeExecutionResult {
  pub fn success(node_id: impl Into<String>, inputs: Inputs, outputs: Outputs, duration: u64) -> Self {
    Self {
      node_id: node_id.into(),
      status: NodeStatus::Success,
      inputs,
      outputs: Some(outputs),
      error: None,
      duration,
    }
  }

  pub fn failed(
    node_id: impl Into<String>,
    inputs: Inputs,
    error: impl Into<String>,
    duration: u64,
  ) -> Self {
    Self {
      node_id: node_id.into(),
      status: NodeStatus::Failed,
      inputs,
      outputs: None,
      error: Some(error.into()),
      duration,
    }
  }

  pub fn is_success(&self) -> bool {
    self.status == NodeStatus::Success
  }

  /// The `output` value of a successful node.
  pub fn output(&self) -> Option<&serde_json::Value> {
    self.outputs.as_ref().and_then(|o| o.get("output"))
  }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecutionResult {
  pub run_id: String,
  #[serde(rename = "type")]
  pub execution_type: ExecutionType,
  pub status: RunStatus,
  /// Wall-clock duration of the run in milliseconds.
  pub duration: u64,
  /// Node results in completion order.
  pub node_results: Vec<NodeExecutionResult>,
  /// The requested target set, as given by the caller.
  pub node_ids: Vec<String>,
}

impl WorkflowExecutionResult {
  pub fn node_result(&self, node_id: &str) -> Option<&NodeExecutionResult> {
    self.node_results.iter().find(|r| r.node_id == node_id)
  }

  /// Write each successful node's `output` back into its `data` so later
  /// partial or single runs can reuse it.
  pub fn apply_outputs(&self, nodes: &mut [Node]) {
    for result in self.node_results.iter().filter(|r| r.is_success()) {
      let Some(output) = result.output() else {
        continue;
      };
      if let Some(node) = nodes.iter_mut().find(|n| n.id == result.node_id) {
        node.data.set("output", output.clone());
      }
    }
  }
}

/// Aggregate run status: `success` with no failures, `failed` with no
/// successes, `partial` otherwise. An empty run is a success.
pub fn determine_status(results: &[NodeExecutionResult]) -> RunStatus {
  let failed = results.iter().filter(|r| !r.is_success()).count();
  let succeeded = results.len() - failed;

  if failed == 0 {
    RunStatus::Success
  } else if succeeded == 0 {
    RunStatus::Failed
  } else {
    RunStatus::Partial
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeforge_config::{NodeData, NodeKind};
  use serde_json::json;

  fn ok(id: &str) -> NodeExecutionResult {
    let mut outputs = Outputs::new();
    outputs.insert("output".to_string(), json!(format!("{id}-out")));
    NodeExecutionResult::success(id, Inputs::new(), outputs, 1)
  }

  fn err(id: &str) -> NodeExecutionResult {
    NodeExecutionResult::failed(id, Inputs::new(), "boom", 1)
  }

  #[test]
  fn test_determine_status() {
    assert_eq!(determine_status(&[]), RunStatus::Success);
    assert_eq!(determine_status(&[ok("a"), ok("b")]), RunStatus::Success);
    assert_eq!(determine_status(&[err("a")]), RunStatus::Failed);
    assert_eq!(
      determine_status(&[ok("a"), ok("b"), err("c")]),
      RunStatus::Partial
    );
  }

  #[test]
  fn test_serialized_shape() {
    let value = serde_json::to_value(err("n1")).unwrap();
    assert_eq!(value["nodeId"], json!("n1"));
    assert_eq!(value["status"], json!("failed"));
    assert_eq!(value["error"], json!("boom"));
    assert!(value.get("outputs").is_none());

    let run = WorkflowExecutionResult {
      run_id: "r".to_string(),
      execution_type: ExecutionType::Single,
      status: RunStatus::Partial,
      duration: 3,
      node_results: vec![],
      node_ids: vec!["n1".to_string()],
    };
    let value = serde_json::to_value(run).unwrap();
    assert_eq!(value["type"], json!("single"));
    assert_eq!(value["status"], json!("partial"));
    assert_eq!(value["nodeIds"], json!(["n1"]));
  }

  #[test]
  fn test_apply_outputs_only_touches_successes() {
    let mut nodes = vec![
      Node::new("a", NodeData::new(NodeKind::Llm)),
      Node::new("c", NodeData::new(NodeKind::Llm).with("output", "old")),
    ];
    let run = WorkflowExecutionResult {
      run_id: "r".to_string(),
      execution_type: ExecutionType::Full,
      status: RunStatus::Partial,
      duration: 3,
      node_results: vec![ok("a"), err("c"), ok("missing")],
      node_ids: vec![],
    };

    run.apply_outputs(&mut nodes);
    assert_eq!(nodes[0].data.output(), Some(&json!("a-out")));
    assert_eq!(nodes[1].data.output(), Some(&json!("old")));
  }
}

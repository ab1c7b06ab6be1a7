use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

/// A saved graph, as written by the editor or stored by the persistence
/// layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub nodes: Vec<Node>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

impl WorkflowDef {
  pub fn node_ids(&self) -> Vec<String> {
    self.nodes.iter().map(|n| n.id.clone()).collect()
  }
}

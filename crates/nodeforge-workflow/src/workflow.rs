use std::collections::HashMap;

use nodeforge_config::{Edge, Node, WorkflowDef};

use crate::error::{ConnectionError, WorkflowError};
use crate::graph::Graph;

/// An immutable snapshot of a graph, ready for execution.
///
/// Nodes keep their declaration order and edges keep theirs; input
/// resolution depends on the latter.
#[derive(Debug, Clone)]
pub struct Workflow {
  nodes: Vec<Node>,
  index: HashMap<String, usize>,
  edges: Vec<Edge>,
  graph: Graph,
}

impl Workflow {
  /// Take a snapshot of the given nodes and edges.
  ///
  /// Node IDs must be unique. Edges referencing unknown nodes are kept; they
  /// never contribute values or ordering constraints.
  pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, WorkflowError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
      if index.insert(node.id.clone(), position).is_some() {
        return Err(WorkflowError::DuplicateNodeId(node.id.clone()));
      }
    }

    let graph = Graph::new(&edges);
    Ok(Self {
      nodes,
      index,
      edges,
      graph,
    })
  }

  pub fn from_def(def: WorkflowDef) -> Result<Self, WorkflowError> {
    Self::new(def.nodes, def.edges)
  }

  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// The graph structure for traversal.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  pub fn contains(&self, node_id: &str) -> bool {
    self.index.contains_key(node_id)
  }

  /// Edges targeting a node, in declaration order.
  pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
    self.edges.iter().filter(move |e| e.target == node_id)
  }

  /// Check whether a new connection is acceptable: both endpoints exist,
  /// it is not a self-loop, and it does not close a cycle.
  pub fn validate_connection(&self, source: &str, target: &str) -> Result<(), ConnectionError> {
    for id in [source, target] {
      if !self.contains(id) {
        return Err(ConnectionError::UnknownNode(id.to_string()));
      }
    }

    if source == target {
      return Err(ConnectionError::SelfConnection(source.to_string()));
    }

    if self.graph.would_create_cycle(source, target) {
      return Err(ConnectionError::WouldCreateCycle {
        from: source.to_string(),
        to: target.to_string(),
      });
    }

    Ok(())
  }

  /// Add an edge after validating it. An empty edge ID is replaced with a
  /// generated one.
  pub fn connect(&mut self, mut edge: Edge) -> Result<&Edge, ConnectionError> {
    self.validate_connection(&edge.source, &edge.target)?;

    if edge.id.is_empty() {
      edge.id = format!("edge-{}", uuid::Uuid::new_v4());
    }

    self.graph.add_edge(&edge.source, &edge.target);
    self.edges.push(edge);
    Ok(&self.edges[self.edges.len() - 1])
  }

  /// Give the nodes and edges back, e.g. to persist them.
  pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
    (self.nodes, self.edges)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeforge_config::{NodeData, NodeKind};

  fn text_node(id: &str) -> Node {
    Node::new(id, NodeData::new(NodeKind::Text).with("text", id))
  }

  fn chain() -> Workflow {
    Workflow::new(
      vec![text_node("a"), text_node("b"), text_node("c")],
      vec![Edge::new("e1", "a", "b", "input"), Edge::new("e2", "b", "c", "input")],
    )
    .unwrap()
  }

  #[test]
  fn test_duplicate_node_ids_are_rejected() {
    let result = Workflow::new(vec![text_node("a"), text_node("a")], vec![]);
    assert!(matches!(result, Err(WorkflowError::DuplicateNodeId(id)) if id == "a"));
  }

  #[test]
  fn test_dangling_edges_are_tolerated() {
    let workflow = Workflow::new(
      vec![text_node("a")],
      vec![Edge::new("e1", "ghost", "a", "input")],
    )
    .unwrap();

    assert_eq!(workflow.incoming("a").count(), 1);
    assert!(workflow.get_node("ghost").is_none());
  }

  #[test]
  fn test_connect_rejects_cycle() {
    let mut workflow = chain();
    let err = workflow
      .connect(Edge::new("", "c", "a", "input"))
      .unwrap_err();

    assert_eq!(
      err,
      ConnectionError::WouldCreateCycle {
        from: "c".to_string(),
        to: "a".to_string()
      }
    );
    assert_eq!(workflow.edges().len(), 2);
  }

  #[test]
  fn test_connect_rejects_self_and_unknown() {
    let mut workflow = chain();
    assert_eq!(
      workflow.connect(Edge::new("", "a", "a", "input")).unwrap_err(),
      ConnectionError::SelfConnection("a".to_string())
    );
    assert_eq!(
      workflow.connect(Edge::new("", "a", "zzz", "input")).unwrap_err(),
      ConnectionError::UnknownNode("zzz".to_string())
    );
  }

  #[test]
  fn test_connect_appends_and_updates_graph() {
    let mut workflow = chain();
    let edge = workflow.connect(Edge::new("", "a", "c", "input")).unwrap();
    assert!(edge.id.starts_with("edge-"));

    assert_eq!(workflow.edges().len(), 3);
    assert!(workflow.graph().upstream("c").contains(&"a".to_string()));
    assert!(workflow.validate_connection("c", "a").is_err());
  }
}

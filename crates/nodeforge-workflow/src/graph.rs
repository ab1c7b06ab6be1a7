use std::collections::{HashMap, HashSet, VecDeque};

use nodeforge_config::Edge;

use crate::error::WorkflowError;

/// Graph structure for traversal and analysis.
///
/// Built from the edge list alone, so edges pointing at nodes that do not
/// exist are carried along harmlessly: they only ever matter when both
/// endpoints are part of a requested set.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// Adjacency list: node_id -> downstream node_ids, in edge declaration order.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> upstream node_ids, in edge declaration order.
  reverse_adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
  /// Build a graph from edges.
  pub fn new(edges: &[Edge]) -> Self {
    let mut graph = Self::default();
    for edge in edges {
      graph.add_edge(&edge.source, &edge.target);
    }
    graph
  }

  pub(crate) fn add_edge(&mut self, from: &str, to: &str) {
    self
      .adjacency
      .entry(from.to_string())
      .or_default()
      .push(to.to_string());
    self
      .reverse_adjacency
      .entry(to.to_string())
      .or_default()
      .push(from.to_string());
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// All ancestors of a node, following incoming edges transitively.
  ///
  /// Terminates on cyclic graphs; a node on a cycle is its own ancestor.
  pub fn dependencies_of(&self, node_id: &str) -> HashSet<String> {
    let mut dependencies = HashSet::new();
    let mut stack: Vec<&str> = self.upstream(node_id).iter().map(String::as_str).collect();

    while let Some(id) = stack.pop() {
      if dependencies.insert(id.to_string()) {
        stack.extend(self.upstream(id).iter().map(String::as_str));
      }
    }

    dependencies
  }

  /// Ancestors of `node_id` that are members of `node_ids`, in the order
  /// they appear there. The node itself is never included, even when it
  /// sits on a cycle.
  ///
  /// Paths may pass through nodes outside the set: with `a -> x -> b` and
  /// the set `[a, b]`, `a` is a dependency of `b`.
  pub fn dependencies_within(&self, node_id: &str, node_ids: &[String]) -> Vec<String> {
    let ancestors = self.dependencies_of(node_id);
    let mut seen = HashSet::new();
    node_ids
      .iter()
      .filter(|id| id.as_str() != node_id && ancestors.contains(*id))
      .filter(|id| seen.insert(id.as_str()))
      .cloned()
      .collect()
  }

  /// Topological order of `node_ids`.
  ///
  /// A requested node is ordered after every requested ancestor, including
  /// ancestors reached only through nodes outside the set. Edges that merely
  /// leave the set impose nothing. Two requested nodes that are each
  /// other's ancestors form a cycle and fail with [`WorkflowError::Cycle`].
  ///
  /// Duplicate IDs are collapsed (first occurrence wins). Ready nodes are
  /// taken in order of discovery: the initial queue follows the request
  /// order and released nodes follow it too. Callers must not depend on the
  /// relative order of independent nodes.
  pub fn topological_order(&self, node_ids: &[String]) -> Result<Vec<String>, WorkflowError> {
    let mut seen = HashSet::new();
    let requested: Vec<String> = node_ids
      .iter()
      .filter(|id| seen.insert(id.as_str()))
      .cloned()
      .collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(requested.len());
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for id in &requested {
      let deps = self.dependencies_within(id, &requested);
      in_degree.insert(id.as_str(), deps.len());
      for dep in deps {
        if let Some(dep) = requested.iter().find(|r| **r == dep) {
          dependents.entry(dep.as_str()).or_default().push(id.as_str());
        }
      }
    }

    let mut queue: VecDeque<&str> = requested
      .iter()
      .map(String::as_str)
      .filter(|id| in_degree[id] == 0)
      .collect();

    let mut order = Vec::with_capacity(requested.len());
    while let Some(id) = queue.pop_front() {
      order.push(id.to_string());

      for dependent in dependents.get(id).map(Vec::as_slice).unwrap_or(&[]) {
        if let Some(degree) = in_degree.get_mut(dependent) {
          *degree -= 1;
          if *degree == 0 {
            queue.push_back(*dependent);
          }
        }
      }
    }

    if order.len() < requested.len() {
      let ordered: HashSet<&str> = order.iter().map(String::as_str).collect();
      let nodes = requested
        .iter()
        .filter(|id| !ordered.contains(id.as_str()))
        .cloned()
        .collect();
      return Err(WorkflowError::Cycle { nodes });
    }

    Ok(order)
  }

  /// Whether adding an edge `from -> to` would close a cycle, i.e. `from`
  /// is already reachable from `to`.
  pub fn would_create_cycle(&self, from: &str, to: &str) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([to]);

    while let Some(current) = queue.pop_front() {
      if current == from {
        return true;
      }
      if !visited.insert(current) {
        continue;
      }
      queue.extend(self.downstream(current).iter().map(String::as_str));
    }

    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn edge(from: &str, to: &str) -> Edge {
    Edge::new(format!("{from}-{to}"), from, to, "input")
  }

  fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
  }

  fn position(order: &[String], id: &str) -> usize {
    order.iter().position(|x| x == id).unwrap()
  }

  #[test]
  fn test_dependencies_are_transitive() {
    let graph = Graph::new(&[edge("a", "b"), edge("b", "c"), edge("x", "c")]);

    let deps = graph.dependencies_of("c");
    assert_eq!(deps, HashSet::from(["a".into(), "b".into(), "x".into()]));
    assert!(graph.dependencies_of("a").is_empty());
  }

  #[test]
  fn test_dependencies_terminate_on_cycle() {
    let graph = Graph::new(&[edge("a", "b"), edge("b", "a")]);
    let deps = graph.dependencies_of("a");
    assert_eq!(deps, HashSet::from(["a".into(), "b".into()]));
  }

  #[test]
  fn test_topological_order_respects_edges() {
    let graph = Graph::new(&[edge("a", "c"), edge("b", "c"), edge("c", "d")]);
    let order = graph.topological_order(&ids(&["d", "c", "b", "a"])).unwrap();

    assert_eq!(order.len(), 4);
    assert!(position(&order, "a") < position(&order, "c"));
    assert!(position(&order, "b") < position(&order, "c"));
    assert!(position(&order, "c") < position(&order, "d"));
  }

  #[test]
  fn test_topological_order_ignores_edges_leaving_the_set() {
    // b depends on a, but a is not requested: b is immediately ready.
    let graph = Graph::new(&[edge("a", "b"), edge("b", "c")]);
    let order = graph.topological_order(&ids(&["c", "b"])).unwrap();
    assert_eq!(order, ids(&["b", "c"]));
  }

  #[test]
  fn test_topological_order_collapses_duplicates() {
    let graph = Graph::new(&[edge("a", "b")]);
    let order = graph.topological_order(&ids(&["b", "a", "b"])).unwrap();
    assert_eq!(order, ids(&["a", "b"]));
  }

  #[test]
  fn test_parallel_edges_between_same_nodes() {
    let graph = Graph::new(&[edge("a", "b"), edge("a", "b")]);
    let order = graph.topological_order(&ids(&["a", "b"])).unwrap();
    assert_eq!(order, ids(&["a", "b"]));
  }

  #[test]
  fn test_cycle_within_set_is_reported() {
    let graph = Graph::new(&[edge("a", "b"), edge("b", "c"), edge("c", "b")]);
    let err = graph.topological_order(&ids(&["a", "b", "c"])).unwrap_err();

    match err {
      WorkflowError::Cycle { nodes } => assert_eq!(nodes, ids(&["b", "c"])),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_cycle_outside_set_is_ignored() {
    let graph = Graph::new(&[edge("a", "b"), edge("b", "a"), edge("b", "c")]);
    let order = graph.topological_order(&ids(&["b", "c"])).unwrap();
    assert_eq!(order, ids(&["b", "c"]));
  }

  #[test]
  fn test_topological_order_follows_paths_through_outside_nodes() {
    let graph = Graph::new(&[edge("a", "x"), edge("x", "b")]);
    let order = graph.topological_order(&ids(&["b", "a"])).unwrap();
    assert_eq!(order, ids(&["a", "b"]));
  }

  #[test]
  fn test_cycle_through_outside_nodes_is_reported() {
    let graph = Graph::new(&[edge("a", "x"), edge("x", "b"), edge("b", "y"), edge("y", "a")]);
    let err = graph.topological_order(&ids(&["a", "b"])).unwrap_err();

    match err {
      WorkflowError::Cycle { nodes } => assert_eq!(nodes, ids(&["a", "b"])),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_dependencies_within_excludes_self_and_outsiders() {
    let graph = Graph::new(&[edge("a", "x"), edge("x", "b"), edge("b", "y"), edge("y", "b")]);
    let deps = graph.dependencies_within("b", &ids(&["b", "y", "a"]));
    assert_eq!(deps, ids(&["y", "a"]));
    assert!(graph.dependencies_within("b", &ids(&["b"])).is_empty());
  }

  #[test]
  fn test_would_create_cycle() {
    let graph = Graph::new(&[edge("a", "b"), edge("b", "c")]);
    assert!(graph.would_create_cycle("c", "a"));
    assert!(graph.would_create_cycle("a", "a"));
    assert!(!graph.would_create_cycle("a", "c"));
    assert!(!graph.would_create_cycle("x", "a"));
  }
}

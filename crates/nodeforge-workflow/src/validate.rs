//! Advisory structural validation against the node-type catalog.
//!
//! Nothing here is enforced at execution time. The engine runs whatever it
//! is given and lets processors reject bad inputs; these checks exist for
//! the editor and the `validate` command.

use std::fmt;

use nodeforge_config::{ConnectionKind, definition};

use crate::workflow::Workflow;

/// A structural problem found in a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
  /// An edge targets a port the node type does not declare.
  UnknownInputHandle {
    edge_id: String,
    node_id: String,
    handle: String,
  },
  /// An edge leaves from a port the node type does not declare.
  UnknownOutputHandle {
    edge_id: String,
    node_id: String,
    handle: String,
  },
  /// The source port and target port carry different kinds of value.
  KindMismatch {
    edge_id: String,
    source: ConnectionKind,
    target: ConnectionKind,
  },
  /// A required input is neither connected nor set in the node's data.
  MissingRequiredInput { node_id: String, handle: String },
}

impl fmt::Display for StructuralIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StructuralIssue::UnknownInputHandle {
        edge_id,
        node_id,
        handle,
      } => write!(
        f,
        "edge '{edge_id}' targets unknown input '{handle}' on node '{node_id}'"
      ),
      StructuralIssue::UnknownOutputHandle {
        edge_id,
        node_id,
        handle,
      } => write!(
        f,
        "edge '{edge_id}' leaves unknown output '{handle}' on node '{node_id}'"
      ),
      StructuralIssue::KindMismatch {
        edge_id,
        source,
        target,
      } => write!(
        f,
        "edge '{edge_id}' connects a {source:?} output to a {target:?} input"
      ),
      StructuralIssue::MissingRequiredInput { node_id, handle } => {
        write!(f, "node '{node_id}' is missing required input '{handle}'")
      }
    }
  }
}

/// Check every edge and node with a catalog definition.
///
/// Nodes of custom kinds, and edges touching unknown nodes, are skipped.
pub fn validate_structure(workflow: &Workflow) -> Vec<StructuralIssue> {
  let mut issues = Vec::new();

  for edge in workflow.edges() {
    let (Some(source), Some(target)) = (
      workflow.get_node(&edge.source),
      workflow.get_node(&edge.target),
    ) else {
      continue;
    };

    let source_port = definition(source.kind()).map(|def| def.output(edge.source_handle()).cloned());
    let target_port = definition(target.kind()).map(|def| def.input(edge.target_handle()).cloned());

    if let Some(None) = source_port {
      issues.push(StructuralIssue::UnknownOutputHandle {
        edge_id: edge.id.clone(),
        node_id: source.id.clone(),
        handle: edge.source_handle().to_string(),
      });
    }
    if let Some(None) = target_port {
      issues.push(StructuralIssue::UnknownInputHandle {
        edge_id: edge.id.clone(),
        node_id: target.id.clone(),
        handle: edge.target_handle().to_string(),
      });
    }

    if let (Some(Some(out)), Some(Some(input))) = (&source_port, &target_port) {
      if !kinds_compatible(out.kind, input.kind) {
        issues.push(StructuralIssue::KindMismatch {
          edge_id: edge.id.clone(),
          source: out.kind,
          target: input.kind,
        });
      }
    }
  }

  for node in workflow.nodes() {
    let Some(def) = definition(node.kind()) else {
      continue;
    };

    for input in def.inputs.iter().filter(|h| h.required) {
      let connected = workflow
        .incoming(&node.id)
        .any(|e| e.target_handle() == input.id);
      let provided = node
        .data
        .get(input.id)
        .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));

      if !connected && !provided {
        issues.push(StructuralIssue::MissingRequiredInput {
          node_id: node.id.clone(),
          handle: input.id.to_string(),
        });
      }
    }
  }

  issues
}

/// Text can feed a number port (e.g. "50%" into a timestamp); otherwise
/// kinds must match.
fn kinds_compatible(source: ConnectionKind, target: ConnectionKind) -> bool {
  source == target || (source == ConnectionKind::Text && target == ConnectionKind::Number)
}

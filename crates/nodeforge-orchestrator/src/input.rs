//! Input resolution.
//!
//! A node's inputs are built from its incoming edges, in declaration order,
//! and then topped up with the node's own static configuration.

use std::collections::HashMap;

use nodeforge_config::Node;
use nodeforge_processor::{Inputs, Outputs};
use nodeforge_workflow::Workflow;
use serde_json::Value;

/// Input handle whose edges accumulate into a list.
pub const LIST_HANDLE: &str = "images";

/// Static fields consulted, in order, when a source node has not produced
/// an output in the current run.
const STATIC_OUTPUT_FIELDS: [&str; 4] = ["output", "text", "imageUrl", "videoUrl"];

/// Resolve the inputs of `node`.
///
/// `produced` holds the outputs of nodes that completed successfully earlier
/// in this run. Sources outside the run (or that failed in it) fall back to
/// their static `output`/`text`/`imageUrl`/`videoUrl` field.
///
/// - Edges whose source node does not exist contribute nothing.
/// - Edges into [`LIST_HANDLE`] append to a list; absent values are skipped.
/// - Any other handle takes the value of the last edge targeting it.
/// - Static `data` fills every key no edge has set.
pub fn resolve_inputs(
  workflow: &Workflow,
  node: &Node,
  produced: &HashMap<String, Outputs>,
) -> Inputs {
  let mut inputs = Inputs::new();

  for edge in workflow.incoming(&node.id) {
    let Some(source) = workflow.get_node(&edge.source) else {
      continue;
    };
    let value = upstream_value(source, edge.source_handle(), produced.get(&edge.source));
    let handle = edge.target_handle();

    if handle == LIST_HANDLE {
      let list = inputs
        .entry(handle.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
      if let (Value::Array(items), Some(value)) = (list, value) {
        items.push(value);
      }
    } else {
      match value {
        Some(value) => {
          inputs.insert(handle.to_string(), value);
        }
        None => {
          inputs.remove(handle);
        }
      }
    }
  }

  inputs
    .entry("type".to_string())
    .or_insert_with(|| Value::String(node.kind().to_string()));
  for (key, value) in &node.data.fields {
    if !inputs.contains_key(key) {
      inputs.insert(key.clone(), value.clone());
    }
  }

  inputs
}

fn upstream_value(source: &Node, handle: &str, produced: Option<&Outputs>) -> Option<Value> {
  produced
    .and_then(|outputs| outputs.get(handle))
    .filter(|v| is_present(v))
    .or_else(|| {
      STATIC_OUTPUT_FIELDS
        .iter()
        .filter_map(|field| source.data.get(field))
        .find(|v| is_present(v))
    })
    .cloned()
}

fn is_present(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.is_empty(),
    _ => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeforge_config::{Edge, NodeData, NodeKind};
  use serde_json::json;

  fn text(id: &str, value: &str) -> Node {
    Node::new(id, NodeData::new(NodeKind::Text).with("text", value))
  }

  fn image(id: &str, url: &str) -> Node {
    Node::new(id, NodeData::new(NodeKind::UploadImage).with("imageUrl", url))
  }

  fn llm(id: &str) -> Node {
    Node::new(id, NodeData::new(NodeKind::Llm))
  }

  fn outputs(value: Value) -> Outputs {
    let mut outputs = Outputs::new();
    outputs.insert("output".to_string(), value);
    outputs
  }

  #[test]
  fn test_images_accumulate_in_edge_order() {
    let workflow = Workflow::new(
      vec![image("a", "urlA"), image("b", "urlB"), llm("l")],
      vec![
        Edge::new("e1", "a", "l", "images"),
        Edge::new("e2", "b", "l", "images"),
      ],
    )
    .unwrap();

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &HashMap::new());
    assert_eq!(inputs["images"], json!(["urlA", "urlB"]));
  }

  #[test]
  fn test_static_data_fills_unconnected_handles() {
    let node = Node::new(
      "l",
      NodeData::new(NodeKind::Llm)
        .with("userMessage", "hi")
        .with("systemPrompt", "static"),
    );
    let workflow = Workflow::new(
      vec![text("t", "from edge"), node],
      vec![Edge::new("e1", "t", "l", "systemPrompt")],
    )
    .unwrap();

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &HashMap::new());
    assert_eq!(inputs["userMessage"], json!("hi"));
    assert_eq!(inputs["systemPrompt"], json!("from edge"));
    assert_eq!(inputs["type"], json!("llm"));
  }

  #[test]
  fn test_in_run_output_preferred_over_static() {
    let workflow = Workflow::new(
      vec![text("t", "static"), llm("l")],
      vec![Edge::new("e1", "t", "l", "userMessage")],
    )
    .unwrap();

    let mut produced = HashMap::new();
    produced.insert("t".to_string(), outputs(json!("fresh")));

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &produced);
    assert_eq!(inputs["userMessage"], json!("fresh"));
  }

  #[test]
  fn test_cached_output_field_wins_over_config_field() {
    let source = Node::new(
      "s",
      NodeData::new(NodeKind::Llm)
        .with("output", "previous run")
        .with("text", "ignored"),
    );
    let workflow = Workflow::new(
      vec![source, llm("l")],
      vec![Edge::new("e1", "s", "l", "userMessage")],
    )
    .unwrap();

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &HashMap::new());
    assert_eq!(inputs["userMessage"], json!("previous run"));
  }

  #[test]
  fn test_last_edge_wins_for_scalar_handle() {
    let workflow = Workflow::new(
      vec![text("a", "first"), text("b", "second"), llm("l")],
      vec![
        Edge::new("e1", "a", "l", "userMessage"),
        Edge::new("e2", "b", "l", "userMessage"),
      ],
    )
    .unwrap();

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &HashMap::new());
    assert_eq!(inputs["userMessage"], json!("second"));
  }

  #[test]
  fn test_dangling_and_empty_sources_contribute_nothing() {
    let workflow = Workflow::new(
      vec![image("empty", ""), llm("l")],
      vec![
        Edge::new("e1", "ghost", "l", "userMessage"),
        Edge::new("e2", "empty", "l", "images"),
        Edge::new("e3", "ghost", "l", "systemPrompt"),
      ],
    )
    .unwrap();

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &HashMap::new());
    assert!(!inputs.contains_key("userMessage"));
    assert!(!inputs.contains_key("systemPrompt"));
    assert_eq!(inputs["images"], json!([]));
  }

  #[test]
  fn test_named_source_handle() {
    let workflow = Workflow::new(
      vec![llm("s"), llm("l")],
      vec![Edge {
        source_handle: Some("caption".to_string()),
        ..Edge::new("e1", "s", "l", "userMessage")
      }],
    )
    .unwrap();

    let mut out = outputs(json!("main"));
    out.insert("caption".to_string(), json!("side"));
    let produced = HashMap::from([("s".to_string(), out)]);

    let inputs = resolve_inputs(&workflow, workflow.get_node("l").unwrap(), &produced);
    assert_eq!(inputs["userMessage"], json!("side"));
  }
}

use serde::{Deserialize, Serialize};

/// Output port used when an edge does not name one.
pub const DEFAULT_SOURCE_HANDLE: &str = "output";

/// Input port used when an edge does not name one.
pub const DEFAULT_TARGET_HANDLE: &str = "input";

/// A directed data-flow connection from a named output port of one node
/// to a named input port of another.
///
/// The editor writes `null` for unnamed handles, so both handles are
/// optional on the wire and defaulted through the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
  #[serde(default)]
  pub id: String,
  pub source: String,
  pub target: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_handle: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_handle: Option<String>,
}

impl Edge {
  pub fn new(
    id: impl Into<String>,
    source: impl Into<String>,
    target: impl Into<String>,
    target_handle: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      source: source.into(),
      target: target.into(),
      source_handle: None,
      target_handle: Some(target_handle.into()),
    }
  }

  pub fn source_handle(&self) -> &str {
    self
      .source_handle
      .as_deref()
      .unwrap_or(DEFAULT_SOURCE_HANDLE)
  }

  pub fn target_handle(&self) -> &str {
    self
      .target_handle
      .as_deref()
      .unwrap_or(DEFAULT_TARGET_HANDLE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_null_handles_fall_back_to_defaults() {
    let edge: Edge = serde_json::from_value(json!({
      "id": "e1",
      "source": "a",
      "target": "b",
      "sourceHandle": null,
      "targetHandle": null
    }))
    .unwrap();

    assert_eq!(edge.source_handle(), "output");
    assert_eq!(edge.target_handle(), "input");
  }

  #[test]
  fn test_named_handles_are_kept() {
    let edge: Edge = serde_json::from_value(json!({
      "source": "a",
      "target": "b",
      "targetHandle": "userMessage"
    }))
    .unwrap();

    assert_eq!(edge.id, "");
    assert_eq!(edge.target_handle(), "userMessage");
  }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type tag stored in `data.type`.
///
/// Built-in kinds have their own variants. Anything else is carried as
/// `Other` so that custom processors can be registered without touching
/// this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
  Text,
  UploadImage,
  UploadVideo,
  Llm,
  CropImage,
  ExtractFrame,
  Other(String),
}

impl NodeKind {
  pub fn as_str(&self) -> &str {
    match self {
      NodeKind::Text => "text",
      NodeKind::UploadImage => "uploadImage",
      NodeKind::UploadVideo => "uploadVideo",
      NodeKind::Llm => "llm",
      NodeKind::CropImage => "cropImage",
      NodeKind::ExtractFrame => "extractFrame",
      NodeKind::Other(tag) => tag,
    }
  }
}

impl From<String> for NodeKind {
  fn from(tag: String) -> Self {
    match tag.as_str() {
      "text" => NodeKind::Text,
      "uploadImage" => NodeKind::UploadImage,
      "uploadVideo" => NodeKind::UploadVideo,
      "llm" => NodeKind::Llm,
      "cropImage" => NodeKind::CropImage,
      "extractFrame" => NodeKind::ExtractFrame,
      _ => NodeKind::Other(tag),
    }
  }
}

impl From<&str> for NodeKind {
  fn from(tag: &str) -> Self {
    NodeKind::from(tag.to_string())
  }
}

impl From<NodeKind> for String {
  fn from(kind: NodeKind) -> Self {
    kind.as_str().to_string()
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The payload of a node: its type tag plus everything else the editor
/// stored on it (label, static configuration, cached `output`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
  #[serde(rename = "type")]
  pub kind: NodeKind,
  #[serde(flatten)]
  pub fields: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
  pub fn new(kind: impl Into<NodeKind>) -> Self {
    Self {
      kind: kind.into(),
      fields: serde_json::Map::new(),
    }
  }

  /// Builder-style field setter.
  pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
    self.fields.insert(key.into(), value.into());
    self
  }

  pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
    self.fields.get(key)
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
    self.fields.insert(key.into(), value.into());
  }

  /// The output cached from the last run, if any.
  pub fn output(&self) -> Option<&serde_json::Value> {
    self.fields.get("output")
  }
}

/// A node in the graph.
///
/// Editor-only fields (position, size, selection) are ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub data: NodeData,
}

impl Node {
  pub fn new(id: impl Into<String>, data: NodeData) -> Self {
    Self {
      id: id.into(),
      data,
    }
  }

  pub fn kind(&self) -> &NodeKind {
    &self.data.kind
  }
}

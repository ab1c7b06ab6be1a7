//! Static catalog of the built-in node types.
//!
//! Each entry declares the input and output ports of a node type. The
//! catalog drives structural validation in the editor and the CLI; the
//! execution path never enforces it.

use serde::{Deserialize, Serialize};

use crate::node::NodeKind;

/// The kind of value that flows through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
  Text,
  Image,
  Video,
  Number,
}

/// A named input or output port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleDefinition {
  pub id: &'static str,
  pub kind: ConnectionKind,
  pub label: &'static str,
  pub required: bool,
  /// Multiple edges accumulate into a list instead of overwriting.
  pub multiple: bool,
}

/// Catalog entry for one node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTypeDefinition {
  pub kind: NodeKind,
  pub label: &'static str,
  pub inputs: Vec<HandleDefinition>,
  pub outputs: Vec<HandleDefinition>,
}

impl NodeTypeDefinition {
  pub fn input(&self, id: &str) -> Option<&HandleDefinition> {
    self.inputs.iter().find(|h| h.id == id)
  }

  pub fn output(&self, id: &str) -> Option<&HandleDefinition> {
    self.outputs.iter().find(|h| h.id == id)
  }
}

const fn port(
  id: &'static str,
  kind: ConnectionKind,
  label: &'static str,
  required: bool,
) -> HandleDefinition {
  HandleDefinition {
    id,
    kind,
    label,
    required,
    multiple: false,
  }
}

fn output(kind: ConnectionKind, label: &'static str) -> Vec<HandleDefinition> {
  vec![port("output", kind, label, true)]
}

/// All built-in node type definitions.
pub fn catalog() -> Vec<NodeTypeDefinition> {
  use ConnectionKind::*;

  vec![
    NodeTypeDefinition {
      kind: NodeKind::Text,
      label: "Text",
      inputs: vec![],
      outputs: output(Text, "Text"),
    },
    NodeTypeDefinition {
      kind: NodeKind::UploadImage,
      label: "Upload Image",
      inputs: vec![],
      outputs: output(Image, "Image URL"),
    },
    NodeTypeDefinition {
      kind: NodeKind::UploadVideo,
      label: "Upload Video",
      inputs: vec![],
      outputs: output(Video, "Video URL"),
    },
    NodeTypeDefinition {
      kind: NodeKind::Llm,
      label: "Run Any LLM",
      inputs: vec![
        port("systemPrompt", Text, "System Prompt", false),
        port("userMessage", Text, "User Message", true),
        HandleDefinition {
          multiple: true,
          ..port("images", Image, "Images", false)
        },
      ],
      outputs: output(Text, "Output"),
    },
    NodeTypeDefinition {
      kind: NodeKind::CropImage,
      label: "Crop Image",
      inputs: vec![
        port("image_url", Image, "Image URL", true),
        port("x_percent", Number, "X %", false),
        port("y_percent", Number, "Y %", false),
        port("width_percent", Number, "Width %", false),
        port("height_percent", Number, "Height %", false),
      ],
      outputs: output(Image, "Cropped Image"),
    },
    NodeTypeDefinition {
      kind: NodeKind::ExtractFrame,
      label: "Extract Frame from Video",
      inputs: vec![
        port("video_url", Video, "Video URL", true),
        port("timestamp", Number, "Timestamp", false),
      ],
      outputs: output(Image, "Frame Image"),
    },
  ]
}

/// Look up the definition for a node type. Custom kinds have none.
pub fn definition(kind: &NodeKind) -> Option<NodeTypeDefinition> {
  catalog().into_iter().find(|d| &d.kind == kind)
}

use async_trait::async_trait;

use crate::error::ProcessorError;
use crate::processor::{Inputs, Outputs, Processor, ProcessorContext, single_output};

/// Echoes one statically configured field as `output`.
///
/// Used for the `text`, `uploadImage`, and `uploadVideo` node types, whose
/// value is entered in the editor rather than computed. A missing field
/// yields an empty string.
#[derive(Debug, Clone)]
pub struct StaticFieldProcessor {
  field: &'static str,
}

impl StaticFieldProcessor {
  pub fn new(field: &'static str) -> Self {
    Self { field }
  }
}

#[async_trait]
impl Processor for StaticFieldProcessor {
  async fn process(
    &self,
    _ctx: &ProcessorContext,
    inputs: &Inputs,
  ) -> Result<Outputs, ProcessorError> {
    let value = match inputs.get(self.field) {
      Some(serde_json::Value::Null) | None => serde_json::Value::String(String::new()),
      Some(value) => value.clone(),
    };
    Ok(single_output(value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_echoes_configured_field() {
    let processor = StaticFieldProcessor::new("text");
    let mut inputs = Inputs::new();
    inputs.insert("text".to_string(), json!("hello"));

    let outputs = processor
      .process(&ProcessorContext::new("r", "n"), &inputs)
      .await
      .unwrap();
    assert_eq!(outputs["output"], json!("hello"));
  }

  #[tokio::test]
  async fn test_missing_field_is_empty_string() {
    let processor = StaticFieldProcessor::new("imageUrl");
    let outputs = processor
      .process(&ProcessorContext::new("r", "n"), &Inputs::new())
      .await
      .unwrap();
    assert_eq!(outputs["output"], json!(""));
  }
}

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use nodeforge_config::NodeKind;

use crate::builtin::{CropImageProcessor, ExtractFrameProcessor, LlmProcessor, StaticFieldProcessor};
use crate::error::ProcessorError;
use crate::llm::LlmClient;
use crate::media::MediaService;
use crate::processor::{Inputs, Outputs, Processor, ProcessorContext};

/// Maps node type tags to processors.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
  processors: HashMap<NodeKind, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with all six built-in processors.
  pub fn builtin(llm: Arc<dyn LlmClient>, media: Arc<dyn MediaService>) -> Self {
    let mut registry = Self::new();
    registry.register(NodeKind::Text, StaticFieldProcessor::new("text"));
    registry.register(NodeKind::UploadImage, StaticFieldProcessor::new("imageUrl"));
    registry.register(NodeKind::UploadVideo, StaticFieldProcessor::new("videoUrl"));
    registry.register(NodeKind::Llm, LlmProcessor::new(llm));
    registry.register(NodeKind::CropImage, CropImageProcessor::new(media.clone()));
    registry.register(NodeKind::ExtractFrame, ExtractFrameProcessor::new(media));
    registry
  }

  /// Register (or replace) the processor for a node type.
  pub fn register(&mut self, kind: impl Into<NodeKind>, processor: impl Processor + 'static) {
    self.processors.insert(kind.into(), Arc::new(processor));
  }

  /// Register an async closure as the processor for a node type.
  ///
  /// # Example
  ///
  /// ```ignore
  /// registry.register_fn("upper", |inputs| async move {
  ///   let text = inputs.get("input").and_then(|v| v.as_str()).unwrap_or_default();
  ///   let mut out = Outputs::new();
  ///   out.insert("output".into(), text.to_uppercase().into());
  ///   Ok(out)
  /// });
  /// ```
  pub fn register_fn<F, Fut>(&mut self, kind: impl Into<NodeKind>, f: F)
  where
    F: Fn(Inputs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outputs, ProcessorError>> + Send + 'static,
  {
    self.register(kind, FnProcessor { f });
  }

  pub fn get(&self, kind: &NodeKind) -> Option<Arc<dyn Processor>> {
    self.processors.get(kind).cloned()
  }

  pub fn contains(&self, kind: &NodeKind) -> bool {
    self.processors.contains_key(kind)
  }
}

struct FnProcessor<F> {
  f: F,
}

#[async_trait]
impl<F, Fut> Processor for FnProcessor<F>
where
  F: Fn(Inputs) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Outputs, ProcessorError>> + Send,
{
  async fn process(
    &self,
    _ctx: &ProcessorContext,
    inputs: &Inputs,
  ) -> Result<Outputs, ProcessorError> {
    (self.f)(inputs.clone()).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_register_fn_dispatches_by_kind() {
    let mut registry = ProcessorRegistry::new();
    registry.register_fn("upper", |inputs: Inputs| async move {
      let text = inputs
        .get("input")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_uppercase();
      let mut outputs = Outputs::new();
      outputs.insert("output".to_string(), json!(text));
      Ok(outputs)
    });

    let processor = registry.get(&NodeKind::from("upper")).unwrap();
    let mut inputs = Inputs::new();
    inputs.insert("input".to_string(), json!("abc"));

    let outputs = processor
      .process(&ProcessorContext::new("run", "n1"), &inputs)
      .await
      .unwrap();
    assert_eq!(outputs["output"], json!("ABC"));
    assert!(!registry.contains(&NodeKind::Llm));
  }
}

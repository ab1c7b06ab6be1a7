use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProcessorError;
use crate::llm::{LlmClient, LlmRequest};
use crate::processor::{Inputs, Outputs, Processor, ProcessorContext, parse_inputs, single_output};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmInput {
  #[serde(default)]
  system_prompt: Option<String>,
  #[serde(default)]
  user_message: Option<String>,
  #[serde(default)]
  images: Option<Vec<serde_json::Value>>,
}

/// Runs the `llm` node type against an [`LlmClient`].
pub struct LlmProcessor {
  client: Arc<dyn LlmClient>,
}

impl LlmProcessor {
  pub fn new(client: Arc<dyn LlmClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Processor for LlmProcessor {
  async fn process(
    &self,
    ctx: &ProcessorContext,
    inputs: &Inputs,
  ) -> Result<Outputs, ProcessorError> {
    let input: LlmInput = parse_inputs(inputs)?;

    let user_message = input
      .user_message
      .filter(|m| !m.trim().is_empty())
      .ok_or_else(|| ProcessorError::invalid_input("userMessage", "a user message is required"))?;

    let images: Vec<String> = input
      .images
      .unwrap_or_default()
      .into_iter()
      .filter_map(|v| match v {
        serde_json::Value::String(url) if !url.is_empty() => Some(url),
        _ => None,
      })
      .collect();

    let request = LlmRequest {
      system_prompt: input.system_prompt,
      user_message,
      images,
    };
    debug!(node_id = %ctx.node_id, images = request.images.len(), "llm_generate");

    let completion = self.client.generate(&request).await?;
    Ok(single_output(completion))
  }
}

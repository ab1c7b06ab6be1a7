//! LLM backend abstraction.

mod gemini;
mod images;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiClient;

/// A single multimodal generation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmRequest {
  pub system_prompt: Option<String>,
  pub user_message: String,
  /// Image references: `data:` URLs or fetchable HTTP(S) URLs.
  pub images: Vec<String>,
}

impl LlmRequest {
  pub fn new(user_message: impl Into<String>) -> Self {
    Self {
      user_message: user_message.into(),
      ..Default::default()
    }
  }

  /// The text part sent to the model. A non-empty system prompt is
  /// prepended, separated by a blank line.
  pub fn prompt(&self) -> String {
    match self.system_prompt.as_deref() {
      Some(system) if !system.is_empty() => format!("{system}\n\n{}", self.user_message),
      _ => self.user_message.clone(),
    }
  }
}

/// Something that turns a prompt (plus images) into text.
#[async_trait]
pub trait LlmClient: Send + Sync {
  async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError>;
}

/// Connection settings for the Gemini backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  pub api_key: Option<String>,
  pub base_url: String,
  pub primary_model: String,
  /// Retried once when the primary model is not available.
  pub fallback_model: Option<String>,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
      primary_model: "gemini-2.5-flash".to_string(),
      fallback_model: Some("gemini-2.5-flash-lite".to_string()),
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
  #[error("LLM API key is not configured")]
  MissingApiKey,

  #[error("model '{model}' is not available")]
  ModelNotFound { model: String },

  /// Both the primary and the fallback model are unavailable.
  #[error("Model not available for this API key. Please check your Gemini API access.")]
  ModelUnavailable,

  #[error("Quota exceeded. Try again later.")]
  QuotaExceeded,

  #[error("Empty response from LLM")]
  EmptyResponse,

  #[error("LLM request failed ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prompt_joins_system_and_user() {
    let mut request = LlmRequest::new("Describe it");
    assert_eq!(request.prompt(), "Describe it");

    request.system_prompt = Some("You are terse.".to_string());
    assert_eq!(request.prompt(), "You are terse.\n\nDescribe it");

    request.system_prompt = Some(String::new());
    assert_eq!(request.prompt(), "Describe it");
  }

  #[test]
  fn test_quota_message_is_user_facing() {
    assert_eq!(
      LlmError::QuotaExceeded.to_string(),
      "Quota exceeded. Try again later."
    );
  }
}

//! Processor errors.

use crate::llm::LlmError;
use crate::media::MediaError;

/// Errors a processor can fail with.
///
/// The dispatcher turns every one of these into a failed node result; the
/// `Display` text is what ends up in `NodeExecutionResult.error`.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
  /// A resolved input is missing or has the wrong shape.
  #[error("invalid input '{field}': {message}")]
  InvalidInput { field: String, message: String },

  /// The LLM backend failed.
  #[error(transparent)]
  Llm(#[from] LlmError),

  /// The media task queue failed.
  #[error(transparent)]
  Media(#[from] MediaError),

  /// Any other processor-specific failure.
  #[error("{0}")]
  Failed(String),
}

impl ProcessorError {
  pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::InvalidInput {
      field: field.into(),
      message: message.into(),
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed(message.into())
  }
}

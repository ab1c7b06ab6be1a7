use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessorError;

/// Resolved inputs of a node: handle name -> value.
pub type Inputs = serde_json::Map<String, serde_json::Value>;

/// Outputs of a node: port name -> value. Always contains `output`.
pub type Outputs = serde_json::Map<String, serde_json::Value>;

/// Ambient information handed to a processor for one invocation.
#[derive(Debug, Clone)]
pub struct ProcessorContext {
  pub run_id: String,
  pub node_id: String,
  /// Cooperative cancellation for long-running external calls.
  pub cancel: CancellationToken,
}

impl ProcessorContext {
  pub fn new(run_id: impl Into<String>, node_id: impl Into<String>) -> Self {
    Self {
      run_id: run_id.into(),
      node_id: node_id.into(),
      cancel: CancellationToken::new(),
    }
  }

  pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }
}

/// A per-type unit of work.
///
/// Implementations may perform arbitrary I/O. They should return a
/// descriptive [`ProcessorError`] rather than panic; the dispatcher catches
/// panics too, but the resulting message is generic.
#[async_trait]
pub trait Processor: Send + Sync {
  async fn process(
    &self,
    ctx: &ProcessorContext,
    inputs: &Inputs,
  ) -> Result<Outputs, ProcessorError>;
}

/// Build the conventional `{ "output": value }` mapping.
pub(crate) fn single_output(value: impl Into<serde_json::Value>) -> Outputs {
  let mut outputs = Outputs::new();
  outputs.insert("output".to_string(), value.into());
  outputs
}

/// Deserialize the resolved inputs into a typed input struct.
///
/// Errors name the offending handle, e.g. `userMessage` or `images[1]`.
pub(crate) fn parse_inputs<T: DeserializeOwned>(inputs: &Inputs) -> Result<T, ProcessorError> {
  serde_path_to_error::deserialize(serde_json::Value::Object(inputs.clone())).map_err(|e| {
    let message = e.inner().to_string();
    let field = match e.path().to_string() {
      path if path != "." => path,
      _ => missing_field(&message).unwrap_or("inputs").to_string(),
    };
    ProcessorError::invalid_input(field, message)
  })
}

/// The field named by serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
  let rest = message.strip_prefix("missing field `")?;
  rest.split('`').next()
}

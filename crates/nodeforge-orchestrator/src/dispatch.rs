//! Node dispatch: registry lookup plus the failure boundary around every
//! processor invocation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use nodeforge_config::Node;
use nodeforge_processor::{Inputs, Outputs, ProcessorContext, ProcessorRegistry};
use tracing::debug;

/// Uniform outcome of dispatching one node.
///
/// `error` is `None` on success, in which case `outputs` contains at least
/// an `output` key. On failure `outputs` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
  pub outputs: Outputs,
  pub error: Option<String>,
}

impl DispatchOutcome {
  fn success(outputs: Outputs) -> Self {
    Self {
      outputs,
      error: None,
    }
  }

  fn failure(error: impl Into<String>) -> Self {
    Self {
      outputs: Outputs::new(),
      error: Some(error.into()),
    }
  }

  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }
}

/// Routes nodes to processors by their `data.type` tag.
///
/// Never fails: unknown types, processor errors, panics, and cancellation
/// all become a failed [`DispatchOutcome`]. There are no retries.
#[derive(Clone)]
pub struct Dispatcher {
  registry: Arc<ProcessorRegistry>,
}

impl Dispatcher {
  pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
    Self { registry }
  }

  pub async fn dispatch(
    &self,
    node: &Node,
    inputs: &Inputs,
    ctx: &ProcessorContext,
  ) -> DispatchOutcome {
    let kind = node.kind();
    let Some(processor) = self.registry.get(kind) else {
      return DispatchOutcome::failure(format!(
        "no processor registered for node type '{kind}'"
      ));
    };

    if ctx.cancel.is_cancelled() {
      return DispatchOutcome::failure("execution cancelled");
    }

    let invocation = AssertUnwindSafe(processor.process(ctx, inputs)).catch_unwind();
    let result = tokio::select! {
      biased;
      _ = ctx.cancel.cancelled() => return DispatchOutcome::failure("execution cancelled"),
      result = invocation => result,
    };

    match result {
      Ok(Ok(outputs)) if outputs.contains_key("output") => DispatchOutcome::success(outputs),
      Ok(Ok(_)) => DispatchOutcome::failure(format!(
        "processor for node type '{kind}' returned no output"
      )),
      Ok(Err(error)) => DispatchOutcome::failure(error.to_string()),
      Err(panic) => {
        let message = panic_message(panic.as_ref());
        debug!(node_id = %node.id, panic = %message, "processor_panicked");
        DispatchOutcome::failure(format!("processor panicked: {message}"))
      }
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeforge_config::NodeData;
  use nodeforge_processor::ProcessorError;
  use serde_json::json;
  use tokio_util::sync::CancellationToken;

  fn registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register_fn("ok", |_| async {
      let mut outputs = Outputs::new();
      outputs.insert("output".to_string(), json!("done"));
      Ok(outputs)
    });
    registry.register_fn("fails", |_| async {
      Err(ProcessorError::failed("bad input"))
    });
    registry.register_fn("silent", |_| async { Ok(Outputs::new()) });
    registry.register_fn("panics", |_| async {
      if true {
        panic!("kaboom");
      }
      Ok(Outputs::new())
    });
    registry.register_fn("hangs", |_| async {
      futures::future::pending::<()>().await;
      Ok(Outputs::new())
    });
    registry
  }

  async fn dispatch(kind: &str, ctx: ProcessorContext) -> DispatchOutcome {
    let dispatcher = Dispatcher::new(Arc::new(registry()));
    let node = Node::new("n", NodeData::new(kind));
    dispatcher.dispatch(&node, &Inputs::new(), &ctx).await
  }

  #[tokio::test]
  async fn test_success() {
    let outcome = dispatch("ok", ProcessorContext::new("r", "n")).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.outputs["output"], json!("done"));
  }

  #[tokio::test]
  async fn test_processor_error_is_captured() {
    let outcome = dispatch("fails", ProcessorContext::new("r", "n")).await;
    assert_eq!(outcome.error.as_deref(), Some("bad input"));
    assert!(outcome.outputs.is_empty());
  }

  #[tokio::test]
  async fn test_unknown_type() {
    let outcome = dispatch("mystery", ProcessorContext::new("r", "n")).await;
    assert_eq!(
      outcome.error.as_deref(),
      Some("no processor registered for node type 'mystery'")
    );
  }

  #[tokio::test]
  async fn test_missing_output_key_fails() {
    let outcome = dispatch("silent", ProcessorContext::new("r", "n")).await;
    assert!(!outcome.is_success());
  }

  #[tokio::test]
  async fn test_panic_is_contained() {
    let outcome = dispatch("panics", ProcessorContext::new("r", "n")).await;
    assert_eq!(outcome.error.as_deref(), Some("processor panicked: kaboom"));
  }

  #[tokio::test]
  async fn test_cancellation_stops_waiting() {
    let cancel = CancellationToken::new();
    let ctx = ProcessorContext::new("r", "n").with_cancel(cancel.clone());
    let handle = tokio::spawn(dispatch("hangs", ctx));
    cancel.cancel();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.error.as_deref(), Some("execution cancelled"));
  }
}

//! Execution events and notifiers.
//!
//! Events let a caller watch a run as it happens, e.g. to drive a progress
//! view. The engine itself exposes no interim run status.

use nodeforge_config::ExecutionType;
use nodeforge_processor::Outputs;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::RunStatus;

/// Events emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The run passed structural checks and is about to execute nodes.
  RunStarted {
    run_id: String,
    execution_type: ExecutionType,
    node_ids: Vec<String>,
  },

  /// A node's dependencies are terminal and it is being dispatched.
  NodeStarted { run_id: String, node_id: String },

  NodeCompleted {
    run_id: String,
    node_id: String,
    outputs: Outputs,
  },

  NodeFailed {
    run_id: String,
    node_id: String,
    error: String,
  },

  /// Every requested node reached a terminal state.
  RunCompleted {
    run_id: String,
    status: RunStatus,
    duration: u64,
  },
}

/// Receives execution events.
///
/// Called from whichever task finished the node, so implementations must
/// not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a run; volume is a handful of
  // events per node.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

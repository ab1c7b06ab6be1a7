//! Shared state of a single run.
//!
//! The output cache is written once per node, by the node that just
//! finished, and read by every node depending on it. Each node also owns a
//! completion signal that flips to `true` exactly once; dependents await it
//! instead of polling.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nodeforge_processor::Outputs;
use tokio::sync::watch;

use crate::result::{NodeExecutionResult, NodeStatus};

/// Sending half of a node's completion signal.
///
/// Dropping it without calling [`CompletionSignal::complete`] also releases
/// waiters, so a node task that dies never deadlocks its dependents.
pub(crate) struct CompletionSignal(watch::Sender<bool>);

impl CompletionSignal {
  pub fn complete(self) {
    self.0.send_replace(true);
  }
}

#[derive(Default)]
struct Records {
  outputs: HashMap<String, Outputs>,
  statuses: HashMap<String, NodeStatus>,
  results: Vec<NodeExecutionResult>,
}

pub(crate) struct RunState {
  records: Mutex<Records>,
  signals: HashMap<String, watch::Receiver<bool>>,
}

impl RunState {
  /// Create the state for a run over `node_ids`, returning the completion
  /// signal of each node.
  pub fn new(node_ids: &[String]) -> (Self, HashMap<String, CompletionSignal>) {
    let mut signals = HashMap::with_capacity(node_ids.len());
    let mut senders = HashMap::with_capacity(node_ids.len());
    for id in node_ids {
      let (tx, rx) = watch::channel(false);
      signals.insert(id.clone(), rx);
      senders.insert(id.clone(), CompletionSignal(tx));
    }

    let state = Self {
      records: Mutex::new(Records::default()),
      signals,
    };
    (state, senders)
  }

  fn records(&self) -> MutexGuard<'_, Records> {
    self.records.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Wait until `node_id` reaches a terminal state. Returns immediately for
  /// nodes that are not part of the run.
  pub async fn wait_for(&self, node_id: &str) {
    let Some(receiver) = self.signals.get(node_id) else {
      return;
    };
    let mut receiver = receiver.clone();
    // An error means the signal was dropped; the node is terminal either way.
    let _ = receiver.wait_for(|done| *done).await;
  }

  pub fn status(&self, node_id: &str) -> Option<NodeStatus> {
    self.records().statuses.get(node_id).copied()
  }

  /// Run `f` against the outputs of every node that succeeded so far.
  pub fn with_outputs<R>(&self, f: impl FnOnce(&HashMap<String, Outputs>) -> R) -> R {
    f(&self.records().outputs)
  }

  /// Record a node's terminal result. Successful outputs become visible to
  /// later input resolution.
  pub fn record(&self, result: NodeExecutionResult) {
    let mut records = self.records();
    if let Some(outputs) = result.outputs.as_ref().filter(|_| result.is_success()) {
      records.outputs.insert(result.node_id.clone(), outputs.clone());
    }
    records.statuses.insert(result.node_id.clone(), result.status);
    records.results.push(result);
  }

  /// Take the recorded results, in completion order.
  pub fn take_results(&self) -> Vec<NodeExecutionResult> {
    std::mem::take(&mut self.records().results)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::time::Duration;

  use super::*;
  use nodeforge_processor::Inputs;
  use serde_json::json;

  fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
  }

  #[tokio::test]
  async fn test_waiter_released_on_completion() {
    let (state, mut signals) = RunState::new(&ids(&["a"]));
    let state = Arc::new(state);
    let signal = signals.remove("a").unwrap();

    let waiter = {
      let state = state.clone();
      tokio::spawn(async move {
        state.wait_for("a").await;
        state.status("a")
      })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    let mut outputs = Outputs::new();
    outputs.insert("output".to_string(), json!(1));
    state.record(NodeExecutionResult::success("a", Inputs::new(), outputs, 0));
    signal.complete();

    assert_eq!(waiter.await.unwrap(), Some(NodeStatus::Success));
    assert!(state.with_outputs(|o| o.contains_key("a")));
  }

  #[tokio::test]
  async fn test_dropped_signal_releases_waiters() {
    let (state, signals) = RunState::new(&ids(&["a"]));
    drop(signals);
    state.wait_for("a").await;
    assert_eq!(state.status("a"), None);
  }

  #[tokio::test]
  async fn test_unknown_node_does_not_block() {
    let (state, _signals) = RunState::new(&ids(&["a"]));
    state.wait_for("elsewhere").await;
  }

  #[test]
  fn test_failed_outputs_are_not_cached() {
    let (state, _signals) = RunState::new(&ids(&["a"]));
    state.record(NodeExecutionResult::failed("a", Inputs::new(), "x", 0));
    assert!(state.with_outputs(|o| o.is_empty()));
    assert_eq!(state.take_results().len(), 1);
    assert!(state.take_results().is_empty());
  }
}

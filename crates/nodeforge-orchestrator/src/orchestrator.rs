//! The execution orchestrator.

use std::sync::Arc;
use std::time::Instant;

use nodeforge_config::{Edge, ExecutionType, Node};
use nodeforge_processor::{ProcessorContext, ProcessorRegistry};
use nodeforge_workflow::Workflow;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::{DependencyFailurePolicy, MissingNodePolicy, OrchestratorConfig};
use crate::dispatch::Dispatcher;
use crate::error::OrchestratorError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::input::resolve_inputs;
use crate::result::{NodeExecutionResult, NodeStatus, WorkflowExecutionResult, determine_status};
use crate::state::{CompletionSignal, RunState};

/// Runs a chosen subset of a graph's nodes in dependency order.
///
/// Generic over `N: ExecutionNotifier`; use [`Orchestrator::new`] for an
/// orchestrator that discards events, or [`Orchestrator::with_notifier`] to
/// observe them.
pub struct Orchestrator<N: ExecutionNotifier = NoopNotifier> {
  dispatcher: Dispatcher,
  config: OrchestratorConfig,
  notifier: Arc<N>,
}

impl Orchestrator<NoopNotifier> {
  pub fn new(registry: ProcessorRegistry, config: OrchestratorConfig) -> Self {
    Self::with_notifier(registry, config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier + 'static> Orchestrator<N> {
  pub fn with_notifier(registry: ProcessorRegistry, config: OrchestratorConfig, notifier: N) -> Self {
    Self {
      dispatcher: Dispatcher::new(Arc::new(registry)),
      config,
      notifier: Arc::new(notifier),
    }
  }

  pub fn config(&self) -> &OrchestratorConfig {
    &self.config
  }

  /// Execute `target_node_ids` over a snapshot of `nodes` and `edges`.
  ///
  /// `mode` is carried into the result as metadata only; the nodes that run
  /// are always exactly the requested ones. Returns `Err` only for
  /// structural problems, in which case no node has executed.
  pub async fn execute(
    &self,
    nodes: &[Node],
    edges: &[Edge],
    target_node_ids: &[String],
    mode: ExecutionType,
  ) -> Result<WorkflowExecutionResult, OrchestratorError> {
    self
      .execute_with_cancel(nodes, edges, target_node_ids, mode, CancellationToken::new())
      .await
  }

  /// Like [`execute`](Self::execute), but nodes still pending or running
  /// when `cancel` fires are recorded as failed with `execution cancelled`.
  pub async fn execute_with_cancel(
    &self,
    nodes: &[Node],
    edges: &[Edge],
    target_node_ids: &[String],
    mode: ExecutionType,
    cancel: CancellationToken,
  ) -> Result<WorkflowExecutionResult, OrchestratorError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let workflow = Arc::new(Workflow::new(nodes.to_vec(), edges.to_vec())?);
    self
      .run(run_id, workflow, target_node_ids, mode, cancel)
      .await
  }

  #[instrument(
    name = "workflow_run",
    skip_all,
    fields(run_id = %run_id, mode = %mode)
  )]
  async fn run(
    &self,
    run_id: String,
    workflow: Arc<Workflow>,
    target_node_ids: &[String],
    mode: ExecutionType,
    cancel: CancellationToken,
  ) -> Result<WorkflowExecutionResult, OrchestratorError> {
    let started = Instant::now();

    let mut requested = Vec::with_capacity(target_node_ids.len());
    for id in target_node_ids {
      if workflow.contains(id) {
        requested.push(id.clone());
        continue;
      }
      match self.config.on_missing_node {
        MissingNodePolicy::Skip => warn!(run_id = %run_id, node_id = %id, "node_not_found"),
        MissingNodePolicy::Error => return Err(OrchestratorError::NodeNotFound(id.clone())),
      }
    }

    let order = workflow.graph().topological_order(&requested)?;
    let dependencies = dependency_lists(&workflow, &order);

    info!(
      run_id = %run_id,
      mode = %mode,
      node_count = order.len(),
      parallel = self.config.is_parallel(),
      "run_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      run_id: run_id.clone(),
      execution_type: mode,
      node_ids: order.clone(),
    });

    let (state, mut signals) = RunState::new(&order);
    let runner = NodeRunner {
      run_id: run_id.clone(),
      workflow,
      state: Arc::new(state),
      dispatcher: self.dispatcher.clone(),
      notifier: self.notifier.clone(),
      policy: self.config.on_dependency_failure,
      permits: self
        .config
        .is_parallel()
        .then(|| Arc::new(Semaphore::new(self.config.max_concurrency))),
      cancel,
    };

    let mut jobs = Vec::with_capacity(order.len());
    for (node_id, deps) in order.iter().zip(dependencies) {
      if let Some(signal) = signals.remove(node_id) {
        jobs.push((node_id.clone(), deps, signal));
      }
    }

    if runner.permits.is_some() {
      let mut tasks = JoinSet::new();
      for (node_id, deps, signal) in jobs {
        let runner = runner.clone();
        tasks.spawn(async move { runner.run_node(node_id, deps, signal).await });
      }
      while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
          error!(run_id = %run_id, error = %e, "node_task_aborted");
        }
      }
    } else {
      for (node_id, deps, signal) in jobs {
        runner.run_node(node_id, deps, signal).await;
      }
    }

    // A node task that died before recording leaves no result behind.
    for node_id in &order {
      if runner.state.status(node_id).is_none() {
        runner.record(
          NodeExecutionResult::failed(node_id.as_str(), Default::default(), "node task aborted", 0),
        );
      }
    }

    let node_results = runner.state.take_results();
    let status = determine_status(&node_results);
    let duration = elapsed_ms(started);

    info!(
      run_id = %run_id,
      status = %status,
      duration_ms = duration,
      "run_completed"
    );
    self.notifier.notify(ExecutionEvent::RunCompleted {
      run_id: run_id.clone(),
      status,
      duration,
    });

    Ok(WorkflowExecutionResult {
      run_id,
      execution_type: mode,
      status,
      duration,
      node_results,
      node_ids: target_node_ids.to_vec(),
    })
  }
}

/// For each node in `order`, its transitive dependencies within the run,
/// in run order. Paths through nodes outside the run count.
fn dependency_lists(workflow: &Workflow, order: &[String]) -> Vec<Vec<String>> {
  order
    .iter()
    .map(|node_id| workflow.graph().dependencies_within(node_id, order))
    .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
  u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Everything a node needs to execute, cloneable into a spawned task.
struct NodeRunner<N> {
  run_id: String,
  workflow: Arc<Workflow>,
  state: Arc<RunState>,
  dispatcher: Dispatcher,
  notifier: Arc<N>,
  policy: DependencyFailurePolicy,
  permits: Option<Arc<Semaphore>>,
  cancel: CancellationToken,
}

impl<N> Clone for NodeRunner<N> {
  fn clone(&self) -> Self {
    Self {
      run_id: self.run_id.clone(),
      workflow: self.workflow.clone(),
      state: self.state.clone(),
      dispatcher: self.dispatcher.clone(),
      notifier: self.notifier.clone(),
      policy: self.policy,
      permits: self.permits.clone(),
      cancel: self.cancel.clone(),
    }
  }
}

impl<N: ExecutionNotifier> NodeRunner<N> {
  /// Wait for dependencies, resolve inputs, dispatch, record, and signal.
  #[instrument(
    name = "node_execute",
    skip_all,
    fields(run_id = %self.run_id, node_id = %node_id)
  )]
  async fn run_node(&self, node_id: String, dependencies: Vec<String>, signal: CompletionSignal) {
    for dep in &dependencies {
      self.state.wait_for(dep).await;
    }

    let Some(node) = self.workflow.get_node(&node_id) else {
      signal.complete();
      return;
    };
    let inputs = self
      .state
      .with_outputs(|produced| resolve_inputs(&self.workflow, node, produced));

    if self.policy == DependencyFailurePolicy::FailDependents {
      let failed_dep = dependencies
        .iter()
        .find(|dep| self.state.status(dep) != Some(NodeStatus::Success));
      if let Some(dep) = failed_dep {
        let error = format!("upstream node '{dep}' failed");
        self.record(NodeExecutionResult::failed(node_id.as_str(), inputs, error, 0));
        signal.complete();
        return;
      }
    }

    let _permit = match &self.permits {
      Some(permits) => permits.acquire().await.ok(),
      None => None,
    };

    info!(run_id = %self.run_id, node_id = %node_id, node_type = %node.kind(), "node_started");
    self.notifier.notify(ExecutionEvent::NodeStarted {
      run_id: self.run_id.clone(),
      node_id: node_id.clone(),
    });

    let started = Instant::now();
    let ctx = ProcessorContext::new(self.run_id.as_str(), node_id.as_str())
      .with_cancel(self.cancel.clone());
    let outcome = self.dispatcher.dispatch(node, &inputs, &ctx).await;
    let duration = elapsed_ms(started);

    let result = match outcome.error {
      None => NodeExecutionResult::success(node_id.as_str(), inputs, outcome.outputs, duration),
      Some(error) => NodeExecutionResult::failed(node_id.as_str(), inputs, error, duration),
    };
    self.record(result);
    signal.complete();
  }

  /// Log, notify, and store a terminal result.
  fn record(&self, result: NodeExecutionResult) {
    match &result.error {
      None => {
        info!(
          run_id = %self.run_id,
          node_id = %result.node_id,
          duration_ms = result.duration,
          "node_completed"
        );
        self.notifier.notify(ExecutionEvent::NodeCompleted {
          run_id: self.run_id.clone(),
          node_id: result.node_id.clone(),
          outputs: result.outputs.clone().unwrap_or_default(),
        });
      }
      Some(error) => {
        error!(
          run_id = %self.run_id,
          node_id = %result.node_id,
          error = %error,
          "node_failed"
        );
        self.notifier.notify(ExecutionEvent::NodeFailed {
          run_id: self.run_id.clone(),
          node_id: result.node_id.clone(),
          error: error.clone(),
        });
      }
    }
    self.state.record(result);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use nodeforge_config::NodeData;

  fn node(id: &str) -> Node {
    Node::new(id, NodeData::new("noop"))
  }

  #[test]
  fn test_dependency_lists_are_transitive_and_run_scoped() {
    let workflow = Workflow::new(
      vec![node("a"), node("b"), node("c"), node("d")],
      vec![
        Edge::new("e1", "a", "b", "input"),
        Edge::new("e2", "b", "c", "input"),
        Edge::new("e3", "d", "c", "input"),
      ],
    )
    .unwrap();

    let order = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let deps = dependency_lists(&workflow, &order);
    assert!(deps[0].is_empty());
    assert_eq!(deps[1], vec!["a".to_string()]);
    assert_eq!(deps[2], vec!["a".to_string(), "b".to_string()]);
  }

  #[test]
  fn test_dependency_lists_follow_outside_nodes_and_skip_self() {
    let workflow = Workflow::new(
      vec![node("a"), node("x"), node("b")],
      vec![
        Edge::new("e1", "a", "x", "input"),
        Edge::new("e2", "x", "b", "input"),
        Edge::new("e3", "b", "x", "input"),
      ],
    )
    .unwrap();

    let order = vec!["a".to_string(), "b".to_string()];
    let deps = dependency_lists(&workflow, &order);
    assert!(deps[0].is_empty());
    assert_eq!(deps[1], vec!["a".to_string()]);
  }
}

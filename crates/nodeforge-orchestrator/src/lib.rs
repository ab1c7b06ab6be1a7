//! Nodeforge Orchestrator
//!
//! Drives one run over a chosen subset of a graph's nodes.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator::execute(nodes, edges, target_node_ids, mode)
//!   │
//!   ├── Workflow::new          snapshot + duplicate check
//!   ├── topological_order      cycle -> Err, nothing executes
//!   │
//!   └── per node, in order (or spawned when max_concurrency > 1)
//!         ├── await dependency signals
//!         ├── resolve_inputs   edges first, static data as fallback
//!         ├── Dispatcher       registry lookup, error/panic boundary
//!         └── RunState         record result, cache output, signal
//!   │
//!   └── determine_status -> WorkflowExecutionResult
//! ```
//!
//! Individual node failures never abort a run; only structural problems
//! (a cycle, duplicate node ids, or a missing node under the `error` policy)
//! are returned as `Err`.

mod config;
mod dispatch;
mod error;
mod events;
mod input;
mod orchestrator;
mod result;
mod state;

pub use config::{DependencyFailurePolicy, MissingNodePolicy, OrchestratorConfig};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::OrchestratorError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use input::{LIST_HANDLE, resolve_inputs};
pub use orchestrator::Orchestrator;
pub use result::{
  NodeExecutionResult, NodeStatus, RunStatus, WorkflowExecutionResult, determine_status,
};

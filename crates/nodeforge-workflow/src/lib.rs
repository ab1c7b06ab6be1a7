//! Nodeforge Workflow
//!
//! This crate provides the immutable snapshot of a graph that the engine
//! executes against. A snapshot is taken once per run so that edits made in
//! the editor while a run is in flight cannot change what the run sees.
//!
//! It also owns the graph algorithms:
//! - Transitive upstream dependencies of a node
//! - Topological ordering of an arbitrary subset of nodes (Kahn's algorithm)
//! - Cycle rejection when a new connection is made
//! - Advisory structural validation against the node-type catalog

mod error;
mod graph;
mod validate;
mod workflow;

pub use error::{ConnectionError, WorkflowError};
pub use graph::Graph;
pub use validate::{StructuralIssue, validate_structure};
pub use workflow::Workflow;

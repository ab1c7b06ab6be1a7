//! Nodeforge Config
//!
//! This crate contains the serializable graph types for nodeforge: nodes,
//! edges, and the static catalog of node types. These types represent a
//! workflow exactly as the editor saves it, before the engine takes a
//! snapshot of it for execution.
//!
//! Graphs can be loaded from:
//! - JSON files (via CLI with `nodeforge run workflow.json`)
//! - Database storage (as JSON blobs)
//!
//! The catalog is used for structural validation only. Execution never
//! consults it beyond dispatching on the node's type tag.

mod catalog;
mod edge;
mod enums;
mod node;
mod workflow;

pub use catalog::{ConnectionKind, HandleDefinition, NodeTypeDefinition, catalog, definition};
pub use edge::{DEFAULT_SOURCE_HANDLE, DEFAULT_TARGET_HANDLE, Edge};
pub use enums::ExecutionType;
pub use node::{Node, NodeData, NodeKind};
pub use workflow::WorkflowDef;

//! groundwork topology
//!
//! Assembles the fixed three-stack deployment as a declarative resource
//! graph: the shared network/data layer, the queue-driven worker, and the
//! web-facing container service. Composition is a single directed acyclic
//! instantiation: shared layer first, then the two composers over its
//! read-only outputs, with the web stack's application secret threaded into
//! the worker as a two-phase reference.

pub mod error;
pub mod graph;
pub mod network;
pub mod stacks;

// Re-exports
pub use error::{Result, TopologyError};
pub use graph::{GrantAccess, ResourceGraph};
pub use network::AccessMatrix;
pub use stacks::{SharedStack, Topology, WebStack, WorkerStack, synthesize};

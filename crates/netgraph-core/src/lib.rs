//! netgraph-core: the typed graph engine of a hardware design compiler.
//!
//! Designs are modeled as nodes (modules, interfaces, components) whose
//! relationships -- hierarchy, electrical connection, references -- are typed
//! edges between graph interfaces ("gifs"). Connected gifs form union-find
//! [`Graph`] clusters that merge as the design is wired up; traversal is a
//! path-filtered BFS over a cluster's adjacency.
//!
//! [`GraphStore`] owns all entities and is the single entry point for
//! mutation and query.

pub mod error;
pub mod gif;
pub mod graph;
pub mod id;
pub mod link;
pub mod node;
pub mod path;
pub mod type_id;

// Re-export commonly used types
pub use error::GraphError;
pub use gif::{GifKind, GraphInterface};
pub use graph::{Graph, GraphStore};
pub use id::{GifId, GraphId, LinkId, NodeId};
pub use link::{FilterResult, Link, LinkFilter, LinkKind};
pub use node::Node;
pub use path::Path;
pub use type_id::{TypeId, TypeRegistry};

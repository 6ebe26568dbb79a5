//! Stable ID newtypes for graph entities.
//!
//! All IDs are distinct newtype wrappers over `u32` indexing into the
//! [`GraphStore`](crate::graph::GraphStore) arenas. Type safety ensures a
//! `GifId` cannot be accidentally used where a `NodeId` is expected. IDs are
//! stable for the lifetime of the store; the original's weak back-references
//! become id lookups, so a dangling relation is a loud lookup failure instead
//! of silent corruption.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a [`GraphInterface`](crate::gif::GraphInterface) vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GifId(pub u32);

/// Identity of a [`Node`](crate::node::Node) domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Identity of a [`Link`](crate::link::Link) edge payload.
///
/// `LinkId` equality is link *identity*, not structural equality: removing an
/// edge and re-adding an equivalent link yields a different `LinkId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u32);

/// Identity of a union-find [`Graph`](crate::graph::Graph) cluster.
///
/// A `GraphId` stays allocated for the store's lifetime, but the cluster it
/// names is marked invalidated once merged away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub u32);

impl fmt::Display for GifId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

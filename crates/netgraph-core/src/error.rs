//! Core error types for netgraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants. All violations
//! are raised synchronously at the point of violation and propagate to the
//! calling compiler pass; nothing is retried internally. [`GraphError::LinkExists`]
//! is the one variant designed to be recoverable by calling code, which
//! decides the resolution policy (ignore / prefer-new / abort).

use thiserror::Error;

use crate::id::{GifId, GraphId, LinkId, NodeId};
use crate::link::{FilterResult, Link};

/// Errors produced by the netgraph-core graph engine.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Querying a link's endpoints before they were set.
    #[error("link endpoints are not set up")]
    NotSetUp,

    /// Re-targeting a link whose endpoints are already set.
    #[error("link is already setup")]
    AlreadySetUp,

    /// Connecting two interfaces that are already directly connected.
    ///
    /// Carries the pre-existing link's id and the attempted link so the
    /// caller can decide the resolution policy.
    #[error("edge already exists (existing link {existing})")]
    LinkExists {
        existing: LinkId,
        attempted: Box<Link>,
    },

    /// A link's endpoints do not satisfy its structural precondition.
    #[error("invalid relationship: {reason}")]
    InvalidRelationship { reason: String },

    /// Fan-out connect attempted with a non-cloneable link.
    #[error("link kind '{kind}' is not cloneable")]
    NotCloneable { kind: String },

    /// A conditional/derived link's predicate rejected the connection at
    /// construction time.
    #[error("connection rejected by link filter: {result:?}")]
    FilteredOut { result: FilterResult },

    /// A parent lookup against a node that has no parent edge yet.
    #[error("node {node} has no parent")]
    NoParent { node: NodeId },

    /// A reference interface without a pointer link to resolve through.
    #[error("reference interface {gif} is unbound")]
    Unbound { gif: GifId },

    /// Use of a graph cluster that was merged away.
    #[error("graph {graph} has been invalidated by a merge")]
    GraphInvalidated { graph: GraphId },

    /// An edge lookup failed (missing, or not the cached link instance).
    #[error("no such edge between {from} and {to}")]
    EdgeNotFound { from: GifId, to: GifId },

    /// Registering a type name that already exists in the registry.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },
}

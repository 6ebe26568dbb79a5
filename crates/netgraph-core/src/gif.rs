//! Graph interfaces: the addressable vertices of the engine.
//!
//! A [`GraphInterface`] ("gif") is a named endpoint that belongs to exactly
//! one [`Graph`](crate::graph::Graph) cluster at any instant and to at most
//! one owning [`Node`](crate::node::Node). Nodes allocate three gifs each
//! (`self`/`children`/`parent`); loose gifs (e.g. dynamically synthesized
//! reference endpoints) have no owner. The original's subclass hierarchy is
//! flattened into the closed [`GifKind`] enum.

use serde::{Deserialize, Serialize};

use crate::id::{GraphId, NodeId};

/// The role a graph interface plays, replacing the original's
/// `GraphInterfaceSelf` / `GraphInterfaceHierarchical` /
/// `GraphInterfaceReference` subclasses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GifKind {
    /// Plain connection endpoint (e.g. an electrical net join point).
    Plain,
    /// A node's identity anchor; target of `Pointer`/`Sibling` links.
    SelfGif,
    /// Hierarchy endpoint. `is_parent` gifs accept children; the others
    /// attach to a parent.
    Hierarchical { is_parent: bool },
    /// Non-owning pointer endpoint, resolved through a `Pointer` link.
    Reference,
}

impl GifKind {
    /// Is this a hierarchy endpoint?
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, GifKind::Hierarchical { .. })
    }

    /// Is this a node's `self` anchor?
    pub fn is_self(&self) -> bool {
        matches!(self, GifKind::SelfGif)
    }

    /// For hierarchical gifs: the parent-side flag. `None` otherwise.
    pub fn is_parent(&self) -> Option<bool> {
        match self {
            GifKind::Hierarchical { is_parent } => Some(*is_parent),
            _ => None,
        }
    }

    /// Short kind label, used in typed full-name rendering.
    pub fn name(&self) -> &'static str {
        match self {
            GifKind::Plain => "gif",
            GifKind::SelfGif => "self",
            GifKind::Hierarchical { is_parent: true } => "parent",
            GifKind::Hierarchical { is_parent: false } => "child",
            GifKind::Reference => "reference",
        }
    }
}

/// A vertex in the graph.
///
/// The owning node and the local name are settable exactly once; the owning
/// graph is reassigned whenever its cluster merges into a larger one. The
/// `ordinal` is a stable per-graph index (offset on merge so indices stay
/// unique), used as a deterministic ordering key.
#[derive(Debug, Clone)]
pub struct GraphInterface {
    pub(crate) kind: GifKind,
    pub(crate) node: Option<NodeId>,
    pub(crate) name: Option<String>,
    pub(crate) graph: GraphId,
    pub(crate) ordinal: usize,
}

impl GraphInterface {
    pub(crate) fn new(kind: GifKind, graph: GraphId) -> Self {
        GraphInterface {
            kind,
            node: None,
            name: None,
            graph,
            ordinal: 0,
        }
    }

    /// The role of this interface.
    pub fn kind(&self) -> GifKind {
        self.kind
    }

    /// The owning node, if set.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// The local name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The cluster this interface currently belongs to.
    pub fn graph(&self) -> GraphId {
        self.graph
    }

    /// Stable per-graph index, unique within the current cluster.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_predicates() {
        assert!(GifKind::SelfGif.is_self());
        assert!(!GifKind::Plain.is_self());
        assert!(GifKind::Hierarchical { is_parent: true }.is_hierarchical());
        assert_eq!(
            GifKind::Hierarchical { is_parent: false }.is_parent(),
            Some(false)
        );
        assert_eq!(GifKind::Reference.is_parent(), None);
    }

    #[test]
    fn fresh_gif_has_no_owner_or_name() {
        let gif = GraphInterface::new(GifKind::Plain, crate::id::GraphId(0));
        assert_eq!(gif.node(), None);
        assert_eq!(gif.name(), None);
        assert_eq!(gif.ordinal(), 0);
    }
}

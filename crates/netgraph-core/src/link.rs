//! Typed edges between graph interfaces.
//!
//! A [`Link`] is an edge payload: a closed set of variants ([`LinkKind`]),
//! each with its own validation enforced at connection time, plus the setup
//! discipline shared by all variants (endpoints are both unset or both set).
//! Conditional variants carry path-aware admission predicates evaluated with
//! three-valued logic ([`FilterResult`]); derived links compose the predicates
//! of every conditional link found along a [`Path`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::gif::GifKind;
use crate::graph::GraphStore;
use crate::id::GifId;
use crate::path::Path;

/// Outcome of a path-aware admission predicate.
///
/// `Pass` admits the connection. `FailRecoverable` tells the caller (a
/// trait-resolution pass) that a different candidate path might still work;
/// `FailUnrecoverable` tells it no alternative path should be tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterResult {
    Pass,
    FailRecoverable,
    FailUnrecoverable,
}

/// A path-aware admission predicate carried by conditional links.
pub type LinkFilter = Arc<dyn Fn(&GraphStore, &Path) -> FilterResult + Send + Sync>;

/// The closed set of link variants.
pub enum LinkKind {
    /// Plain, order-insensitive connection (e.g. an electrical net join).
    Direct,
    /// Hierarchy edge between two hierarchical gifs, exactly one parent-side.
    Parent,
    /// Hierarchy edge additionally carrying the child's name for dotted
    /// addressing.
    NamedParent { name: String },
    /// Non-owning edge from an arbitrary gif to a node's `self` gif.
    Pointer,
    /// Pointer wiring a node's own `children`/`parent` gifs back to its
    /// `self` gif.
    Sibling,
    /// Direct connection guarded by an admission predicate. Only predicates
    /// that look at the first hop of a candidate path are supported.
    DirectConditional {
        filter: LinkFilter,
        needs_only_first_in_path: bool,
    },
    /// Connection synthesized from a path, composing the predicates of every
    /// conditional link along it.
    DirectDerived {
        filters: Vec<LinkFilter>,
        needs_only_first_in_path: bool,
    },
}

impl fmt::Debug for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Direct => write!(f, "Direct"),
            LinkKind::Parent => write!(f, "Parent"),
            LinkKind::NamedParent { name } => write!(f, "NamedParent({name:?})"),
            LinkKind::Pointer => write!(f, "Pointer"),
            LinkKind::Sibling => write!(f, "Sibling"),
            LinkKind::DirectConditional { .. } => write!(f, "DirectConditional"),
            LinkKind::DirectDerived { filters, .. } => {
                write!(f, "DirectDerived({} filters)", filters.len())
            }
        }
    }
}

/// A typed edge. Endpoints are unset until the link is connected; querying
/// them before setup is [`GraphError::NotSetUp`], re-targeting afterwards is
/// [`GraphError::AlreadySetUp`].
#[derive(Debug)]
pub struct Link {
    kind: LinkKind,
    endpoints: Option<(GifId, GifId)>,
}

impl Link {
    fn detached(kind: LinkKind) -> Self {
        Link {
            kind,
            endpoints: None,
        }
    }

    /// A plain direct link.
    pub fn direct() -> Self {
        Link::detached(LinkKind::Direct)
    }

    /// An unnamed hierarchy link.
    pub fn parent() -> Self {
        Link::detached(LinkKind::Parent)
    }

    /// A hierarchy link carrying the child's name.
    pub fn named_parent(name: impl Into<String>) -> Self {
        Link::detached(LinkKind::NamedParent { name: name.into() })
    }

    /// A non-owning pointer to a node's `self` gif.
    pub fn pointer() -> Self {
        Link::detached(LinkKind::Pointer)
    }

    /// Internal self-wiring pointer of a node.
    pub fn sibling() -> Self {
        Link::detached(LinkKind::Sibling)
    }

    /// A direct link guarded by `filter`.
    ///
    /// Predicates that need more than the first hop of a candidate path to
    /// decide admission are not supported: `needs_only_first_in_path = false`
    /// fails immediately.
    pub fn direct_conditional(
        filter: LinkFilter,
        needs_only_first_in_path: bool,
    ) -> Result<Self, GraphError> {
        if !needs_only_first_in_path {
            return Err(GraphError::InvalidRelationship {
                reason: "conditional links that need more than the first hop of a path \
                         are not supported"
                    .to_string(),
            });
        }
        Ok(Link::detached(LinkKind::DirectConditional {
            filter,
            needs_only_first_in_path,
        }))
    }

    /// Builds a derived link from `path`, composing the filters of every
    /// conditional link along it.
    ///
    /// Walks every edge of the path; each edge must be an existing connection
    /// in the store ([`GraphError::EdgeNotFound`] otherwise). Conditional
    /// links contribute their filter; derived links contribute their already
    /// composed filter set; other variants contribute nothing.
    pub fn direct_derived(store: &GraphStore, path: &Path) -> Result<Self, GraphError> {
        let mut filters: Vec<LinkFilter> = Vec::new();
        let mut needs_only_first = true;

        for (from, to) in path.edges() {
            let lid = store
                .is_connected(from, to)
                .ok_or(GraphError::EdgeNotFound { from, to })?;
            match &store.link(lid).kind {
                LinkKind::DirectConditional {
                    filter,
                    needs_only_first_in_path,
                } => {
                    filters.push(Arc::clone(filter));
                    needs_only_first &= needs_only_first_in_path;
                }
                LinkKind::DirectDerived {
                    filters: sub,
                    needs_only_first_in_path,
                } => {
                    filters.extend(sub.iter().map(Arc::clone));
                    needs_only_first &= needs_only_first_in_path;
                }
                _ => {}
            }
        }

        Ok(Link::detached(LinkKind::DirectDerived {
            filters,
            needs_only_first_in_path: needs_only_first,
        }))
    }

    /// The variant of this link.
    pub fn kind(&self) -> &LinkKind {
        &self.kind
    }

    /// Short variant name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LinkKind::Direct => "Direct",
            LinkKind::Parent => "Parent",
            LinkKind::NamedParent { .. } => "NamedParent",
            LinkKind::Pointer => "Pointer",
            LinkKind::Sibling => "Sibling",
            LinkKind::DirectConditional { .. } => "DirectConditional",
            LinkKind::DirectDerived { .. } => "DirectDerived",
        }
    }

    /// Have the endpoints been set?
    pub fn is_setup(&self) -> bool {
        self.endpoints.is_some()
    }

    /// The `(from, to)` endpoints.
    pub fn connections(&self) -> Result<(GifId, GifId), GraphError> {
        self.endpoints.ok_or(GraphError::NotSetUp)
    }

    /// Every variant except `DirectDerived` can be fanned out to several
    /// targets; a derived link is bound to the one path it was built from.
    pub fn is_cloneable(&self) -> bool {
        !matches!(self.kind, LinkKind::DirectDerived { .. })
    }

    /// A detached (not set up) copy of this link, for fan-out connect.
    pub fn clone_link(&self) -> Result<Link, GraphError> {
        let kind = match &self.kind {
            LinkKind::Direct => LinkKind::Direct,
            LinkKind::Parent => LinkKind::Parent,
            LinkKind::NamedParent { name } => LinkKind::NamedParent { name: name.clone() },
            LinkKind::Pointer => LinkKind::Pointer,
            LinkKind::Sibling => LinkKind::Sibling,
            LinkKind::DirectConditional {
                filter,
                needs_only_first_in_path,
            } => LinkKind::DirectConditional {
                filter: Arc::clone(filter),
                needs_only_first_in_path: *needs_only_first_in_path,
            },
            LinkKind::DirectDerived { .. } => {
                return Err(GraphError::NotCloneable {
                    kind: self.kind_name().to_string(),
                })
            }
        };
        Ok(Link::detached(kind))
    }

    /// Evaluates this link's admission predicate against a candidate path.
    ///
    /// Composition is three-valued: `Pass` iff all sub-filters pass; any
    /// unrecoverable failure dominates; otherwise a recoverable failure is
    /// reported. Unconditional variants always pass.
    pub fn evaluate_filter(&self, store: &GraphStore, path: &Path) -> FilterResult {
        match &self.kind {
            LinkKind::DirectConditional { filter, .. } => filter(store, path),
            LinkKind::DirectDerived { filters, .. } => {
                let mut any_recoverable = false;
                for filter in filters {
                    match filter(store, path) {
                        FilterResult::Pass => {}
                        FilterResult::FailRecoverable => any_recoverable = true,
                        FilterResult::FailUnrecoverable => {
                            return FilterResult::FailUnrecoverable
                        }
                    }
                }
                if any_recoverable {
                    FilterResult::FailRecoverable
                } else {
                    FilterResult::Pass
                }
            }
            _ => FilterResult::Pass,
        }
    }

    /// Validates and sets the endpoints. This is where each variant's
    /// structural invariant is enforced, fail-fast at connection time.
    pub(crate) fn set_connections(
        &mut self,
        store: &GraphStore,
        from: GifId,
        to: GifId,
    ) -> Result<(), GraphError> {
        if self.is_setup() {
            return Err(GraphError::AlreadySetUp);
        }

        let from_kind = store.gif(from).kind();
        let to_kind = store.gif(to).kind();

        let (from, to) = match &self.kind {
            LinkKind::Parent | LinkKind::NamedParent { .. } => {
                let (fp, tp) = match (from_kind.is_parent(), to_kind.is_parent()) {
                    (Some(fp), Some(tp)) => (fp, tp),
                    _ => {
                        return Err(GraphError::InvalidRelationship {
                            reason: "parent links require hierarchical interfaces on both ends"
                                .to_string(),
                        })
                    }
                };
                if fp == tp {
                    return Err(GraphError::InvalidRelationship {
                        reason: "invalid parent-child relationship: exactly one end must be \
                                 the parent side"
                            .to_string(),
                    });
                }
                // A child interface holds at most one parent edge.
                let child_gif = if fp { to } else { from };
                if let Some(neighbors) = store.adjacency(child_gif) {
                    for (_, &lid) in neighbors {
                        if matches!(
                            store.link(lid).kind(),
                            LinkKind::Parent | LinkKind::NamedParent { .. }
                        ) {
                            return Err(GraphError::InvalidRelationship {
                                reason: "child interface already has a parent".to_string(),
                            });
                        }
                    }
                }
                (from, to)
            }
            LinkKind::Pointer | LinkKind::Sibling => {
                // Normalize so the pointee (a self gif) lands in the `to` slot.
                if to_kind.is_self() {
                    (from, to)
                } else if from_kind.is_self() {
                    (to, from)
                } else {
                    return Err(GraphError::InvalidRelationship {
                        reason: "pointer links require a self interface on one end".to_string(),
                    });
                }
            }
            LinkKind::DirectConditional { .. } | LinkKind::DirectDerived { .. } => {
                let candidate =
                    Path::from_gifs([from, to]).ok_or(GraphError::NotSetUp)?;
                match self.evaluate_filter(store, &candidate) {
                    FilterResult::Pass => {}
                    result => return Err(GraphError::FilteredOut { result }),
                }
                (from, to)
            }
            LinkKind::Direct => (from, to),
        };

        self.endpoints = Some((from, to));
        Ok(())
    }
}

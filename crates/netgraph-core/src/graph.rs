//! The union-find graph container and the store that owns it.
//!
//! [`GraphStore`] is the single entry point for constructing and querying the
//! object model: it owns the arenas for gifs, nodes, links, and [`Graph`]
//! clusters, and every mutation goes through its methods. Each fresh gif
//! starts in its own singleton cluster; adding an edge between gifs in
//! different clusters merges them (union-by-size). A cluster is never split;
//! once merged away it is invalidated and any further use is an error.
//!
//! The engine is single-threaded by design: no locks guard mutation, and a
//! merge rewrites shared structures non-atomically. Merges are not
//! transactional -- a merge that completed before a later failure (e.g. a
//! duplicate-edge check) is not rolled back.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::error::GraphError;
use crate::gif::{GifKind, GraphInterface};
use crate::id::{GifId, GraphId, LinkId, NodeId};
use crate::link::{Link, LinkKind};
use crate::node::Node;
use crate::path::Path;
use crate::type_id::{TypeId, TypeRegistry};

/// One connected cluster of gifs and their links.
///
/// Maintains the ordered edge list plus two adjacency caches: the full cache
/// (vertex -> {neighbor -> link}) for O(1) link lookup and the simple cache
/// (vertex -> neighbor set) for fast existence checks.
#[derive(Debug, Default)]
pub struct Graph {
    vertices: IndexSet<GifId>,
    edges: Vec<(GifId, GifId, LinkId)>,
    full_cache: HashMap<GifId, IndexMap<GifId, LinkId>>,
    simple_cache: HashMap<GifId, HashSet<GifId>>,
    invalidated: bool,
}

impl Graph {
    /// Number of vertices in the cluster.
    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges in the cluster.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The vertices, in insertion order.
    pub fn gifs(&self) -> &IndexSet<GifId> {
        &self.vertices
    }

    /// The ordered `(from, to, link)` edge list.
    pub fn all_edges(&self) -> &[(GifId, GifId, LinkId)] {
        &self.edges
    }

    /// Has this cluster been merged away?
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }
}

/// Arena-owning store for the whole object model.
///
/// All weak relationships of the original (gif -> node, link -> endpoints,
/// gif -> graph) are id lookups into these arenas, so a stale relation is a
/// loud failure rather than silent corruption. Ids are handed out by the
/// store and stay valid for its lifetime.
pub struct GraphStore {
    pub(crate) gifs: Vec<GraphInterface>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) graphs: Vec<Graph>,
    registry: TypeRegistry,
}

impl GraphStore {
    /// An empty store with a default type registry.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::new())
    }

    /// An empty store using the given type registry for capability checks.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        GraphStore {
            gifs: Vec::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            graphs: Vec::new(),
            registry,
        }
    }

    /// The type registry used for `isinstance` and capability checks.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Mutable access to the registry (type registration happens up front,
    /// before compiler passes run).
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    // -----------------------------------------------------------------------
    // Gif surface
    // -----------------------------------------------------------------------

    /// Allocates a fresh gif in its own singleton cluster.
    pub fn add_gif(&mut self, kind: GifKind) -> GifId {
        let graph_id = GraphId(self.graphs.len() as u32);
        let gif_id = GifId(self.gifs.len() as u32);

        let mut graph = Graph::default();
        graph.vertices.insert(gif_id);
        self.graphs.push(graph);
        self.gifs.push(GraphInterface::new(kind, graph_id));
        gif_id
    }

    /// Read access to a gif.
    pub fn gif(&self, gif: GifId) -> &GraphInterface {
        &self.gifs[gif.0 as usize]
    }

    /// Sets a gif's owning node. Settable exactly once.
    pub fn set_gif_node(&mut self, gif: GifId, node: NodeId) -> Result<(), GraphError> {
        let slot = &mut self.gifs[gif.0 as usize];
        if slot.node.is_some() {
            return Err(GraphError::AlreadySetUp);
        }
        slot.node = Some(node);
        Ok(())
    }

    /// Sets a gif's local name. Settable exactly once.
    pub fn set_gif_name(&mut self, gif: GifId, name: impl Into<String>) -> Result<(), GraphError> {
        let slot = &mut self.gifs[gif.0 as usize];
        if slot.name.is_some() {
            return Err(GraphError::AlreadySetUp);
        }
        slot.name = Some(name.into());
        Ok(())
    }

    /// The cluster a gif currently belongs to.
    pub fn graph_of(&self, gif: GifId) -> GraphId {
        self.gifs[gif.0 as usize].graph
    }

    /// Dotted address of a gif: its owning node's full name plus the gif's
    /// local name, optionally suffixed with the gif's kind.
    pub fn gif_full_name(&self, gif: GifId, types: bool) -> String {
        let slot = &self.gifs[gif.0 as usize];
        let name = match &slot.name {
            Some(n) => n.clone(),
            None => format!("<gif {gif}>"),
        };
        let mut out = match slot.node {
            Some(node) => format!("{}.{}", self.get_full_name(node, types), name),
            None => name,
        };
        if types {
            out.push('|');
            out.push_str(slot.kind.name());
        }
        out
    }

    // -----------------------------------------------------------------------
    // Cluster access
    // -----------------------------------------------------------------------

    /// Read access to a cluster. Using a cluster that was merged away is a
    /// programming error and reported as [`GraphError::GraphInvalidated`].
    pub fn graph(&self, graph: GraphId) -> Result<&Graph, GraphError> {
        let g = &self.graphs[graph.0 as usize];
        if g.invalidated {
            return Err(GraphError::GraphInvalidated { graph });
        }
        Ok(g)
    }

    /// Joins two clusters, returning the survivor.
    ///
    /// Union-by-size: the smaller cluster's vertices are reassigned to the
    /// larger one, with their ordinals offset by the target's vertex count so
    /// indices stay unique. The source cluster is invalidated. Not
    /// transactional: a completed merge is never rolled back.
    pub fn merge_graphs(&mut self, g1: GraphId, g2: GraphId) -> Result<GraphId, GraphError> {
        if self.graphs[g1.0 as usize].invalidated {
            return Err(GraphError::GraphInvalidated { graph: g1 });
        }
        if g1 == g2 {
            return Ok(g1);
        }
        if self.graphs[g2.0 as usize].invalidated {
            return Err(GraphError::GraphInvalidated { graph: g2 });
        }

        let s1 = self.graphs[g1.0 as usize].vertices.len();
        let s2 = self.graphs[g2.0 as usize].vertices.len();
        let (target, source) = if s1 >= s2 { (g1, g2) } else { (g2, g1) };

        let offset = self.graphs[target.0 as usize].vertices.len();
        let src = std::mem::take(&mut self.graphs[source.0 as usize]);
        self.graphs[source.0 as usize].invalidated = true;

        for &v in &src.vertices {
            let gif = &mut self.gifs[v.0 as usize];
            gif.graph = target;
            gif.ordinal += offset;
        }

        let tgt = &mut self.graphs[target.0 as usize];
        for v in src.vertices {
            tgt.vertices.insert(v);
        }
        for (k, m) in src.full_cache {
            tgt.full_cache.entry(k).or_default().extend(m);
        }
        for (k, s) in src.simple_cache {
            tgt.simple_cache.entry(k).or_default().extend(s);
        }
        tgt.edges.extend(src.edges);

        debug!(source = %source, target = %target, vertices = tgt.vertices.len(), "merged graphs");
        Ok(target)
    }

    // -----------------------------------------------------------------------
    // Edge surface
    // -----------------------------------------------------------------------

    /// Inserts a setup link as an edge, merging the endpoint clusters first.
    ///
    /// An existing edge between the endpoints is never silently replaced:
    /// [`GraphError::LinkExists`] carries both the pre-existing link id and
    /// the attempted link so the caller decides the resolution policy. Note
    /// the merge is not undone in that case.
    pub fn add_edge(&mut self, link: Link) -> Result<LinkId, GraphError> {
        let (from, to) = link.connections()?;

        let ga = self.graph_of(from);
        let gb = self.graph_of(to);
        let target = self.merge_graphs(ga, gb)?;

        if let Some(&existing) = self.graphs[target.0 as usize]
            .full_cache
            .get(&from)
            .and_then(|m| m.get(&to))
        {
            return Err(GraphError::LinkExists {
                existing,
                attempted: Box::new(link),
            });
        }

        let lid = LinkId(self.links.len() as u32);
        self.links.push(link);

        let g = &mut self.graphs[target.0 as usize];
        g.full_cache.entry(from).or_default().insert(to, lid);
        g.full_cache.entry(to).or_default().insert(from, lid);
        g.simple_cache.entry(from).or_default().insert(to);
        g.simple_cache.entry(to).or_default().insert(from);
        g.edges.push((from, to, lid));
        Ok(lid)
    }

    /// Removes an edge by link identity.
    ///
    /// The endpoints must share one cluster and the cached edge must be
    /// exactly this link instance, not a structural equal. Vertices left
    /// with empty adjacency are retained, never pruned.
    pub fn remove_edge(&mut self, link: LinkId) -> Result<(), GraphError> {
        let (from, to) = self.links[link.0 as usize].connections()?;
        let gid = self.graph_of(from);
        if gid != self.graph_of(to) {
            return Err(GraphError::EdgeNotFound { from, to });
        }

        let g = &mut self.graphs[gid.0 as usize];
        match g.full_cache.get(&from).and_then(|m| m.get(&to)) {
            Some(&cached) if cached == link => {}
            _ => return Err(GraphError::EdgeNotFound { from, to }),
        }

        if let Some(m) = g.full_cache.get_mut(&from) {
            m.shift_remove(&to);
        }
        if let Some(m) = g.full_cache.get_mut(&to) {
            m.shift_remove(&from);
        }
        if let Some(s) = g.simple_cache.get_mut(&from) {
            s.remove(&to);
        }
        if let Some(s) = g.simple_cache.get_mut(&to) {
            s.remove(&from);
        }
        g.edges.retain(|(_, _, l)| *l != link);
        Ok(())
    }

    /// Read access to a link payload.
    pub fn link(&self, link: LinkId) -> &Link {
        &self.links[link.0 as usize]
    }

    // -----------------------------------------------------------------------
    // Connect surface
    // -----------------------------------------------------------------------

    /// Connects two gifs with a plain direct link.
    pub fn connect(&mut self, a: GifId, b: GifId) -> Result<LinkId, GraphError> {
        self.connect_with(a, b, Link::direct())
    }

    /// Connects two gifs with the given link, validating the link's
    /// structural invariant first. Fails with [`GraphError::AlreadySetUp`]
    /// if the link was already connected elsewhere.
    pub fn connect_with(&mut self, a: GifId, b: GifId, mut link: Link) -> Result<LinkId, GraphError> {
        link.set_connections(&*self, a, b)?;
        debug!(from = %a, to = %b, kind = link.kind_name(), "gif connection");
        self.add_edge(link)
    }

    /// Fans one gif out to several peers with the same link descriptor,
    /// cloning the link per target. Fails with [`GraphError::NotCloneable`]
    /// before any edge is added if the variant cannot be cloned.
    pub fn connect_many(
        &mut self,
        a: GifId,
        others: &[GifId],
        link: Link,
    ) -> Result<Vec<LinkId>, GraphError> {
        if others.len() > 1 && !link.is_cloneable() {
            return Err(GraphError::NotCloneable {
                kind: link.kind_name().to_string(),
            });
        }

        let mut out = Vec::with_capacity(others.len());
        let n = others.len();
        for &other in &others[..n.saturating_sub(1)] {
            let l = link.clone_link()?;
            out.push(self.connect_with(a, other, l)?);
        }
        if let Some(&last) = others.last() {
            out.push(self.connect_with(a, last, link)?);
        }
        Ok(out)
    }

    /// Borrowed adjacency of a gif, for internal iteration without cloning.
    pub(crate) fn adjacency(&self, gif: GifId) -> Option<&IndexMap<GifId, LinkId>> {
        let gid = self.graph_of(gif);
        self.graphs[gid.0 as usize].full_cache.get(&gif)
    }

    /// O(1) adjacency lookup: the link directly connecting `a` and `b`.
    pub fn is_connected(&self, a: GifId, b: GifId) -> Option<LinkId> {
        let ga = self.graph_of(a);
        if ga != self.graph_of(b) {
            return None;
        }
        self.graphs[ga.0 as usize]
            .full_cache
            .get(&a)?
            .get(&b)
            .copied()
    }

    /// The direct neighbors of a gif.
    pub fn get_gif_edges(&self, gif: GifId) -> HashSet<GifId> {
        let gid = self.graph_of(gif);
        self.graphs[gid.0 as usize]
            .simple_cache
            .get(&gif)
            .cloned()
            .unwrap_or_default()
    }

    /// The neighbor -> link adjacency of a gif.
    pub fn get_edges(&self, gif: GifId) -> IndexMap<GifId, LinkId> {
        let gid = self.graph_of(gif);
        self.graphs[gid.0 as usize]
            .full_cache
            .get(&gif)
            .cloned()
            .unwrap_or_default()
    }

    /// The distinct owning nodes of `gif`'s direct-link neighbors, filtered
    /// by type (an empty filter accepts everything).
    pub fn get_connected_nodes(&self, gif: GifId, types: &[TypeId]) -> Vec<NodeId> {
        let gid = self.graph_of(gif);
        let mut out: IndexSet<NodeId> = IndexSet::new();
        if let Some(neighbors) = self.graphs[gid.0 as usize].full_cache.get(&gif) {
            for (&nbr, &lid) in neighbors {
                let direct = matches!(
                    self.links[lid.0 as usize].kind(),
                    LinkKind::Direct
                        | LinkKind::DirectConditional { .. }
                        | LinkKind::DirectDerived { .. }
                );
                if !direct {
                    continue;
                }
                let Some(node) = self.gifs[nbr.0 as usize].node else {
                    continue;
                };
                if types.is_empty() || self.isinstance(node, types) {
                    out.insert(node);
                }
            }
        }
        out.into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Reference resolution
    // -----------------------------------------------------------------------

    /// Resolves a reference gif to the `self` gif it points at, through its
    /// pointer link. [`GraphError::Unbound`] if no pointer link exists yet.
    pub fn get_referenced_gif(&self, gif: GifId) -> Result<GifId, GraphError> {
        if self.gifs[gif.0 as usize].kind != GifKind::Reference {
            return Err(GraphError::InvalidRelationship {
                reason: format!("gif {gif} is not a reference interface"),
            });
        }
        let gid = self.graph_of(gif);
        if let Some(neighbors) = self.graphs[gid.0 as usize].full_cache.get(&gif) {
            for (&nbr, &lid) in neighbors {
                let pointer = matches!(
                    self.links[lid.0 as usize].kind(),
                    LinkKind::Pointer | LinkKind::Sibling
                );
                if pointer && self.gifs[nbr.0 as usize].kind.is_self() {
                    return Ok(nbr);
                }
            }
        }
        Err(GraphError::Unbound { gif })
    }

    /// Resolves a reference gif to the node it points at.
    pub fn get_reference(&self, gif: GifId) -> Result<NodeId, GraphError> {
        let referenced = self.get_referenced_gif(gif)?;
        self.gifs[referenced.0 as usize]
            .node
            .ok_or(GraphError::Unbound { gif })
    }

    // -----------------------------------------------------------------------
    // Algorithms
    // -----------------------------------------------------------------------

    /// Generic path-filtered breadth-first search.
    ///
    /// The frontier is a queue of [`Path`]s, not bare vertices: for each
    /// neighbor of a path's last vertex the extended path is offered to
    /// `filter` together with the traversed link; acceptance marks the
    /// neighbor visited, includes it in the result and enqueues the extended
    /// path. The visited set keeps cycles from causing non-termination.
    pub fn bfs_visit<F>(&self, mut filter: F, start: &[GifId]) -> IndexSet<GifId>
    where
        F: FnMut(&Path, LinkId) -> bool,
    {
        let mut result = IndexSet::new();
        let Some(start_path) = Path::from_gifs(start.iter().copied()) else {
            return result;
        };

        let mut visited: HashSet<GifId> = start.iter().copied().collect();
        let mut queue: VecDeque<Path> = VecDeque::new();
        queue.push_back(start_path);

        while let Some(path) = queue.pop_front() {
            let last = path.last();
            let gid = self.graph_of(last);
            let Some(neighbors) = self.graphs[gid.0 as usize].full_cache.get(&last) else {
                continue;
            };
            for (&nbr, &lid) in neighbors {
                if visited.contains(&nbr) {
                    continue;
                }
                let extended = path.extended(nbr);
                if filter(&extended, lid) {
                    visited.insert(nbr);
                    result.insert(nbr);
                    trace!(gif = %nbr, depth = extended.len(), "bfs accept");
                    queue.push_back(extended);
                }
            }
        }
        result
    }

    /// The owning nodes of every `self`-kind gif in a cluster -- the primary
    /// export surface to downstream compiler passes.
    pub fn node_projection(&self, graph: GraphId) -> Result<IndexSet<NodeId>, GraphError> {
        let g = self.graph(graph)?;
        let mut out = IndexSet::new();
        for &v in &g.vertices {
            let gif = &self.gifs[v.0 as usize];
            if gif.kind.is_self() {
                if let Some(node) = gif.node {
                    out.insert(node);
                }
            }
        }
        Ok(out)
    }

    /// Projected nodes of a cluster whose full names appear in `names`.
    pub fn nodes_by_names(
        &self,
        graph: GraphId,
        names: &HashSet<String>,
    ) -> Result<Vec<(NodeId, String)>, GraphError> {
        let mut out = Vec::new();
        for node in self.node_projection(graph)? {
            let full = self.get_full_name(node, false);
            if names.contains(&full) {
                out.push((node, full));
            }
        }
        Ok(out)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

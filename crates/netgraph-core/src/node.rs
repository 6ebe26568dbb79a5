//! Nodes: the typed design entities layered over the gif graph.
//!
//! A [`Node`] owns three gifs wired together at construction: `self` (the
//! identity anchor), `children` (parent-side hierarchy endpoint) and `parent`
//! (child-side hierarchy endpoint). Hierarchy, naming and traversal are all
//! expressed through edges between these gifs, so the node layer is a thin
//! projection over [`GraphStore`](crate::graph::GraphStore) queries.
//!
//! Names are not stored on nodes: a node's name is the label of the hierarchy
//! edge attaching it to its parent, and full names are assembled by walking
//! that chain up to a naming root.

use indexmap::IndexSet;
use std::collections::VecDeque;
use tracing::debug;

use crate::error::GraphError;
use crate::gif::GifKind;
use crate::graph::GraphStore;
use crate::id::{GifId, GraphId, LinkId, NodeId};
use crate::link::{Link, LinkKind};
use crate::path::Path;
use crate::type_id::TypeId;

/// A design entity: three wired gifs plus naming metadata.
///
/// The engine never interprets node payloads; `type_id` exists only so
/// hierarchy queries can filter by registered type.
#[derive(Debug)]
pub struct Node {
    pub(crate) self_gif: GifId,
    pub(crate) children_gif: GifId,
    pub(crate) parent_gif: GifId,
    pub(crate) type_id: Option<TypeId>,
    /// Marks a naming root: descendants' full names start below this node.
    pub(crate) no_include_parents_in_full_name: bool,
    /// Display name for an unparented root, used instead of the `*{id}`
    /// fallback.
    pub(crate) root_name: Option<String>,
}

impl Node {
    /// The node's identity anchor gif.
    pub fn self_gif(&self) -> GifId {
        self.self_gif
    }

    /// The parent-side hierarchy gif (children attach here).
    pub fn children_gif(&self) -> GifId {
        self.children_gif
    }

    /// The child-side hierarchy gif (attaches to a parent).
    pub fn parent_gif(&self) -> GifId {
        self.parent_gif
    }

    /// The registered type, if any.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Is this node a naming root?
    pub fn is_naming_root(&self) -> bool {
        self.no_include_parents_in_full_name
    }
}

impl GraphStore {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Creates a node with its three gifs wired: `children` and `parent` each
    /// get a sibling link back to `self`, so all three start in one cluster.
    pub fn add_node(&mut self, type_id: Option<TypeId>) -> Result<NodeId, GraphError> {
        let self_gif = self.add_gif(GifKind::SelfGif);
        let children_gif = self.add_gif(GifKind::Hierarchical { is_parent: true });
        let parent_gif = self.add_gif(GifKind::Hierarchical { is_parent: false });

        let node = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            self_gif,
            children_gif,
            parent_gif,
            type_id,
            no_include_parents_in_full_name: false,
            root_name: None,
        });

        for (gif, name) in [
            (self_gif, "self"),
            (children_gif, "children"),
            (parent_gif, "parent"),
        ] {
            self.set_gif_name(gif, name)?;
            self.set_gif_node(gif, node)?;
        }

        self.connect_with(children_gif, self_gif, Link::sibling())?;
        self.connect_with(parent_gif, self_gif, Link::sibling())?;

        debug!(node = %node, "node created");
        Ok(node)
    }

    /// Read access to a node.
    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node.0 as usize]
    }

    /// The cluster the node currently lives in.
    pub fn get_graph(&self, node: NodeId) -> GraphId {
        self.graph_of(self.nodes[node.0 as usize].self_gif)
    }

    /// Names an unparented root. Settable exactly once.
    pub fn set_root_name(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        let slot = &mut self.nodes[node.0 as usize];
        if slot.root_name.is_some() {
            return Err(GraphError::AlreadySetUp);
        }
        slot.root_name = Some(name.into());
        Ok(())
    }

    /// Marks a node as a naming root: its descendants' full names omit
    /// everything above it.
    pub fn set_naming_root(&mut self, node: NodeId, flag: bool) {
        self.nodes[node.0 as usize].no_include_parents_in_full_name = flag;
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    /// Attaches `child` under `parent` with the given name.
    ///
    /// The name travels on the hierarchy edge, not on the child node, and
    /// becomes the child's name for all dotted addressing. A node holds at
    /// most one parent; a second attachment is rejected.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        name: impl Into<String>,
    ) -> Result<LinkId, GraphError> {
        let child_gif = self.nodes[child.0 as usize].parent_gif;
        let parent_gif = self.nodes[parent.0 as usize].children_gif;
        self.connect_with(child_gif, parent_gif, Link::named_parent(name))
    }

    /// Detaches a node from its parent. No-op if it has none.
    pub fn disconnect_parent(&mut self, node: NodeId) -> Result<(), GraphError> {
        let parent_gif = self.nodes[node.0 as usize].parent_gif;
        let mut found = None;
        if let Some(neighbors) = self.adjacency(parent_gif) {
            for (_, &lid) in neighbors {
                if matches!(
                    self.link(lid).kind(),
                    LinkKind::Parent | LinkKind::NamedParent { .. }
                ) {
                    found = Some(lid);
                    break;
                }
            }
        }
        match found {
            Some(lid) => self.remove_edge(lid),
            None => Ok(()),
        }
    }

    /// The node's parent and its edge name, if attached.
    pub fn get_parent(&self, node: NodeId) -> Option<(NodeId, String)> {
        let parent_gif = self.nodes[node.0 as usize].parent_gif;
        let neighbors = self.adjacency(parent_gif)?;
        for (&nbr, &lid) in neighbors {
            let name = match self.link(lid).kind() {
                LinkKind::NamedParent { name } => name.clone(),
                LinkKind::Parent => "<unnamed>".to_string(),
                _ => continue,
            };
            if self.gif(nbr).kind().is_parent() == Some(true) {
                let owner = self.gif(nbr).node()?;
                return Some((owner, name));
            }
        }
        None
    }

    /// The node's parent, or [`GraphError::NoParent`].
    pub fn get_parent_force(&self, node: NodeId) -> Result<(NodeId, String), GraphError> {
        self.get_parent(node).ok_or(GraphError::NoParent { node })
    }

    /// The chain from the outermost ancestor down to this node, each with
    /// its name.
    pub fn get_hierarchy(&self, node: NodeId) -> Vec<(NodeId, String)> {
        match self.get_parent(node) {
            Some((parent, name)) => {
                let mut out = self.get_hierarchy(parent);
                out.push((node, name));
                out
            }
            None => vec![(node, self.get_root_id(node))],
        }
    }

    // -----------------------------------------------------------------------
    // Naming
    // -----------------------------------------------------------------------

    /// Display id of an unparented root: its root name, or `*{id}`.
    pub fn get_root_id(&self, node: NodeId) -> String {
        match &self.nodes[node.0 as usize].root_name {
            Some(name) => name.clone(),
            None => format!("*{node}"),
        }
    }

    /// The node's name: the label of its parent edge.
    ///
    /// An unparented node has no name; `accept_no_parent` substitutes the
    /// root id instead of failing with [`GraphError::NoParent`].
    pub fn get_name(&self, node: NodeId, accept_no_parent: bool) -> Result<String, GraphError> {
        match self.get_parent(node) {
            Some((_, name)) => Ok(name),
            None if accept_no_parent => Ok(self.get_root_id(node)),
            None => Err(GraphError::NoParent { node }),
        }
    }

    /// Dotted full name from the naming root down to this node.
    ///
    /// A parent flagged as naming root is cut out together with everything
    /// above it. With `types`, each segment is suffixed with `|{type name}`.
    pub fn get_full_name(&self, node: NodeId, types: bool) -> String {
        let mut out = match self.get_parent(node) {
            Some((parent, name)) => {
                if self.nodes[parent.0 as usize].no_include_parents_in_full_name {
                    name
                } else {
                    format!("{}.{}", self.get_full_name(parent, types), name)
                }
            }
            None => self.get_root_id(node),
        };
        if types {
            let type_name = match self.nodes[node.0 as usize].type_id {
                Some(t) => self.registry().name(t),
                None => "node",
            };
            out.push('|');
            out.push_str(type_name);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Is the node's type the same as or a descendant of any of `types`?
    ///
    /// Untyped nodes only match the root `node` type.
    pub fn isinstance(&self, node: NodeId, types: &[TypeId]) -> bool {
        match self.nodes[node.0 as usize].type_id {
            Some(t) => self.registry().is_subclass_any(t, types),
            None => types.contains(&TypeId::NODE),
        }
    }

    /// The node's direct children, in attachment order.
    pub fn children_direct(&self, node: NodeId) -> Vec<NodeId> {
        let children_gif = self.nodes[node.0 as usize].children_gif;
        let mut out = Vec::new();
        if let Some(neighbors) = self.adjacency(children_gif) {
            for (&nbr, &lid) in neighbors {
                let hierarchy = matches!(
                    self.link(lid).kind(),
                    LinkKind::Parent | LinkKind::NamedParent { .. }
                );
                if hierarchy && self.gif(nbr).kind().is_parent() == Some(false) {
                    if let Some(child) = self.gif(nbr).node() {
                        out.push(child);
                    }
                }
            }
        }
        out
    }

    /// Collects children, direct or transitive, with type and predicate
    /// filtering.
    ///
    /// A `types` list that is empty or contains the root `node` type disables
    /// type filtering. `include_root` runs the node itself through the same
    /// filters. With `sort`, results are ordered by name for deterministic
    /// output.
    pub fn get_children(
        &self,
        node: NodeId,
        direct_only: bool,
        types: &[TypeId],
        include_root: bool,
        f_filter: Option<&dyn Fn(&GraphStore, NodeId) -> bool>,
        sort: bool,
    ) -> Vec<NodeId> {
        let mut found: Vec<NodeId> = Vec::new();
        if include_root {
            found.push(node);
        }
        if direct_only {
            found.extend(self.children_direct(node));
        } else {
            let mut queue = VecDeque::from([node]);
            while let Some(n) = queue.pop_front() {
                for child in self.children_direct(n) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }

        let no_type_filter = types.is_empty() || types.contains(&TypeId::NODE);
        let mut out: Vec<NodeId> = found
            .into_iter()
            .filter(|&n| no_type_filter || self.isinstance(n, types))
            .filter(|&n| f_filter.map(|f| f(self, n)).unwrap_or(true))
            .collect();

        if sort {
            out.sort_by_cached_key(|&n| {
                self.get_name(n, true).unwrap_or_else(|_| String::new())
            });
        }
        out
    }

    /// Node-level BFS from this node's `self` gif: runs the gif-level
    /// traversal and projects accepted gifs onto their owning nodes.
    pub fn bfs_node<F>(&self, node: NodeId, filter: F) -> IndexSet<NodeId>
    where
        F: FnMut(&Path, LinkId) -> bool,
    {
        let start = self.nodes[node.0 as usize].self_gif;
        let mut out = IndexSet::new();
        for gif in self.bfs_visit(filter, &[start]) {
            if let Some(owner) = self.gif(gif).node() {
                out.insert(owner);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// root("root") -> childA -> leaf, plus childB under root.
    fn tree(store: &mut GraphStore) -> (NodeId, NodeId, NodeId, NodeId) {
        let root = store.add_node(None).unwrap();
        store.set_root_name(root, "root").unwrap();
        let child_a = store.add_node(None).unwrap();
        let child_b = store.add_node(None).unwrap();
        let leaf = store.add_node(None).unwrap();
        store.add_child(root, child_a, "childA").unwrap();
        store.add_child(root, child_b, "childB").unwrap();
        store.add_child(child_a, leaf, "leaf").unwrap();
        (root, child_a, child_b, leaf)
    }

    #[test]
    fn node_construction_wires_three_gifs_into_one_cluster() {
        let mut store = GraphStore::new();
        let node = store.add_node(None).unwrap();
        let n = store.node(node);

        assert_eq!(store.gif(n.self_gif()).name(), Some("self"));
        assert_eq!(store.gif(n.children_gif()).name(), Some("children"));
        assert_eq!(store.gif(n.parent_gif()).name(), Some("parent"));
        assert_eq!(store.gif(n.self_gif()).node(), Some(node));

        let graph = store.graph(store.get_graph(node)).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        // Sibling wiring is resolvable.
        assert!(store.is_connected(n.children_gif(), n.self_gif()).is_some());
        assert!(store.is_connected(n.parent_gif(), n.self_gif()).is_some());
    }

    #[test]
    fn add_child_merges_clusters_and_sets_parent() {
        let mut store = GraphStore::new();
        let parent = store.add_node(None).unwrap();
        let child = store.add_node(None).unwrap();
        assert_ne!(store.get_graph(parent), store.get_graph(child));

        store.add_child(parent, child, "child").unwrap();
        assert_eq!(store.get_graph(parent), store.get_graph(child));
        assert_eq!(
            store.get_parent(child),
            Some((parent, "child".to_string()))
        );
        assert_eq!(store.get_parent(parent), None);
    }

    #[test]
    fn get_parent_force_reports_no_parent() {
        let mut store = GraphStore::new();
        let node = store.add_node(None).unwrap();
        assert!(matches!(
            store.get_parent_force(node),
            Err(GraphError::NoParent { node: n }) if n == node
        ));
    }

    #[test]
    fn second_parent_is_rejected() {
        let mut store = GraphStore::new();
        let p1 = store.add_node(None).unwrap();
        let p2 = store.add_node(None).unwrap();
        let child = store.add_node(None).unwrap();
        store.add_child(p1, child, "c").unwrap();
        assert!(matches!(
            store.add_child(p2, child, "c2"),
            Err(GraphError::InvalidRelationship { .. })
        ));
        // First attachment is untouched.
        assert_eq!(store.get_parent(child), Some((p1, "c".to_string())));
    }

    #[test]
    fn full_name_walks_up_to_the_root() {
        let mut store = GraphStore::new();
        let (root, child_a, _, leaf) = tree(&mut store);

        assert_eq!(store.get_full_name(root, false), "root");
        assert_eq!(store.get_full_name(child_a, false), "root.childA");
        assert_eq!(store.get_full_name(leaf, false), "root.childA.leaf");
    }

    #[test]
    fn full_name_without_root_name_uses_id_fallback() {
        let mut store = GraphStore::new();
        let root = store.add_node(None).unwrap();
        let child = store.add_node(None).unwrap();
        store.add_child(root, child, "c").unwrap();
        assert_eq!(
            store.get_full_name(child, false),
            format!("*{root}.c")
        );
    }

    #[test]
    fn typed_full_name_suffixes_each_segment() {
        let mut store = GraphStore::new();
        let module = store.registry_mut().register("module", &[]).unwrap();
        let resistor = store.registry_mut().register("resistor", &[module]).unwrap();

        let root = store.add_node(Some(module)).unwrap();
        store.set_root_name(root, "app").unwrap();
        let r1 = store.add_node(Some(resistor)).unwrap();
        store.add_child(root, r1, "r1").unwrap();

        assert_eq!(store.get_full_name(r1, true), "app|module.r1|resistor");
    }

    #[test]
    fn naming_root_cuts_off_ancestors() {
        let mut store = GraphStore::new();
        let (_, child_a, _, leaf) = tree(&mut store);

        store.set_naming_root(child_a, true);
        assert_eq!(store.get_full_name(leaf, false), "leaf");
        // The naming root itself still renders its own chain.
        assert_eq!(store.get_full_name(child_a, false), "root.childA");

        store.set_naming_root(child_a, false);
        assert_eq!(store.get_full_name(leaf, false), "root.childA.leaf");
    }

    #[test]
    fn hierarchy_lists_chain_from_root() {
        let mut store = GraphStore::new();
        let (root, child_a, _, leaf) = tree(&mut store);
        assert_eq!(
            store.get_hierarchy(leaf),
            vec![
                (root, "root".to_string()),
                (child_a, "childA".to_string()),
                (leaf, "leaf".to_string()),
            ]
        );
    }

    #[test]
    fn children_direct_and_transitive() {
        let mut store = GraphStore::new();
        let (root, child_a, child_b, leaf) = tree(&mut store);

        let direct = store.get_children(root, true, &[], false, None, true);
        assert_eq!(direct, vec![child_a, child_b]);

        let all = store.get_children(root, false, &[], false, None, true);
        assert_eq!(all, vec![child_a, child_b, leaf]);

        let with_root = store.get_children(root, false, &[], true, None, false);
        assert_eq!(with_root[0], root);
        assert_eq!(with_root.len(), 4);
    }

    #[test]
    fn children_filter_by_type_and_predicate() {
        let mut store = GraphStore::new();
        let module = store.registry_mut().register("module", &[]).unwrap();
        let interface = store.registry_mut().register("interface", &[]).unwrap();
        let electrical = store
            .registry_mut()
            .register("electrical", &[interface])
            .unwrap();

        let root = store.add_node(Some(module)).unwrap();
        let m = store.add_node(Some(module)).unwrap();
        let e1 = store.add_node(Some(electrical)).unwrap();
        let e2 = store.add_node(Some(electrical)).unwrap();
        store.add_child(root, m, "m").unwrap();
        store.add_child(root, e1, "e1").unwrap();
        store.add_child(m, e2, "e2").unwrap();

        // Subclass filter catches both electricals transitively.
        let electricals = store.get_children(root, false, &[interface], false, None, true);
        assert_eq!(electricals, vec![e1, e2]);

        // The root `node` type disables type filtering.
        let everything =
            store.get_children(root, false, &[TypeId::NODE, interface], false, None, false);
        assert_eq!(everything.len(), 3);

        // Predicate filter composes with the type filter.
        let named_e2 = store.get_children(
            root,
            false,
            &[interface],
            false,
            Some(&|s: &GraphStore, n: NodeId| {
                s.get_name(n, true).map(|name| name == "e2").unwrap_or(false)
            }),
            false,
        );
        assert_eq!(named_e2, vec![e2]);
    }

    #[test]
    fn isinstance_untyped_only_matches_node_root() {
        let mut store = GraphStore::new();
        let module = store.registry_mut().register("module", &[]).unwrap();
        let untyped = store.add_node(None).unwrap();
        assert!(store.isinstance(untyped, &[TypeId::NODE]));
        assert!(!store.isinstance(untyped, &[module]));
    }

    #[test]
    fn disconnect_parent_detaches_and_allows_reattachment() {
        let mut store = GraphStore::new();
        let p1 = store.add_node(None).unwrap();
        let p2 = store.add_node(None).unwrap();
        let child = store.add_node(None).unwrap();
        store.add_child(p1, child, "c").unwrap();

        store.disconnect_parent(child).unwrap();
        assert_eq!(store.get_parent(child), None);
        assert!(store
            .get_children(p1, true, &[], false, None, false)
            .is_empty());

        // Reattachment under a different parent now succeeds.
        store.add_child(p2, child, "c").unwrap();
        assert_eq!(store.get_parent(child), Some((p2, "c".to_string())));
    }

    #[test]
    fn disconnect_parent_on_root_is_a_no_op() {
        let mut store = GraphStore::new();
        let node = store.add_node(None).unwrap();
        store.disconnect_parent(node).unwrap();
        assert_eq!(store.get_parent(node), None);
    }

    #[test]
    fn bfs_node_reaches_connected_nodes() {
        let mut store = GraphStore::new();
        let (root, child_a, child_b, leaf) = tree(&mut store);

        let reached = store.bfs_node(root, |_, _| true);
        for n in [child_a, child_b, leaf] {
            assert!(reached.contains(&n));
        }

        // A filter that refuses hierarchy links keeps the walk inside the
        // node's own three gifs.
        let stay_home = store.bfs_node(root, |_, lid| {
            !matches!(
                store.link(lid).kind(),
                LinkKind::Parent | LinkKind::NamedParent { .. }
            )
        });
        assert_eq!(stay_home.len(), 1);
        assert!(stay_home.contains(&root));
    }

    #[test]
    fn nodes_by_names_matches_full_names() {
        let mut store = GraphStore::new();
        let (_, child_a, _, leaf) = tree(&mut store);

        let wanted: HashSet<String> =
            ["root.childA".to_string(), "root.childA.leaf".to_string()].into();
        let gid = store.get_graph(child_a);
        let mut found = store.nodes_by_names(gid, &wanted).unwrap();
        found.sort_by(|a, b| a.1.cmp(&b.1));
        assert_eq!(
            found,
            vec![
                (child_a, "root.childA".to_string()),
                (leaf, "root.childA.leaf".to_string()),
            ]
        );
    }

    #[test]
    fn gif_full_name_includes_owner_and_kind() {
        let mut store = GraphStore::new();
        let (_, child_a, _, _) = tree(&mut store);

        let self_gif = store.node(child_a).self_gif();
        assert_eq!(store.gif_full_name(self_gif, false), "root.childA.self");
        assert_eq!(
            store.gif_full_name(self_gif, true),
            "root|node.childA|node.self|self"
        );

        let loose = store.add_gif(GifKind::Plain);
        assert_eq!(store.gif_full_name(loose, false), format!("<gif {loose}>"));
    }

    #[test]
    fn connected_nodes_skip_hierarchy_links() {
        let mut store = GraphStore::new();
        let module = store.registry_mut().register("module", &[]).unwrap();
        let a = store.add_node(Some(module)).unwrap();
        let b = store.add_node(Some(module)).unwrap();
        let c = store.add_node(None).unwrap();
        store.add_child(a, c, "c").unwrap();

        let a_self = store.node(a).self_gif();
        let b_self = store.node(b).self_gif();
        store.connect(a_self, b_self).unwrap();

        // Only the direct-link peer shows up, and type filtering applies.
        assert_eq!(store.get_connected_nodes(a_self, &[]), vec![b]);
        assert_eq!(store.get_connected_nodes(a_self, &[module]), vec![b]);
        assert!(store
            .get_connected_nodes(a_self, &[TypeId(99)])
            .is_empty());
    }

    #[test]
    fn node_projection_lists_each_node_once() {
        let mut store = GraphStore::new();
        let (root, child_a, child_b, leaf) = tree(&mut store);
        let projected = store.node_projection(store.get_graph(root)).unwrap();
        assert_eq!(projected.len(), 4);
        for n in [root, child_a, child_b, leaf] {
            assert!(projected.contains(&n));
        }
    }
}

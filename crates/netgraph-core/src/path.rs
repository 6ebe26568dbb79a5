//! Ordered walks over graph interfaces.
//!
//! A [`Path`] is a non-owning ordered view over a walk of gifs: no separate
//! edge objects, edges are derived as consecutive pairs and their link looked
//! up on demand through the store. Paths are the BFS frontier unit and the
//! input to derived-link construction. Short walks stay inline via smallvec.

use smallvec::SmallVec;

use crate::id::GifId;

/// An ordered, non-empty sequence of graph interfaces.
///
/// Equality and [`starts_with`](Path::starts_with) are structural,
/// element-wise comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    gifs: SmallVec<[GifId; 8]>,
}

impl Path {
    /// Creates a single-vertex path.
    pub fn new(head: GifId) -> Self {
        Path {
            gifs: SmallVec::from_slice(&[head]),
        }
    }

    /// Creates a path from a walk. Returns `None` for an empty walk
    /// (paths have length >= 1).
    pub fn from_gifs(gifs: impl IntoIterator<Item = GifId>) -> Option<Self> {
        let gifs: SmallVec<[GifId; 8]> = gifs.into_iter().collect();
        if gifs.is_empty() {
            return None;
        }
        Some(Path { gifs })
    }

    /// First vertex of the walk.
    pub fn first(&self) -> GifId {
        self.gifs[0]
    }

    /// Last vertex of the walk.
    pub fn last(&self) -> GifId {
        self.gifs[self.gifs.len() - 1]
    }

    /// Number of vertices (>= 1).
    pub fn len(&self) -> usize {
        self.gifs.len()
    }

    /// Paths are never empty; provided for clippy symmetry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Vertex at `idx`.
    pub fn get(&self, idx: usize) -> Option<GifId> {
        self.gifs.get(idx).copied()
    }

    /// Does the walk contain `gif`?
    pub fn contains(&self, gif: GifId) -> bool {
        self.gifs.contains(&gif)
    }

    /// Position of `gif` in the walk, if present.
    pub fn index_of(&self, gif: GifId) -> Option<usize> {
        self.gifs.iter().position(|g| *g == gif)
    }

    /// The vertices of the walk, in order.
    pub fn gifs(&self) -> &[GifId] {
        &self.gifs
    }

    /// A new path with `next` appended.
    pub fn extended(&self, next: GifId) -> Path {
        let mut gifs = self.gifs.clone();
        gifs.push(next);
        Path { gifs }
    }

    /// The last traversed edge, if the walk has one.
    pub fn last_edge(&self) -> Option<(GifId, GifId)> {
        let n = self.gifs.len();
        if n < 2 {
            return None;
        }
        Some((self.gifs[n - 2], self.gifs[n - 1]))
    }

    /// Iterates the walk's edges as consecutive `(from, to)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (GifId, GifId)> + '_ {
        self.gifs.windows(2).map(|w| (w[0], w[1]))
    }

    /// Element-wise prefix check: does this path start with `other`?
    pub fn starts_with(&self, other: &Path) -> bool {
        self.gifs.starts_with(&other.gifs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(ids: &[u32]) -> Path {
        Path::from_gifs(ids.iter().map(|i| GifId(*i))).unwrap()
    }

    #[test]
    fn empty_walk_is_rejected() {
        assert!(Path::from_gifs([]).is_none());
    }

    #[test]
    fn single_vertex_path() {
        let p = Path::new(GifId(3));
        assert_eq!(p.len(), 1);
        assert_eq!(p.first(), GifId(3));
        assert_eq!(p.last(), GifId(3));
        assert_eq!(p.last_edge(), None);
        assert_eq!(p.edges().count(), 0);
    }

    #[test]
    fn extended_appends_without_mutating_original() {
        let p = path(&[1, 2]);
        let q = p.extended(GifId(3));
        assert_eq!(p.len(), 2);
        assert_eq!(q.len(), 3);
        assert_eq!(q.last(), GifId(3));
        assert_eq!(q.last_edge(), Some((GifId(2), GifId(3))));
    }

    #[test]
    fn edges_are_consecutive_pairs() {
        let p = path(&[1, 2, 3]);
        let edges: Vec<_> = p.edges().collect();
        assert_eq!(edges, vec![(GifId(1), GifId(2)), (GifId(2), GifId(3))]);
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(path(&[1, 2, 3]), path(&[1, 2, 3]));
        assert_ne!(path(&[1, 2, 3]), path(&[1, 3, 2]));
    }

    #[test]
    fn starts_with_is_elementwise() {
        let p = path(&[1, 2, 3]);
        assert!(p.starts_with(&path(&[1])));
        assert!(p.starts_with(&path(&[1, 2])));
        assert!(p.starts_with(&p));
        assert!(!p.starts_with(&path(&[2])));
        assert!(!path(&[1]).starts_with(&p));
    }

    #[test]
    fn contains_and_index() {
        let p = path(&[4, 5, 6]);
        assert!(p.contains(GifId(5)));
        assert!(!p.contains(GifId(7)));
        assert_eq!(p.index_of(GifId(6)), Some(2));
        assert_eq!(p.index_of(GifId(9)), None);
    }
}

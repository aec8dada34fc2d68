//! Topology tables maintained by the mesh during face insertion.
//!
//! - [`EdgeTable`] deduplicates edges: `(u, v)` and `(v, u)` resolve to the same
//!   canonical edge record.
//! - [`FacePair`] is the per-edge face-adjacency slot pair. An edge has one
//!   adjacent face on the boundary and two in the interior, never more.

use std::collections::HashMap;

use super::index::{EdgeId, FaceId, MeshIndex, VertexId};

/// Edge deduplication table keyed by unordered vertex pairs.
#[derive(Debug, Clone)]
pub struct EdgeTable<I: MeshIndex = u32> {
    map: HashMap<(usize, usize), EdgeId<I>>,
}

impl<I: MeshIndex> Default for EdgeTable<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> EdgeTable<I> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Create a table sized for `num_edges` entries.
    pub fn with_capacity(num_edges: usize) -> Self {
        Self {
            map: HashMap::with_capacity(num_edges),
        }
    }

    #[inline]
    fn key(u: VertexId<I>, v: VertexId<I>) -> (usize, usize) {
        let (a, b) = (u.index(), v.index());
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Look up the edge joining `u` and `v`, in either direction.
    #[inline]
    pub fn find(&self, u: VertexId<I>, v: VertexId<I>) -> Option<EdgeId<I>> {
        self.map.get(&Self::key(u, v)).copied()
    }

    /// Register `edge` as the canonical record for the pair `{u, v}`.
    ///
    /// Returns the previously registered edge, if any.
    pub(crate) fn insert(
        &mut self,
        u: VertexId<I>,
        v: VertexId<I>,
        edge: EdgeId<I>,
    ) -> Option<EdgeId<I>> {
        self.map.insert(Self::key(u, v), edge)
    }

    /// Number of registered edges.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The (first, second) adjacent-face slots of an edge.
///
/// The first slot is filled by the face that created the edge; the second by
/// the face that later traverses it. A boundary edge has an empty second slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacePair<I: MeshIndex = u32> {
    first: FaceId<I>,
    second: FaceId<I>,
}

impl<I: MeshIndex> FacePair<I> {
    /// A pair holding only `first`.
    pub fn new(first: FaceId<I>) -> Self {
        Self {
            first,
            second: FaceId::invalid(),
        }
    }

    /// The face that created the edge.
    #[inline]
    pub fn first(&self) -> Option<FaceId<I>> {
        self.first.valid()
    }

    /// The second adjacent face, `None` on a boundary.
    #[inline]
    pub fn second(&self) -> Option<FaceId<I>> {
        self.second.valid()
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.first.is_valid() as usize + self.second.is_valid() as usize
    }

    /// Whether both slots are taken.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() == 2
    }

    /// Claim the free slot for `face`.
    ///
    /// Returns `false` (and leaves the pair untouched) when both slots are
    /// already occupied.
    pub(crate) fn claim(&mut self, face: FaceId<I>) -> bool {
        if !self.first.is_valid() {
            self.first = face;
            true
        } else if !self.second.is_valid() {
            self.second = face;
            true
        } else {
            false
        }
    }

    /// Whether `face` occupies one of the slots.
    pub fn contains(&self, face: FaceId<I>) -> bool {
        face.is_valid() && (self.first == face || self.second == face)
    }

    /// The face on the other side of the edge from `face`.
    pub fn other(&self, face: FaceId<I>) -> Option<FaceId<I>> {
        if self.first == face {
            self.second()
        } else if self.second == face {
            self.first()
        } else {
            None
        }
    }

    /// Iterate over the occupied slots, first slot first.
    pub fn iter(&self) -> impl Iterator<Item = FaceId<I>> {
        self.first().into_iter().chain(self.second())
    }
}

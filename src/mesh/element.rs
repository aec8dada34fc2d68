//! Mesh elements: vertices, edges, faces and directed-edge descriptors.

use nalgebra::Point3;

use super::index::{EdgeId, FaceId, MeshIndex, VertexId};
use super::polymesh::Mesh;
use super::tables::FacePair;

/// A vertex of the mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Explicit boundary flag, independent of the topology. Subdivision passes
    /// carry it over to the vertex point; Liepa refinement keeps flagged
    /// vertices fixed.
    pub boundary: bool,

    /// Target local triangle size used by adaptive refinement.
    pub scale: f64,

    /// Incident edges in insertion order.
    pub(crate) edges: Vec<EdgeId<I>>,

    /// Adjacent faces in insertion order.
    pub(crate) faces: Vec<FaceId<I>>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new, unconnected vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            boundary: false,
            scale: 0.0,
            edges: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Incident edges, in the order they were created.
    #[inline]
    pub fn edges(&self) -> &[EdgeId<I>] {
        &self.edges
    }

    /// Adjacent faces, in the order they were inserted.
    #[inline]
    pub fn faces(&self) -> &[FaceId<I>] {
        &self.faces
    }

    /// Number of incident edges.
    #[inline]
    pub fn valency(&self) -> usize {
        self.edges.len()
    }
}

/// An undirected edge with a canonical direction fixed at creation.
#[derive(Debug, Clone)]
pub struct Edge<I: MeshIndex = u32> {
    pub(crate) vertices: [VertexId<I>; 2],
    pub(crate) faces: FacePair<I>,
}

impl<I: MeshIndex> Edge<I> {
    pub(crate) fn new(source: VertexId<I>, target: VertexId<I>, face: FaceId<I>) -> Self {
        Self {
            vertices: [source, target],
            faces: FacePair::new(face),
        }
    }

    /// Endpoints in canonical order.
    #[inline]
    pub fn vertices(&self) -> [VertexId<I>; 2] {
        self.vertices
    }

    /// Canonical start vertex.
    #[inline]
    pub fn source(&self) -> VertexId<I> {
        self.vertices[0]
    }

    /// Canonical end vertex.
    #[inline]
    pub fn target(&self) -> VertexId<I> {
        self.vertices[1]
    }

    /// Adjacent face slots.
    #[inline]
    pub fn faces(&self) -> &FacePair<I> {
        &self.faces
    }

    /// An edge with a single adjacent face.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.faces.second().is_none()
    }

    /// Whether `v` is one of the endpoints.
    #[inline]
    pub fn has_vertex(&self, v: VertexId<I>) -> bool {
        self.vertices[0] == v || self.vertices[1] == v
    }

    /// The endpoint opposite `v`, if `v` is an endpoint.
    pub fn other_vertex(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        if self.vertices[0] == v {
            Some(self.vertices[1])
        } else if self.vertices[1] == v {
            Some(self.vertices[0])
        } else {
            None
        }
    }
}

/// An edge as traversed by a face.
///
/// `inverted` records whether the face walks the edge against its canonical
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectedEdge<I: MeshIndex = u32> {
    /// The underlying edge.
    pub edge: EdgeId<I>,
    /// Traversal runs target → source.
    pub inverted: bool,
}

impl<I: MeshIndex> DirectedEdge<I> {
    /// Start of the traversal.
    pub fn source(&self, mesh: &Mesh<I>) -> VertexId<I> {
        let [a, b] = mesh.edge(self.edge).vertices;
        if self.inverted {
            b
        } else {
            a
        }
    }

    /// End of the traversal.
    pub fn target(&self, mesh: &Mesh<I>) -> VertexId<I> {
        let [a, b] = mesh.edge(self.edge).vertices;
        if self.inverted {
            a
        } else {
            b
        }
    }
}

/// A polygonal face: a CCW ring of vertices and the directed edges between them.
///
/// `edges[i]` runs from `vertices[i]` to `vertices[(i + 1) % degree]`.
#[derive(Debug, Clone)]
pub struct Face<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<VertexId<I>>,
    pub(crate) edges: Vec<DirectedEdge<I>>,
}

impl<I: MeshIndex> Face<I> {
    /// Number of corners.
    #[inline]
    pub fn degree(&self) -> usize {
        self.vertices.len()
    }

    /// The vertex ring.
    #[inline]
    pub fn vertices(&self) -> &[VertexId<I>] {
        &self.vertices
    }

    /// The directed-edge ring.
    #[inline]
    pub fn edges(&self) -> &[DirectedEdge<I>] {
        &self.edges
    }

    /// Position of `v` in the vertex ring.
    pub fn corner_of(&self, v: VertexId<I>) -> Option<usize> {
        self.vertices.iter().position(|&w| w == v)
    }

    /// The (incoming, outgoing) directed edges at corner `i`.
    #[inline]
    pub fn corner_edges(&self, i: usize) -> (DirectedEdge<I>, DirectedEdge<I>) {
        let n = self.degree();
        (self.edges[(i + n - 1) % n], self.edges[i])
    }
}

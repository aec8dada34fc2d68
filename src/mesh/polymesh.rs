//! Polygon mesh with explicit edge and face adjacency.
//!
//! The mesh owns three dense arenas (vertices, edges, faces) plus the edge
//! deduplication table. Faces are added one at a time; each insertion walks the
//! face ring, creates or claims the edges it crosses and updates the incidence
//! lists of every visited vertex.
//!
//! # Invariants
//!
//! - every edge has one (boundary) or two (interior) adjacent faces
//! - `face.edges[i]` joins `face.vertices[i]` and `face.vertices[i + 1]`
//! - vertex, edge and face ids are dense, zero-based and insertion-ordered
//!
//! Transformations never edit the arenas in place. They build a fresh mesh and
//! publish it with [`Mesh::replace_with`].

use nalgebra::{Point3, Vector3};

use super::element::{DirectedEdge, Edge, Face, Vertex};
use super::index::{EdgeId, FaceId, MeshIndex, VertexId};
use super::tables::EdgeTable;
use crate::error::{MeshError, Result};

/// A polygon mesh.
#[derive(Debug, Clone)]
pub struct Mesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) edges: Vec<Edge<I>>,
    pub(crate) faces: Vec<Face<I>>,
    pub(crate) edge_table: EdgeTable<I>,
}

impl<I: MeshIndex> Default for Mesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> Mesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            edge_table: EdgeTable::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_edges: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            edges: Vec::with_capacity(num_edges),
            faces: Vec::with_capacity(num_faces),
            edge_table: EdgeTable::with_capacity(num_edges),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// The edge deduplication table.
    #[inline]
    pub fn edge_table(&self) -> &EdgeTable<I> {
        &self.edge_table
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    ///
    /// The id equals the vertex count before the call.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    /// Add a face given its vertex ring in counter-clockwise order.
    ///
    /// Consecutive pairs `(u, v)` (wrapping at the end) are looked up in the
    /// edge table. A new pair creates a canonical edge owned by this face; a
    /// known pair gives this face the edge's second slot, with the directed
    /// edge marked inverted when the face walks it against its canonical
    /// direction.
    ///
    /// The input is validated before anything is modified, so a rejected face
    /// leaves the mesh untouched.
    ///
    /// # Errors
    ///
    /// - [`MeshError::TooFewVertices`] for fewer than three vertices
    /// - [`MeshError::InvalidVertexIndex`] for an unknown vertex id
    /// - [`MeshError::DegenerateFace`] when a vertex appears twice
    /// - [`MeshError::NonManifoldEdge`] when an edge already has two faces
    pub fn add_face(&mut self, ring: &[VertexId<I>]) -> Result<FaceId<I>> {
        let n = ring.len();
        if n < 3 {
            return Err(MeshError::TooFewVertices { count: n });
        }

        for (i, &v) in ring.iter().enumerate() {
            if !v.is_valid() || v.index() >= self.vertices.len() {
                return Err(MeshError::InvalidVertexIndex {
                    vertex: v.index(),
                    num_vertices: self.vertices.len(),
                });
            }
            if ring[..i].contains(&v) {
                return Err(MeshError::DegenerateFace { vertex: v.index() });
            }
        }

        for i in 0..n {
            let (u, v) = (ring[i], ring[(i + 1) % n]);
            if let Some(e) = self.edge_table.find(u, v) {
                if self.edge(e).faces.is_full() {
                    return Err(MeshError::NonManifoldEdge {
                        v0: u.index(),
                        v1: v.index(),
                    });
                }
            }
        }

        let face_id = FaceId::new(self.faces.len());
        let mut edges = Vec::with_capacity(n);

        for i in 0..n {
            let (u, v) = (ring[i], ring[(i + 1) % n]);
            let directed = match self.edge_table.find(u, v) {
                Some(e) => {
                    let edge = &mut self.edges[e.index()];
                    let claimed = edge.faces.claim(face_id);
                    debug_assert!(claimed, "edge slot vanished after validation");
                    DirectedEdge {
                        edge: e,
                        inverted: edge.vertices[0] != u,
                    }
                }
                None => {
                    let e = EdgeId::new(self.edges.len());
                    self.edges.push(Edge::new(u, v, face_id));
                    self.edge_table.insert(u, v, e);
                    self.vertices[u.index()].edges.push(e);
                    self.vertices[v.index()].edges.push(e);
                    DirectedEdge {
                        edge: e,
                        inverted: false,
                    }
                }
            };
            edges.push(directed);
        }

        for &v in ring {
            self.vertices[v.index()].faces.push(face_id);
        }

        self.faces.push(Face {
            vertices: ring.to_vec(),
            edges,
        });

        Ok(face_id)
    }

    /// Take ownership of everything in `other`, discarding the current contents.
    ///
    /// This is how every transformation publishes its result.
    pub fn replace_with(&mut self, other: Mesh<I>) {
        *self = other;
    }

    /// Set every vertex's boundary flag from the topology.
    pub fn mark_boundary_vertices(&mut self) {
        for i in 0..self.vertices.len() {
            let on_boundary = self.is_on_boundary(VertexId::new(i));
            self.vertices[i].boundary = on_boundary;
        }
    }

    // ==================== Topology Queries ====================

    /// Find the edge joining `u` and `v`, in either direction.
    #[inline]
    pub fn find_edge(&self, u: VertexId<I>, v: VertexId<I>) -> Option<EdgeId<I>> {
        self.edge_table.find(u, v)
    }

    /// Canonical endpoints of an edge.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        self.edge(e).vertices
    }

    /// Check if an edge has a single adjacent face.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId<I>) -> bool {
        self.edge(e).is_boundary()
    }

    /// Check if a vertex touches a boundary edge (or has no edges at all).
    pub fn is_on_boundary(&self, v: VertexId<I>) -> bool {
        let vertex = self.vertex(v);
        vertex.edges.is_empty() || vertex.edges.iter().any(|&e| self.is_boundary_edge(e))
    }

    /// Number of edges incident to a vertex.
    #[inline]
    pub fn valency(&self, v: VertexId<I>) -> usize {
        self.vertex(v).valency()
    }

    /// Iterate over the edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.vertex(v).edges.iter().copied()
    }

    /// Iterate over the faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex(v).faces.iter().copied()
    }

    /// Iterate over the vertices sharing an edge with `v`.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_edges(v)
            .filter_map(move |e| self.edge(e).other_vertex(v))
    }

    /// The vertex ring of a face.
    #[inline]
    pub fn face_vertices(&self, f: FaceId<I>) -> &[VertexId<I>] {
        &self.face(f).vertices
    }

    /// The directed-edge ring of a face.
    #[inline]
    pub fn face_edges(&self, f: FaceId<I>) -> &[DirectedEdge<I>] {
        &self.face(f).edges
    }

    /// Number of corners of a face.
    #[inline]
    pub fn face_degree(&self, f: FaceId<I>) -> usize {
        self.face(f).degree()
    }

    /// For each edge of `f`, the face on its other side (`None` on a boundary).
    pub fn face_neighbors(&self, f: FaceId<I>) -> Vec<Option<FaceId<I>>> {
        self.face(f)
            .edges
            .iter()
            .map(|d| self.edge(d.edge).faces.other(f))
            .collect()
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over all vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId<I>, &Edge<I>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    /// Iterate over all faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::new(i), f))
    }

    // ==================== Geometry ====================

    /// Compute the centroid of a face's vertices.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let ring = self.face_vertices(f);
        let sum: Vector3<f64> = ring.iter().map(|&v| self.position(v).coords).sum();
        Point3::from(sum / ring.len() as f64)
    }

    /// Newell normal of a face, scaled by twice its area.
    fn face_area_vector(&self, f: FaceId<I>) -> Vector3<f64> {
        let ring = self.face_vertices(f);
        let n = ring.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let p = self.position(ring[i]);
            let q = self.position(ring[(i + 1) % n]);
            normal += p.coords.cross(&q.coords);
        }
        normal
    }

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        self.face_area_vector(f)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a (planar) face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        0.5 * self.face_area_vector(f).norm()
    }

    /// Compute the area-weighted normal at a vertex.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let normal: Vector3<f64> = self
            .vertex_faces(v)
            .map(|f| self.face_area_vector(f))
            .sum();
        normal
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, e: EdgeId<I>) -> f64 {
        let [a, b] = self.edge_vertices(e);
        (self.position(b) - self.position(a)).norm()
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, e: EdgeId<I>) -> Point3<f64> {
        let [a, b] = self.edge_vertices(e);
        Point3::from((self.position(a).coords + self.position(b).coords) * 0.5)
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Predicates ====================

    /// Check if every face is a triangle.
    pub fn is_triangle_mesh(&self) -> bool {
        self.faces.iter().all(|f| f.degree() == 3)
    }

    /// Check if every face is a quadrilateral.
    pub fn is_quad_mesh(&self) -> bool {
        self.faces.iter().all(|f| f.degree() == 4)
    }

    /// Check if no edge lies on a boundary.
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(|e| !e.is_boundary())
    }

    /// V - E + F.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices.len() as i64 - self.edges.len() as i64 + self.faces.len() as i64
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        if self.edge_table.len() != self.edges.len() {
            return false;
        }

        for (eid, edge) in self.edges() {
            let [a, b] = edge.vertices;
            if self.edge_table.find(a, b) != Some(eid) {
                return false;
            }
            if edge.faces.first().is_none() {
                return false;
            }
            for f in edge.faces.iter() {
                if !self.face(f).edges.iter().any(|d| d.edge == eid) {
                    return false;
                }
            }
            for v in [a, b] {
                if !self.vertex(v).edges.contains(&eid) {
                    return false;
                }
            }
        }

        for (fid, face) in self.faces() {
            if face.vertices.len() < 3 || face.vertices.len() != face.edges.len() {
                return false;
            }
            let n = face.degree();
            for (i, d) in face.edges.iter().enumerate() {
                if !self.edge(d.edge).faces.contains(fid) {
                    return false;
                }
                if d.source(self) != face.vertices[i] || d.target(self) != face.vertices[(i + 1) % n]
                {
                    return false;
                }
            }
            for &v in &face.vertices {
                if !self.vertex(v).faces.contains(&fid) {
                    return false;
                }
            }
        }

        true
    }
}

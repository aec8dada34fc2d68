//! Catmull-Clark subdivision for polygon meshes.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{MeshError, Result};
use crate::mesh::{Face, FaceId, Mesh, MeshIndex, VertexId};

use super::{crease_vertex_point, inherit_vertex, BoundaryPolicy, PointMap, Subdivision};

/// Weight policy for parametric vertex points.
///
/// A vertex point is `α·V + β·E + γ·F` where `E` averages the edge neighbours,
/// `F` averages the remaining vertices of the adjacent faces and
/// `α = 1 − β − γ`. The policy picks `(β, γ)` from the valency `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexWeights {
    /// `β = 3/(2n)`, `γ = 1/(4n)`.
    #[default]
    Standard,
    /// `β = 1/n`, `γ = 1/(4n)`.
    DooSabin,
    /// `β = γ = 0`; vertices keep their position.
    Degenerate,
}

impl VertexWeights {
    /// The `(β, γ)` pair for valency `n`.
    pub fn weights(self, n: usize) -> (f64, f64) {
        let n = n as f64;
        match self {
            VertexWeights::Standard => (3.0 / (2.0 * n), 1.0 / (4.0 * n)),
            VertexWeights::DooSabin => (1.0 / n, 1.0 / (4.0 * n)),
            VertexWeights::Degenerate => (0.0, 0.0),
        }
    }
}

/// Catmull-Clark subdivision.
///
/// Every n-gon becomes n quads `(vertex point, edge point, face point, edge
/// point)`, so after one pass the mesh is all quads.
///
/// # Point Rules
///
/// - **Face point**: centroid of the face's vertices
/// - **Edge point** (interior): average of both endpoints and both face points
/// - **Edge point** (boundary): depends on [`BoundaryPolicy`]
/// - **Vertex point**: `α·V + β·E + γ·F` with weights from [`VertexWeights`],
///   or `(Q + 2R + (n−3)S) / n` when the mesh has non-quad faces or
///   `geometric_points` is set, where
///   - Q = average of adjacent face points
///   - R = average of adjacent edge midpoints
///   - S = original position
///   - n = valency
///
/// Interior vertices of valency below 3 produce no point and the corners they
/// would anchor are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatmullClark {
    /// Boundary edge handling.
    pub boundary: BoundaryPolicy,

    /// Weight policy for parametric vertex points.
    pub weights: VertexWeights,

    /// Use the bilinear B-spline weights (`α = 9/16, β = 3/8, γ = 1/16`) at
    /// valency-4 vertices regardless of `weights`.
    pub bilinear_quads: bool,

    /// Always use the geometric vertex rule.
    pub geometric_points: bool,
}

impl Default for CatmullClark {
    fn default() -> Self {
        Self {
            boundary: BoundaryPolicy::Crease,
            weights: VertexWeights::Standard,
            bilinear_quads: false,
            geometric_points: false,
        }
    }
}

impl CatmullClark {
    /// Set the boundary policy.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the vertex weight policy.
    pub fn with_weights(mut self, weights: VertexWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Enable the fixed weights at valency-4 vertices.
    pub fn with_bilinear_quads(mut self, enabled: bool) -> Self {
        self.bilinear_quads = enabled;
        self
    }

    /// Force the geometric vertex rule.
    pub fn with_geometric_points(mut self, enabled: bool) -> Self {
        self.geometric_points = enabled;
        self
    }

    /// The `(α, β, γ)` triple used at a vertex of valency `n`.
    pub fn vertex_weights(&self, n: usize) -> (f64, f64, f64) {
        let (beta, gamma) = if self.bilinear_quads && n == 4 {
            (3.0 / 8.0, 1.0 / 16.0)
        } else {
            self.weights.weights(n)
        };
        (1.0 - beta - gamma, beta, gamma)
    }

    fn vertex_point<I: MeshIndex>(
        &self,
        mesh: &Mesh<I>,
        centroids: &[Point3<f64>],
        v: VertexId<I>,
        geometric: bool,
    ) -> Option<Point3<f64>> {
        let vertex = mesh.vertex(v);
        if vertex.faces().is_empty() {
            return None;
        }

        if mesh.is_on_boundary(v) {
            return match self.boundary {
                BoundaryPolicy::Crease => Some(crease_vertex_point(mesh, v)),
                BoundaryPolicy::Preserve => Some(vertex.position),
                BoundaryPolicy::Drop => None,
            };
        }

        let n = vertex.valency();
        if n < 3 {
            trace!(vertex = v.index(), valency = n, "skipping low-valency vertex");
            return None;
        }
        let s = vertex.position.coords;

        if geometric {
            let q: Vector3<f64> = vertex
                .faces()
                .iter()
                .map(|f| centroids[f.index()].coords)
                .sum::<Vector3<f64>>()
                / vertex.faces().len() as f64;
            let r: Vector3<f64> = vertex
                .edges()
                .iter()
                .map(|&e| mesh.edge_midpoint(e).coords)
                .sum::<Vector3<f64>>()
                / n as f64;
            let n_f = n as f64;
            return Some(Point3::from((q + r * 2.0 + s * (n_f - 3.0)) / n_f));
        }

        let edge_neighbors: Vec<VertexId<I>> = mesh.vertex_neighbors(v).collect();
        let mut face_neighbors: Vec<VertexId<I>> = Vec::new();
        for &f in vertex.faces() {
            for &w in mesh.face_vertices(f) {
                if w != v && !edge_neighbors.contains(&w) && !face_neighbors.contains(&w) {
                    face_neighbors.push(w);
                }
            }
        }

        let average = |ids: &[VertexId<I>]| -> Vector3<f64> {
            ids.iter().map(|&w| mesh.position(w).coords).sum::<Vector3<f64>>() / ids.len() as f64
        };

        let (alpha, beta, gamma) = self.vertex_weights(n);
        let e = average(&edge_neighbors);
        let pos = if face_neighbors.is_empty() {
            s * (alpha + gamma) + e * beta
        } else {
            s * alpha + e * beta + average(&face_neighbors) * gamma
        };
        Some(Point3::from(pos))
    }

    /// Emit the refined faces of one old face.
    fn split_face<I: MeshIndex>(
        &self,
        new: &mut Mesh<I>,
        points: &PointMap<I>,
        f: FaceId<I>,
        face: &Face<I>,
    ) -> Result<()> {
        let fp = points
            .face(f)
            .expect("invariant: every face has a face point");
        let n = face.degree();

        for i in 0..n {
            let (incoming, outgoing) = face.corner_edges(i);
            let vp = points.vertex(face.vertices()[i]);
            let e_in = points.edge(incoming.edge);
            let e_out = points.edge(outgoing.edge);

            match (vp, e_out, e_in) {
                (Some(vp), Some(eo), Some(ei)) => {
                    new.add_face(&[vp, eo, fp, ei])?;
                }
                (Some(vp), None, Some(ei)) => {
                    new.add_face(&[vp, fp, ei])?;
                }
                (Some(vp), Some(eo), None) => {
                    new.add_face(&[vp, eo, fp])?;
                }
                _ => {}
            }

            // boundary-preserving fan over an edge that has no edge point
            if e_out.is_none() {
                let next = points.vertex(face.vertices()[(i + 1) % n]);
                if let (Some(a), Some(b)) = (vp, next) {
                    new.add_face(&[a, b, fp])?;
                }
            }
        }

        Ok(())
    }
}

impl Subdivision for CatmullClark {
    fn name(&self) -> &'static str {
        "Catmull-Clark"
    }

    fn apply_to<I: MeshIndex>(&self, mesh: &mut Mesh<I>) -> Result<()> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }

        let old: &Mesh<I> = mesh;
        let geometric = self.geometric_points || !old.is_quad_mesh();
        let corners: usize = old.faces().map(|(_, f)| f.degree()).sum();

        let mut new = Mesh::with_capacity(
            old.num_vertices() + old.num_edges() + old.num_faces(),
            2 * old.num_edges() + corners,
            corners,
        );
        let mut points = PointMap::new(old);

        let centroids: Vec<Point3<f64>> = old.face_ids().map(|f| old.face_centroid(f)).collect();

        // Vertex points
        for v in old.vertex_ids() {
            if let Some(pos) = self.vertex_point(old, &centroids, v, geometric) {
                let id = inherit_vertex(old, &mut new, v, pos);
                points.set_vertex(v, id);
            }
        }

        // Face points
        for f in old.face_ids() {
            let id = new.add_vertex(centroids[f.index()]);
            points.set_face(f, id);
        }

        // Edge points
        for (e, edge) in old.edges() {
            let [a, b] = edge.vertices();
            let pos = match (edge.faces().first(), edge.faces().second()) {
                (Some(f), Some(g)) => Point3::from(
                    (old.position(a).coords
                        + old.position(b).coords
                        + centroids[f.index()].coords
                        + centroids[g.index()].coords)
                        * 0.25,
                ),
                _ => match self.boundary {
                    BoundaryPolicy::Crease => old.edge_midpoint(e),
                    BoundaryPolicy::Preserve | BoundaryPolicy::Drop => continue,
                },
            };
            let id = new.add_vertex(pos);
            new.vertex_mut(id).boundary = old.vertex(a).boundary && old.vertex(b).boundary;
            points.set_edge(e, id);
        }

        // Topology
        for (f, face) in old.faces() {
            self.split_face(&mut new, &points, f, face)?;
        }

        trace!(
            vertices = new.num_vertices(),
            edges = new.num_edges(),
            faces = new.num_faces(),
            geometric,
            "Catmull-Clark pass built"
        );

        mesh.replace_with(new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::subdivide::fixtures;
    use crate::mesh::build_from_quads;

    #[test]
    fn test_builtin_weights_at_valency_six() {
        let (alpha, beta, gamma) = CatmullClark::default().vertex_weights(6);
        assert!((beta - 0.25).abs() < 1e-15);
        assert!((gamma - 1.0 / 24.0).abs() < 1e-15);
        assert!((alpha - (1.0 - 0.25 - 1.0 / 24.0)).abs() < 1e-15);
    }

    #[test]
    fn test_weight_policies() {
        assert_eq!(VertexWeights::DooSabin.weights(4), (0.25, 1.0 / 16.0));
        assert_eq!(VertexWeights::Degenerate.weights(5), (0.0, 0.0));

        let cc = CatmullClark::default()
            .with_weights(VertexWeights::Degenerate)
            .with_bilinear_quads(true);
        assert_eq!(cc.vertex_weights(4), (9.0 / 16.0, 3.0 / 8.0, 1.0 / 16.0));
        assert_eq!(cc.vertex_weights(5), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_catmull_clark_single_quad() {
        let mut mesh = fixtures::quad();
        CatmullClark::default().apply_to(&mut mesh).unwrap();

        // 1 quad -> 4 quads; 4 vertex points + 1 face point + 4 edge points
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_vertices(), 9);
        assert!(mesh.is_valid());
        assert!(mesh.is_quad_mesh());

        // valency-2 corners are fixed
        assert_eq!(*mesh.position(VertexId::new(0)), Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_catmull_clark_two_quads() {
        let mut mesh = fixtures::two_quads();
        CatmullClark::default().apply_to(&mut mesh).unwrap();

        // 6 vertex points + 2 face points + 7 edge points
        assert_eq!(mesh.num_faces(), 8);
        assert_eq!(mesh.num_vertices(), 15);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_cube_preserves_euler_characteristic() {
        let mut mesh = fixtures::cube();
        assert_eq!(mesh.euler_characteristic(), 2);

        CatmullClark::default().apply_to(&mut mesh).unwrap();

        assert_eq!(mesh.num_vertices(), 26);
        assert_eq!(mesh.num_edges(), 48);
        assert_eq!(mesh.num_faces(), 24);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.is_closed());
        assert!(mesh.is_valid());

        CatmullClark::default().apply_to(&mut mesh).unwrap();
        assert_eq!(mesh.num_faces(), 96);
        assert_eq!(mesh.euler_characteristic(), 2);
    }

    #[test]
    fn test_cube_corner_matches_geometric_rule() {
        // (Q + 2R + (n-3)S)/n at a cube corner is (2/9, 2/9, 2/9)
        let expected = Point3::new(2.0 / 9.0, 2.0 / 9.0, 2.0 / 9.0);

        let mut mesh = fixtures::cube();
        CatmullClark::default().apply_to(&mut mesh).unwrap();
        assert!((mesh.position(VertexId::new(0)) - expected).norm() < 1e-12);

        let mut mesh = fixtures::cube();
        CatmullClark::default()
            .with_geometric_points(true)
            .apply_to(&mut mesh)
            .unwrap();
        assert!((mesh.position(VertexId::new(0)) - expected).norm() < 1e-12);
    }

    #[test]
    fn test_mixed_faces_use_geometric_rule() {
        let mut mesh = fixtures::pyramid();
        let apex = VertexId::new(4);

        let n = mesh.valency(apex) as f64;
        let q: Vector3<f64> = mesh.vertex_faces(apex).map(|f| mesh.face_centroid(f).coords).sum::<Vector3<f64>>()
            / mesh.vertex(apex).faces().len() as f64;
        let r: Vector3<f64> =
            mesh.vertex_edges(apex).map(|e| mesh.edge_midpoint(e).coords).sum::<Vector3<f64>>() / n;
        let s = mesh.position(apex).coords;
        let expected = Point3::from((q + r * 2.0 + s * (n - 3.0)) / n);

        CatmullClark::default().apply_to(&mut mesh).unwrap();

        // 4 quad corners + 4 * 3 triangle corners
        assert_eq!(mesh.num_faces(), 16);
        assert!(mesh.is_quad_mesh());
        assert!((mesh.position(apex) - expected).norm() < 1e-12);
    }

    #[test]
    fn test_preserve_boundary_emits_fans() {
        let mut mesh = fixtures::quad();
        CatmullClark::default()
            .with_boundary(BoundaryPolicy::Preserve)
            .apply_to(&mut mesh)
            .unwrap();

        // 4 fixed corners + face point, four boundary triangles
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 4);
        assert!(mesh.is_triangle_mesh());
        assert!(mesh.is_valid());

        let mut mesh = fixtures::two_quads();
        CatmullClark::default()
            .with_boundary(BoundaryPolicy::Preserve)
            .apply_to(&mut mesh)
            .unwrap();
        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.num_faces(), 10);
        assert!(mesh.is_valid());
        assert_eq!(*mesh.position(VertexId::new(1)), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_drop_boundary_keeps_interior_corners_only() {
        let mut vertices = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                let v = j * 4 + i;
                faces.push([v, v + 1, v + 5, v + 4]);
            }
        }
        let mut mesh: Mesh = build_from_quads(&vertices, &faces).unwrap();

        CatmullClark::default()
            .with_boundary(BoundaryPolicy::Drop)
            .apply_to(&mut mesh)
            .unwrap();

        // four interior vertices, each anchoring four quads
        assert_eq!(mesh.num_faces(), 16);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_empty_mesh_fails() {
        let mut mesh: Mesh = Mesh::new();
        mesh.add_vertex(Point3::origin());
        assert_eq!(
            CatmullClark::default().apply_to(&mut mesh),
            Err(MeshError::EmptyMesh)
        );
        assert_eq!(mesh.num_vertices(), 1);
    }
}

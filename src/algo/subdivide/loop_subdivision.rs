//! Loop subdivision for triangle meshes.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, Face, FaceId, Mesh, MeshIndex, VertexId};

use super::{crease_vertex_point, inherit_vertex, BoundaryPolicy, PointMap, Subdivision};

/// Neighbour weight of an interior vertex of valency `n`.
///
/// `3/(8n)` for `n = 3`, otherwise Loop's `(1/n)(5/8 − (3/8 + ¼cos(2π/n))²)`.
pub fn loop_beta(n: usize) -> f64 {
    let n_f = n as f64;
    if n == 3 {
        3.0 / (8.0 * n_f)
    } else {
        let c = 0.375 + 0.25 * (2.0 * PI / n_f).cos();
        (0.625 - c * c) / n_f
    }
}

/// Loop subdivision.
///
/// Each triangle is replaced by four: one per corner plus one in the centre.
/// The input must contain only triangles; anything else fails the pass with
/// [`MeshError::NotTriangleMesh`] before the mesh is touched.
///
/// # Vertex Rules
///
/// - **Interior edge point**: `3/8 (v0 + v1) + 1/8 (apex_left + apex_right)`
/// - **Boundary edge point**: the midpoint under [`BoundaryPolicy::Crease`],
///   none otherwise
/// - **Interior vertex point**: `(1 − nβ) v + β Σ neighbours`, see [`loop_beta`]
/// - **Boundary vertex point**: `3/4 v + 1/8 (left + right)` under
///   [`BoundaryPolicy::Crease`]
///
/// Triangles with a missing edge or vertex point are closed with a fan over
/// the points that do exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopSubdivision {
    /// Boundary edge handling.
    pub boundary: BoundaryPolicy,
}

impl LoopSubdivision {
    /// Set the boundary policy.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    fn vertex_point<I: MeshIndex>(&self, mesh: &Mesh<I>, v: VertexId<I>) -> Option<Point3<f64>> {
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

        let beta = loop_beta(n);
        let sum: Vector3<f64> = mesh
            .vertex_neighbors(v)
            .map(|w| mesh.position(w).coords)
            .sum();
        Some(Point3::from(
            vertex.position.coords * (1.0 - n as f64 * beta) + sum * beta,
        ))
    }

    fn edge_point<I: MeshIndex>(&self, mesh: &Mesh<I>, e: EdgeId<I>) -> Option<Point3<f64>> {
        let edge = mesh.edge(e);
        let [a, b] = edge.vertices();

        match (edge.faces().first(), edge.faces().second()) {
            (Some(f), Some(g)) => {
                let apex = |face: FaceId<I>| {
                    let w = mesh
                        .face_vertices(face)
                        .iter()
                        .copied()
                        .find(|&w| !edge.has_vertex(w))
                        .expect("invariant: a triangle has a vertex opposite each edge");
                    mesh.position(w).coords
                };
                Some(Point3::from(
                    (mesh.position(a).coords + mesh.position(b).coords) * 0.375
                        + (apex(f) + apex(g)) * 0.125,
                ))
            }
            _ => match self.boundary {
                BoundaryPolicy::Crease => Some(mesh.edge_midpoint(e)),
                BoundaryPolicy::Preserve | BoundaryPolicy::Drop => None,
            },
        }
    }

    /// Emit the refined triangles of one old triangle.
    fn split_face<I: MeshIndex>(
        new: &mut Mesh<I>,
        points: &PointMap<I>,
        face: &Face<I>,
    ) -> Result<()> {
        let mut emitted = [false; 3];
        for (i, done) in emitted.iter_mut().enumerate() {
            let (incoming, outgoing) = face.corner_edges(i);
            let corner = (
                points.vertex(face.vertices()[i]),
                points.edge(outgoing.edge),
                points.edge(incoming.edge),
            );
            if let (Some(vp), Some(eo), Some(ei)) = corner {
                new.add_face(&[vp, eo, ei])?;
                *done = true;
            }
        }

        if emitted.iter().all(|&done| done) {
            let centre: Vec<VertexId<I>> = face
                .edges()
                .iter()
                .filter_map(|d| points.edge(d.edge))
                .collect();
            new.add_face(&centre)?;
            return Ok(());
        }

        // central polygon over whatever points exist, walked in face order
        let mut ring: Vec<VertexId<I>> = Vec::with_capacity(6);
        for (i, &done) in emitted.iter().enumerate() {
            if !done {
                ring.extend(points.vertex(face.vertices()[i]));
            }
            let (_, outgoing) = face.corner_edges(i);
            ring.extend(points.edge(outgoing.edge));
        }

        if ring.len() < 3 {
            return Ok(());
        }
        for k in 1..ring.len() - 1 {
            new.add_face(&[ring[0], ring[k], ring[k + 1]])?;
        }
        Ok(())
    }
}

impl Subdivision for LoopSubdivision {
    fn name(&self) -> &'static str {
        "Loop"
    }

    fn apply_to<I: MeshIndex>(&self, mesh: &mut Mesh<I>) -> Result<()> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if let Some((f, face)) = mesh.faces().find(|(_, face)| face.degree() != 3) {
            return Err(MeshError::NotTriangleMesh {
                face: f.index(),
                degree: face.degree(),
            });
        }

        let old: &Mesh<I> = mesh;
        let mut new = Mesh::with_capacity(
            old.num_vertices() + old.num_edges(),
            2 * old.num_edges() + 3 * old.num_faces(),
            4 * old.num_faces(),
        );
        let mut points = PointMap::new(old);

        for v in old.vertex_ids() {
            if let Some(pos) = self.vertex_point(old, v) {
                let id = inherit_vertex(old, &mut new, v, pos);
                points.set_vertex(v, id);
            }
        }

        for (e, edge) in old.edges() {
            if let Some(pos) = self.edge_point(old, e) {
                let [a, b] = edge.vertices();
                let id = new.add_vertex(pos);
                new.vertex_mut(id).boundary = old.vertex(a).boundary && old.vertex(b).boundary;
                points.set_edge(e, id);
            }
        }

        for (_, face) in old.faces() {
            Self::split_face(&mut new, &points, face)?;
        }

        trace!(
            vertices = new.num_vertices(),
            edges = new.num_edges(),
            faces = new.num_faces(),
            "Loop pass built"
        );

        mesh.replace_with(new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::subdivide::fixtures;

    #[test]
    fn test_beta() {
        assert!((loop_beta(3) - 0.125).abs() < 1e-15);
        // regular valency: (1/6)(5/8 - 1/4)
        assert!((loop_beta(6) - 1.0 / 16.0).abs() < 1e-12);
        assert!(loop_beta(4) > 0.0);
    }

    #[test]
    fn test_tetrahedron() {
        let mut mesh = fixtures::tetrahedron();
        LoopSubdivision::default().apply_to(&mut mesh).unwrap();

        assert_eq!(mesh.num_vertices(), 10);
        assert_eq!(mesh.num_edges(), 24);
        assert_eq!(mesh.num_faces(), 16);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.is_closed());
        assert!(mesh.is_triangle_mesh());
        assert!(mesh.is_valid());

        LoopSubdivision::default().apply_to(&mut mesh).unwrap();
        assert_eq!(mesh.num_faces(), 64);
        assert_eq!(mesh.num_vertices(), 34);
    }

    #[test]
    fn test_rejects_polygons_untouched() {
        let mut mesh = fixtures::pyramid();
        let result = LoopSubdivision::default().apply_to(&mut mesh);

        assert_eq!(result, Err(MeshError::NotTriangleMesh { face: 0, degree: 4 }));
        assert_eq!(mesh.num_faces(), 5);
        assert_eq!(mesh.num_vertices(), 5);
    }

    #[test]
    fn test_fan_crease() {
        let mut mesh = fixtures::hexagon_fan();
        mesh.mark_boundary_vertices();
        LoopSubdivision::default().apply_to(&mut mesh).unwrap();

        assert_eq!(mesh.num_vertices(), 7 + 12);
        assert_eq!(mesh.num_faces(), 24);
        assert!(mesh.is_valid());

        // regular interior vertex of a symmetric fan stays at the centre
        assert!(mesh.position(VertexId::new(0)).coords.norm() < 1e-12);

        // rim vertex follows the boundary curve rule: 3/4 (1,0) + 1/8 (1,0)
        let rim = mesh.position(VertexId::new(1));
        assert!((rim - Point3::new(0.875, 0.0, 0.0)).norm() < 1e-12);
        assert!(mesh.vertex(VertexId::new(1)).boundary);
    }

    #[test]
    fn test_fan_preserve() {
        let mut mesh = fixtures::hexagon_fan();
        let rim_before = *mesh.position(VertexId::new(3));
        LoopSubdivision::default()
            .with_boundary(BoundaryPolicy::Preserve)
            .apply_to(&mut mesh)
            .unwrap();

        // edge points only on the six spokes
        assert_eq!(mesh.num_vertices(), 13);
        // one corner triangle plus a two-triangle fan per old face
        assert_eq!(mesh.num_faces(), 18);
        assert_eq!(*mesh.position(VertexId::new(3)), rim_before);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_fan_drop() {
        let mut mesh = fixtures::hexagon_fan();
        LoopSubdivision::default()
            .with_boundary(BoundaryPolicy::Drop)
            .apply_to(&mut mesh)
            .unwrap();

        // only the corner at the centre survives
        assert_eq!(mesh.num_vertices(), 7);
        assert_eq!(mesh.num_faces(), 6);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_empty_mesh_fails() {
        let mut mesh: Mesh = Mesh::new();
        assert_eq!(
            LoopSubdivision::default().apply_to(&mut mesh),
            Err(MeshError::EmptyMesh)
        );
    }
}

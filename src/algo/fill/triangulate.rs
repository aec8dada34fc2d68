//! Minimum-weight triangulation of a closed vertex ring.

use std::f64::consts::PI;

use nalgebra::{DMatrix, Point3, Vector3};
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{Mesh, MeshIndex, VertexId};

/// Cost of a (partial) triangulation.
///
/// Compared lexicographically: the worst normal deviation dominates, total
/// area breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
struct Weight {
    angle: f64,
    area: f64,
}

impl Weight {
    const ZERO: Weight = Weight {
        angle: 0.0,
        area: 0.0,
    };

    fn combine(self, other: Weight) -> Weight {
        Weight {
            angle: self.angle.max(other.angle),
            area: self.area + other.area,
        }
    }
}

/// Unit normal of the ring at each vertex, from its two ring neighbours.
///
/// Every normal is oriented to agree with the ring's Newell normal; collinear
/// corners fall back to the Newell normal.
fn ring_normals(points: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    let n = points.len();
    let mut newell = Vector3::zeros();
    for i in 0..n {
        let a = points[i].coords;
        let b = points[(i + 1) % n].coords;
        newell += a.cross(&b);
    }
    let newell = newell.try_normalize(1e-12).unwrap_or_else(Vector3::z);

    (0..n)
        .map(|i| {
            let p = points[i];
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            match (next - p).cross(&(prev - p)).try_normalize(1e-12) {
                Some(normal) if normal.dot(&newell) < 0.0 => -normal,
                Some(normal) => normal,
                None => newell,
            }
        })
        .collect()
}

fn triangle_weight(points: &[Point3<f64>], normals: &[Vector3<f64>], tri: [usize; 3]) -> Weight {
    let [a, b, c] = tri;
    let cross = (points[b] - points[a]).cross(&(points[c] - points[a]));
    let area = 0.5 * cross.norm();

    let angle = match cross.try_normalize(1e-12) {
        Some(normal) => tri
            .iter()
            .map(|&v| normal.dot(&normals[v]).clamp(-1.0, 1.0).acos())
            .fold(0.0, f64::max),
        None => PI,
    };

    Weight { angle, area }
}

/// Triangulate a mesh holding only an ordered, unconnected vertex ring.
///
/// The vertices, in id order, are the ring. Splits are chosen by a dynamic
/// program over index intervals minimising [`Weight`]: O(n³) time and O(n²)
/// space. The result has `n − 2` triangles oriented like the ring and every
/// vertex is flagged as boundary so later refinement leaves it in place.
///
/// # Errors
///
/// - [`MeshError::InvalidState`] if the mesh already has edges or faces
/// - [`MeshError::TooFewVertices`] if the ring has fewer than 3 vertices
pub fn triangulate_ring<I: MeshIndex>(mesh: &mut Mesh<I>) -> Result<()> {
    if mesh.num_edges() > 0 || mesh.num_faces() > 0 {
        return Err(MeshError::InvalidState(
            "ring triangulation needs a mesh without edges or faces".into(),
        ));
    }
    let n = mesh.num_vertices();
    if n < 3 {
        return Err(MeshError::TooFewVertices { count: n });
    }

    let points: Vec<Point3<f64>> = mesh.vertices().map(|(_, v)| v.position).collect();
    let normals = ring_normals(&points);

    let mut cost = DMatrix::from_element(n, n, Weight::ZERO);
    let mut split = DMatrix::from_element(n, n, 0usize);

    for len in 2..n {
        for i in 0..n - len {
            let k = i + len;
            let mut best: Option<(Weight, usize)> = None;
            for m in i + 1..k {
                let w = cost[(i, m)]
                    .combine(cost[(m, k)])
                    .combine(triangle_weight(&points, &normals, [i, m, k]));
                match best {
                    Some((b, _)) if w.partial_cmp(&b) != Some(std::cmp::Ordering::Less) => {}
                    _ => best = Some((w, m)),
                }
            }
            if let Some((w, m)) = best {
                cost[(i, k)] = w;
                split[(i, k)] = m;
            }
        }
    }

    let mut triangles = Vec::with_capacity(n - 2);
    let mut stack = vec![(0, n - 1)];
    while let Some((i, k)) = stack.pop() {
        if k < i + 2 {
            continue;
        }
        let m = split[(i, k)];
        triangles.push([i, m, k]);
        stack.push((i, m));
        stack.push((m, k));
    }

    for [a, b, c] in triangles {
        mesh.add_face(&[VertexId::new(a), VertexId::new(b), VertexId::new(c)])?;
    }
    for i in 0..n {
        mesh.vertex_mut(VertexId::new(i)).boundary = true;
    }

    let total = cost[(0, n - 1)];
    debug!(
        ring = n,
        faces = mesh.num_faces(),
        max_angle = total.angle,
        area = total.area,
        "ring triangulated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring<I: MeshIndex>(points: &[Point3<f64>]) -> Mesh<I> {
        let mut mesh = Mesh::new();
        for &p in points {
            mesh.add_vertex(p);
        }
        mesh
    }

    fn regular_polygon(n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                Point3::new(t.cos(), t.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_convex_ring() {
        let points = regular_polygon(8);
        let mut mesh: Mesh = ring(&points);
        triangulate_ring(&mut mesh).unwrap();

        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_edges(), 8 + 5);
        let internal = mesh.edge_ids().filter(|&e| !mesh.is_boundary_edge(e)).count();
        assert_eq!(internal, 5);
        assert!(mesh.is_valid());
        assert!(mesh.vertices().all(|(_, v)| v.boundary));

        // triangles tile the polygon exactly: no overlap
        let polygon_area = 0.5 * 8.0 * (2.0 * PI / 8.0).sin();
        assert!((mesh.surface_area() - polygon_area).abs() < 1e-9);

        // all triangles face the same way as the ring
        for f in mesh.face_ids() {
            assert!(mesh.face_normal(f).z > 0.0);
        }
    }

    #[test]
    fn test_triangle_ring() {
        let mut mesh: Mesh<u16> = ring(&regular_polygon(3));
        triangulate_ring(&mut mesh).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_edges(), 3);
    }

    #[test]
    fn test_saddle_ring() {
        let points: Vec<Point3<f64>> = regular_polygon(12)
            .into_iter()
            .enumerate()
            .map(|(i, p)| Point3::new(p.x, p.y, if i % 2 == 0 { 0.3 } else { -0.3 }))
            .collect();
        let mut mesh: Mesh = ring(&points);
        triangulate_ring(&mut mesh).unwrap();

        assert_eq!(mesh.num_faces(), 10);
        assert_eq!(mesh.edge_ids().filter(|&e| !mesh.is_boundary_edge(e)).count(), 9);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_flat_faces_win_over_folded_ones() {
        // an L-shaped planar ring: every candidate triangulation is flat, but
        // triangles bridging the notch flip against the ring normal
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mut mesh: Mesh = ring(&points);
        triangulate_ring(&mut mesh).unwrap();

        assert_eq!(mesh.num_faces(), 4);
        assert!((mesh.surface_area() - 3.0).abs() < 1e-9);
        for f in mesh.face_ids() {
            assert!(mesh.face_normal(f).z > 0.0);
        }
    }

    #[test]
    fn test_rejects_connected_mesh() {
        let mut mesh: Mesh = ring(&regular_polygon(3));
        let ids: Vec<_> = mesh.vertex_ids().collect();
        mesh.add_face(&ids).unwrap();

        assert!(matches!(
            triangulate_ring(&mut mesh),
            Err(MeshError::InvalidState(_))
        ));
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_rejects_short_ring() {
        let mut mesh: Mesh = ring(&regular_polygon(2));
        assert_eq!(
            triangulate_ring(&mut mesh),
            Err(MeshError::TooFewVertices { count: 2 })
        );
    }
}

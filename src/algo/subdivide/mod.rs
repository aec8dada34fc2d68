//! Mesh subdivision algorithms.
//!
//! Every scheme implements [`Subdivision`]: `apply_to` replaces the mesh with its
//! next refinement level or returns an error. A pass runs in three stages:
//!
//! 1. create the new points for the old vertices, edges and faces in a fresh
//!    mesh, recording old → new handles in a [`PointMap`]
//! 2. apply the boundary policy (which boundary points exist and where)
//! 3. walk the old face rings and add the refined faces to the fresh mesh
//!
//! The fresh mesh is then swapped into the caller's mesh with
//! [`Mesh::replace_with`]. A pass that fails leaves the caller's mesh untouched.
//!
//! # Catmull-Clark Subdivision (Polygon Meshes)
//!
//! Catmull-Clark subdivision (Catmull & Clark, 1978) turns every n-gon into n
//! quads built from a face point, edge points and a vertex point.
//!
//! # Doo-Sabin Subdivision (Polygon Meshes)
//!
//! Doo-Sabin subdivision (Doo & Sabin, 1978) shrinks every face towards its
//! centre and fills the gaps with one quad per interior edge and one polygon per
//! interior vertex.
//!
//! # Loop Subdivision (Triangle Meshes)
//!
//! Loop subdivision (Loop, 1987) splits every triangle into four.
//!
//! # Example
//!
//! ```
//! use cobble::prelude::*;
//! use cobble::algo::subdivide::{subdivide, CatmullClark, SubdivideOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: Mesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//!
//! subdivide(&mut mesh, &CatmullClark::default(), &SubdivideOptions::new(2)).unwrap();
//! assert_eq!(mesh.num_faces(), 16);
//! ```
//!
//! # References
//!
//! - Catmull, E. & Clark, J. (1978). "Recursively generated B-spline surfaces
//!   on arbitrary topological meshes." Computer-Aided Design, 10(6), 350-355.
//! - Doo, D. & Sabin, M. (1978). "Behaviour of recursive division surfaces near
//!   extraordinary points." Computer-Aided Design, 10(6), 356-360.
//! - Loop, C. (1987). "Smooth Subdivision Surfaces Based on Triangles."
//!   Master's thesis, University of Utah.

mod catmull_clark;
mod doo_sabin;
mod loop_subdivision;

pub use catmull_clark::{CatmullClark, VertexWeights};
pub use doo_sabin::{DooSabin, DooSabinPoints, WeightOverrides};
pub use loop_subdivision::{loop_beta, LoopSubdivision};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::{EdgeId, FaceId, Mesh, MeshIndex, VertexId};

/// A subdivision scheme.
pub trait Subdivision {
    /// Human-readable scheme name.
    fn name(&self) -> &'static str;

    /// Replace `mesh` with its next refinement level.
    ///
    /// # Errors
    ///
    /// Returns an error when the input violates the scheme's preconditions. The
    /// mesh is left unmodified in that case.
    fn apply_to<I: MeshIndex>(&self, mesh: &mut Mesh<I>) -> Result<()>;
}

/// How boundary (single-face) edges are refined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Boundary edges get midpoint edge points and boundary vertices follow the
    /// cubic B-spline curve rule (`1/8, 3/4, 1/8`); corners stay fixed.
    #[default]
    Crease,

    /// Boundary edges get no edge point and boundary vertices keep their
    /// position; faces along the boundary are closed with triangle fans.
    Preserve,

    /// Boundary vertices produce no point; the refined faces that would touch
    /// them are dropped, so the surface retreats from its boundary.
    Drop,
}

/// Options for running several subdivision passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Run `options.iterations` passes of `scheme` over `mesh`.
///
/// Stops at the first failing pass; passes that already succeeded stay applied.
pub fn subdivide<S, I>(mesh: &mut Mesh<I>, scheme: &S, options: &SubdivideOptions) -> Result<()>
where
    S: Subdivision + ?Sized,
    I: MeshIndex,
{
    subdivide_with_progress(mesh, scheme, options, &Progress::none())
}

/// [`subdivide`] with progress reporting.
pub fn subdivide_with_progress<S, I>(
    mesh: &mut Mesh<I>,
    scheme: &S,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<()>
where
    S: Subdivision + ?Sized,
    I: MeshIndex,
{
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, scheme.name());
        scheme.apply_to(mesh)?;
        debug!(
            scheme = scheme.name(),
            pass = iter + 1,
            vertices = mesh.num_vertices(),
            faces = mesh.num_faces(),
            "subdivision pass done"
        );
    }
    progress.report(options.iterations, options.iterations, scheme.name());
    Ok(())
}

/// A subdivision scheme chosen at runtime, e.g. from a configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubdivisionScheme {
    /// Catmull-Clark.
    CatmullClark(CatmullClark),
    /// Doo-Sabin.
    DooSabin(DooSabin),
    /// Loop.
    Loop(LoopSubdivision),
}

impl Subdivision for SubdivisionScheme {
    fn name(&self) -> &'static str {
        match self {
            SubdivisionScheme::CatmullClark(s) => s.name(),
            SubdivisionScheme::DooSabin(s) => s.name(),
            SubdivisionScheme::Loop(s) => s.name(),
        }
    }

    fn apply_to<I: MeshIndex>(&self, mesh: &mut Mesh<I>) -> Result<()> {
        match self {
            SubdivisionScheme::CatmullClark(s) => s.apply_to(mesh),
            SubdivisionScheme::DooSabin(s) => s.apply_to(mesh),
            SubdivisionScheme::Loop(s) => s.apply_to(mesh),
        }
    }
}

/// Old element → new vertex handles for one subdivision pass.
///
/// The map lives exactly as long as the pass that fills it; its handles point
/// into the pass's fresh mesh, never into the old one.
#[derive(Debug)]
pub(crate) struct PointMap<I: MeshIndex> {
    vertex_points: Vec<Option<VertexId<I>>>,
    edge_points: Vec<Option<VertexId<I>>>,
    face_points: Vec<Option<VertexId<I>>>,
}

impl<I: MeshIndex> PointMap<I> {
    pub(crate) fn new(old: &Mesh<I>) -> Self {
        Self {
            vertex_points: vec![None; old.num_vertices()],
            edge_points: vec![None; old.num_edges()],
            face_points: vec![None; old.num_faces()],
        }
    }

    #[inline]
    pub(crate) fn vertex(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        self.vertex_points[v.index()]
    }

    #[inline]
    pub(crate) fn edge(&self, e: EdgeId<I>) -> Option<VertexId<I>> {
        self.edge_points[e.index()]
    }

    #[inline]
    pub(crate) fn face(&self, f: FaceId<I>) -> Option<VertexId<I>> {
        self.face_points[f.index()]
    }

    pub(crate) fn set_vertex(&mut self, v: VertexId<I>, point: VertexId<I>) {
        self.vertex_points[v.index()] = Some(point);
    }

    pub(crate) fn set_edge(&mut self, e: EdgeId<I>, point: VertexId<I>) {
        self.edge_points[e.index()] = Some(point);
    }

    pub(crate) fn set_face(&mut self, f: FaceId<I>, point: VertexId<I>) {
        self.face_points[f.index()] = Some(point);
    }
}

/// Neighbours of `v` across boundary edges.
pub(crate) fn boundary_neighbors<I: MeshIndex>(mesh: &Mesh<I>, v: VertexId<I>) -> Vec<VertexId<I>> {
    mesh.vertex_edges(v)
        .filter(|&e| mesh.is_boundary_edge(e))
        .filter_map(|e| mesh.edge(e).other_vertex(v))
        .collect()
}

/// Cubic B-spline rule for a vertex on a boundary curve.
///
/// A vertex with exactly two boundary neighbours moves to
/// `3/4 v + 1/8 (left + right)`; corners and non-manifold boundary vertices
/// keep their position.
pub(crate) fn crease_vertex_point<I: MeshIndex>(mesh: &Mesh<I>, v: VertexId<I>) -> Point3<f64> {
    let pos = mesh.position(v);
    match boundary_neighbors(mesh, v).as_slice() {
        &[left, right] if mesh.valency(v) > 2 => Point3::from(
            pos.coords * 0.75 + (mesh.position(left).coords + mesh.position(right).coords) * 0.125,
        ),
        _ => *pos,
    }
}

/// Propagate the boundary flag of an old vertex to its new point.
pub(crate) fn inherit_vertex<I: MeshIndex>(
    old: &Mesh<I>,
    new: &mut Mesh<I>,
    v: VertexId<I>,
    position: Point3<f64>,
) -> VertexId<I> {
    let id = new.add_vertex(position);
    new.vertex_mut(id).boundary = old.vertex(v).boundary;
    id
}

#[cfg(test)]
pub(crate) mod fixtures {
    use nalgebra::Point3;

    use crate::mesh::{build_from_polygons, build_from_quads, build_from_triangles, Mesh};

    pub fn quad() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap()
    }

    pub fn two_quads() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3], [1, 4, 5, 2]]).unwrap()
    }

    pub fn cube() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ];
        build_from_quads(&vertices, &faces).unwrap()
    }

    pub fn tetrahedron() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    /// A closed square pyramid: one quad and four triangles.
    pub fn pyramid() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces: Vec<Vec<usize>> = vec![
            vec![0, 3, 2, 1],
            vec![0, 1, 4],
            vec![1, 2, 4],
            vec![2, 3, 4],
            vec![3, 0, 4],
        ];
        build_from_polygons(&vertices, &faces).unwrap()
    }

    /// Two quads glued back to back; every vertex is interior with valency 2.
    pub fn pillow() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3], [3, 2, 1, 0]]).unwrap()
    }

    /// Two triangles glued back to back.
    pub fn triangle_pillow() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [2, 1, 0]]).unwrap()
    }

    /// Two closed tetrahedra touching only at vertex 0.
    ///
    /// Every edge has two faces, but the faces around vertex 0 form two
    /// separate cycles.
    pub fn bowtie() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-0.5, -1.0, 0.0),
            Point3::new(-0.5, -0.5, 1.0),
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 1, 3],
            [1, 2, 3],
            [2, 0, 3],
            [0, 5, 4],
            [0, 4, 6],
            [4, 5, 6],
            [5, 0, 6],
        ];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    /// Triangle fan around vertex 0 with a boundary rim.
    pub fn hexagon_fan() -> Mesh {
        let mut vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        for i in 0..6 {
            let t = i as f64 * std::f64::consts::PI / 3.0;
            vertices.push(Point3::new(t.cos(), t.sin(), 0.0));
        }
        let faces: Vec<[usize; 3]> = (0..6).map(|i| [0, 1 + i, 1 + (i + 1) % 6]).collect();
        build_from_triangles(&vertices, &faces).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crease_rule_on_open_strip() {
        let mesh = fixtures::two_quads();
        // vertex 1 sits in the middle of the bottom boundary
        let p = crease_vertex_point(&mesh, VertexId::new(1));
        assert!((p - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);

        // corner of valency 2 stays put
        let p = crease_vertex_point(&mesh, VertexId::new(0));
        assert_eq!(p, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_scheme_enum_dispatches() {
        let mut mesh = fixtures::cube();
        let scheme = SubdivisionScheme::CatmullClark(CatmullClark::default());
        assert_eq!(scheme.name(), "Catmull-Clark");

        subdivide(&mut mesh, &scheme, &SubdivideOptions::new(1)).unwrap();
        assert_eq!(mesh.num_faces(), 24);
    }

    #[test]
    fn test_failed_pass_stops_the_run() {
        let mut mesh = fixtures::pyramid();
        let result = subdivide(&mut mesh, &LoopSubdivision::default(), &SubdivideOptions::new(3));
        assert!(result.is_err());
        assert_eq!(mesh.num_faces(), 5);
    }

    const POLICIES: [BoundaryPolicy; 3] = [
        BoundaryPolicy::Crease,
        BoundaryPolicy::Preserve,
        BoundaryPolicy::Drop,
    ];

    #[test]
    fn test_pillow_skips_low_valency_corners() {
        for policy in POLICIES {
            // no vertex points, so no corner quad can be formed
            let mut mesh = fixtures::pillow();
            CatmullClark::default()
                .with_boundary(policy)
                .apply_to(&mut mesh)
                .unwrap();
            assert_eq!(mesh.num_vertices(), 2 + 4);
            assert_eq!(mesh.num_edges(), 0);
            assert_eq!(mesh.num_faces(), 0);
            assert!(mesh.is_valid());

            // the central triangle still closes both sides
            let mut mesh = fixtures::triangle_pillow();
            LoopSubdivision::default()
                .with_boundary(policy)
                .apply_to(&mut mesh)
                .unwrap();
            assert_eq!(mesh.num_vertices(), 3);
            assert_eq!(mesh.num_faces(), 2);
            assert!(mesh.is_closed());
            assert!(mesh.is_valid());
        }

        // 2 F-faces + 4 E-faces, no V-face at valency 2
        let mut mesh = fixtures::pillow();
        DooSabin::default().apply_to(&mut mesh).unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_edges(), 12);
        assert_eq!(mesh.num_faces(), 6);
        assert!(mesh.is_closed());
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_bowtie_vertex() {
        let mesh = fixtures::bowtie();
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 3);
        assert!(doo_sabin::faces_around(&mesh, VertexId::new(0)).is_none());
        assert!(doo_sabin::faces_around(&mesh, VertexId::new(4)).is_some());

        for policy in POLICIES {
            let mut mesh = fixtures::bowtie();
            CatmullClark::default()
                .with_boundary(policy)
                .apply_to(&mut mesh)
                .unwrap();
            // 7 vertex points + 8 face points + 12 edge points
            assert_eq!(mesh.num_vertices(), 27);
            assert_eq!(mesh.num_faces(), 24);
            assert_eq!(mesh.euler_characteristic(), 3);
            assert!(mesh.is_closed());
            assert!(mesh.is_valid());

            let mut mesh = fixtures::bowtie();
            LoopSubdivision::default()
                .with_boundary(policy)
                .apply_to(&mut mesh)
                .unwrap();
            assert_eq!(mesh.num_vertices(), 19);
            assert_eq!(mesh.num_edges(), 48);
            assert_eq!(mesh.num_faces(), 32);
            assert!(mesh.is_closed());
            assert!(mesh.is_valid());
        }

        // the shared vertex gets no V-face, leaving one triangular hole per side
        let mut mesh = fixtures::bowtie();
        DooSabin::default().apply_to(&mut mesh).unwrap();
        assert_eq!(mesh.num_vertices(), 24);
        assert_eq!(mesh.num_faces(), 8 + 12 + 6);
        assert_eq!(mesh.num_edges(), 48);
        assert_eq!(mesh.edge_ids().filter(|&e| mesh.is_boundary_edge(e)).count(), 6);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_zero_iterations_is_a_no_op() {
        let mut mesh = fixtures::cube();
        subdivide(&mut mesh, &DooSabin::default(), &SubdivideOptions::new(0)).unwrap();
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_vertices(), 8);
    }
}

//! Hole filling.
//!
//! A hole is described by its rim: the boundary vertices in traversal order.
//! Filling runs two stages on a standalone patch mesh:
//!
//! 1. [`triangulate_ring`] closes the rim with a minimum-weight triangulation
//! 2. [`refine`] (optional) inserts interior vertices until the patch density
//!    matches the rim's sampling
//!
//! [`fill_hole`] wraps both behind a flat, index-based contract so the patch
//! can be stitched into any host mesh.
//!
//! # Example
//!
//! ```
//! use cobble::algo::fill::{fill_hole, BoundaryVertex, FillOptions};
//! use nalgebra::Point3;
//!
//! let rim = vec![
//!     BoundaryVertex::new(7, Point3::new(0.0, 0.0, 0.0)),
//!     BoundaryVertex::new(3, Point3::new(1.0, 0.0, 0.0)),
//!     BoundaryVertex::new(9, Point3::new(1.0, 1.0, 0.0)),
//!     BoundaryVertex::new(4, Point3::new(0.0, 1.0, 0.0)),
//! ];
//! let patch = fill_hole(&rim, &FillOptions::default().with_refine(false)).unwrap();
//!
//! assert_eq!(patch.num_vertices, 0);
//! assert_eq!(patch.num_triangles, 2);
//! assert!(patch.triangles.iter().all(|&i| [-7, -3, -9, -4].contains(&i)));
//! ```

mod liepa;
mod triangulate;

pub use liepa::{refine, refine_with_progress, LiepaOptions};
pub use triangulate::triangulate_ring;

use std::collections::HashSet;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// A rim vertex with its caller-assigned id.
///
/// Ids must be positive; they only need to be unique within one hole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryVertex {
    /// Caller id, echoed back negated in [`HolePatch::triangles`].
    pub id: i64,
    /// Position.
    pub position: Point3<f64>,
}

impl BoundaryVertex {
    /// Create a rim vertex.
    pub fn new(id: i64, position: Point3<f64>) -> Self {
        Self { id, position }
    }
}

/// Options for [`fill_hole`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillOptions {
    /// Run Liepa refinement after triangulating.
    pub refine: bool,

    /// Refinement parameters.
    pub liepa: LiepaOptions,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            refine: true,
            liepa: LiepaOptions::default(),
        }
    }
}

impl FillOptions {
    /// Enable or disable refinement.
    pub fn with_refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    /// Set the refinement parameters.
    pub fn with_liepa(mut self, liepa: LiepaOptions) -> Self {
        self.liepa = liepa;
        self
    }
}

/// The patch that closes a hole.
///
/// `vertices` holds `num_vertices` new interior points as flat `x, y, z`
/// triples. `triangles` holds `num_triangles` index triples: a non-negative
/// index points into `vertices`, a negative one is the negated caller id of a
/// rim vertex. Triangles wind the same way as the rim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolePatch {
    /// Number of new vertices.
    pub num_vertices: usize,
    /// New vertex coordinates, three per vertex.
    pub vertices: Vec<f64>,
    /// Number of triangles.
    pub num_triangles: usize,
    /// Triangle indices, three per triangle.
    pub triangles: Vec<i64>,
}

impl HolePatch {
    /// Position of new vertex `i`.
    pub fn vertex(&self, i: usize) -> Point3<f64> {
        Point3::new(
            self.vertices[3 * i],
            self.vertices[3 * i + 1],
            self.vertices[3 * i + 2],
        )
    }

    /// Triangle `i` as an index triple.
    pub fn triangle(&self, i: usize) -> [i64; 3] {
        [
            self.triangles[3 * i],
            self.triangles[3 * i + 1],
            self.triangles[3 * i + 2],
        ]
    }
}

/// Triangulate (and optionally refine) the hole bounded by `rim`.
///
/// # Errors
///
/// - [`MeshError::TooFewVertices`] for a rim of fewer than 3 vertices
/// - [`MeshError::InvalidParameter`] for a non-positive or repeated id
/// - any error of [`refine`]
pub fn fill_hole(rim: &[BoundaryVertex], options: &FillOptions) -> Result<HolePatch> {
    if rim.len() < 3 {
        return Err(MeshError::TooFewVertices { count: rim.len() });
    }
    let mut seen = HashSet::with_capacity(rim.len());
    for vertex in rim {
        if vertex.id <= 0 {
            return Err(MeshError::invalid_param(
                "id",
                vertex.id,
                "rim vertex ids must be positive",
            ));
        }
        if !seen.insert(vertex.id) {
            return Err(MeshError::invalid_param(
                "id",
                vertex.id,
                "rim vertex ids must be unique",
            ));
        }
    }

    let mut mesh: Mesh = Mesh::with_capacity(rim.len(), 2 * rim.len(), rim.len());
    for vertex in rim {
        mesh.add_vertex(vertex.position);
    }
    triangulate_ring(&mut mesh)?;
    if options.refine {
        refine(&mut mesh, &options.liepa)?;
    }

    let n = rim.len();
    let vertices: Vec<f64> = mesh
        .vertices()
        .skip(n)
        .flat_map(|(_, v)| [v.position.x, v.position.y, v.position.z])
        .collect();
    let triangles: Vec<i64> = mesh
        .faces()
        .flat_map(|(_, face)| face.vertices().iter().copied())
        .map(|v| match v.index() {
            i if i < n => -rim[i].id,
            i => (i - n) as i64,
        })
        .collect();

    let patch = HolePatch {
        num_vertices: vertices.len() / 3,
        vertices,
        num_triangles: triangles.len() / 3,
        triangles,
    };
    debug!(
        rim = n,
        added = patch.num_vertices,
        triangles = patch.num_triangles,
        "hole filled"
    );
    Ok(patch)
}

//! Liepa's adaptive refinement of a triangulated hole patch.
//!
//! Triangles that are coarse compared to the local sampling density are split
//! at their centroid, and the patch is kept locally Delaunay by edge flips
//! after every split and after every pass. Boundary edges are never flipped,
//! so the hole's rim survives unchanged.
//!
//! # References
//!
//! - Liepa, P. (2003). "Filling Holes in Meshes." Eurographics Symposium on
//!   Geometry Processing.

use std::collections::HashMap;
use std::f64::consts::{PI, SQRT_2};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{Mesh, MeshIndex, VertexId};

/// Options for [`refine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiepaOptions {
    /// Density factor. A triangle is split when every vertex lies farther
    /// than `alpha` times the local scale from its centroid; larger values
    /// give coarser output, values near zero split everything.
    pub alpha: f64,

    /// Upper bound on split passes.
    pub max_passes: usize,

    /// Upper bound on relaxation sweeps after a pass.
    pub max_relax_sweeps: usize,

    /// Upper bound on the vertex count of the refined patch. Splitting stops
    /// as soon as it is reached, even in the middle of a pass.
    pub max_vertices: usize,
}

impl Default for LiepaOptions {
    fn default() -> Self {
        Self {
            alpha: SQRT_2,
            max_passes: 32,
            max_relax_sweeps: 64,
            max_vertices: 4096,
        }
    }
}

impl LiepaOptions {
    /// Set the density factor.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the maximum number of split passes.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the maximum number of relaxation sweeps per pass.
    pub fn with_max_relax_sweeps(mut self, sweeps: usize) -> Self {
        self.max_relax_sweeps = sweeps;
        self
    }

    /// Set the vertex budget.
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(MeshError::invalid_param(
                "alpha",
                self.alpha,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Outcome of a full relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Relaxation {
    flips: usize,
    /// The last sweep flipped nothing, so every interior edge is locally Delaunay.
    settled: bool,
}

/// Working copy of a triangle mesh as a face list with a directed-edge index.
struct Patch {
    positions: Vec<Point3<f64>>,
    scales: Vec<f64>,
    boundary: Vec<bool>,
    faces: Vec<[usize; 3]>,
    directed: HashMap<(usize, usize), usize>,
}

impl Patch {
    fn from_mesh<I: MeshIndex>(mesh: &Mesh<I>) -> Result<Self> {
        let mut faces = Vec::with_capacity(mesh.num_faces());
        for (f, face) in mesh.faces() {
            match face.vertices() {
                &[a, b, c] => faces.push([a.index(), b.index(), c.index()]),
                ring => {
                    return Err(MeshError::NotTriangleMesh {
                        face: f.index(),
                        degree: ring.len(),
                    })
                }
            }
        }

        let scales = mesh
            .vertices()
            .map(|(v, vertex)| {
                let rim: Vec<f64> = mesh
                    .vertex_edges(v)
                    .filter(|&e| mesh.is_boundary_edge(e))
                    .map(|e| mesh.edge_length(e))
                    .collect();
                if !rim.is_empty() {
                    rim.iter().sum::<f64>() / rim.len() as f64
                } else if vertex.scale > 0.0 {
                    vertex.scale
                } else {
                    let n = vertex.valency().max(1) as f64;
                    mesh.vertex_edges(v).map(|e| mesh.edge_length(e)).sum::<f64>() / n
                }
            })
            .collect();

        let mut patch = Self {
            positions: mesh.vertices().map(|(_, v)| v.position).collect(),
            scales,
            boundary: mesh.vertices().map(|(_, v)| v.boundary).collect(),
            faces: Vec::new(),
            directed: HashMap::with_capacity(3 * faces.len()),
        };
        for face in faces {
            patch.push_face(face);
        }
        Ok(patch)
    }

    fn into_mesh<I: MeshIndex>(self) -> Result<Mesh<I>> {
        let mut mesh = Mesh::with_capacity(
            self.positions.len(),
            self.directed.len() / 2 + 1,
            self.faces.len(),
        );
        for ((&position, &scale), &boundary) in
            self.positions.iter().zip(&self.scales).zip(&self.boundary)
        {
            let id = mesh.add_vertex(position);
            let vertex = mesh.vertex_mut(id);
            vertex.scale = scale;
            vertex.boundary = boundary;
        }
        for [a, b, c] in self.faces {
            mesh.add_face(&[VertexId::new(a), VertexId::new(b), VertexId::new(c)])?;
        }
        Ok(mesh)
    }

    fn push_face(&mut self, face: [usize; 3]) {
        let f = self.faces.len();
        self.faces.push(face);
        self.index_face(f);
    }

    fn index_face(&mut self, f: usize) {
        let [a, b, c] = self.faces[f];
        self.directed.insert((a, b), f);
        self.directed.insert((b, c), f);
        self.directed.insert((c, a), f);
    }

    fn apex(&self, f: usize, u: usize, v: usize) -> usize {
        self.faces[f]
            .iter()
            .copied()
            .find(|&w| w != u && w != v)
            .expect("invariant: a patch triangle has a vertex opposite each edge")
    }

    fn angle_at(&self, apex: usize, u: usize, v: usize) -> f64 {
        let a = self.positions[u] - self.positions[apex];
        let b = self.positions[v] - self.positions[apex];
        let denom = a.norm() * b.norm();
        if denom < 1e-300 {
            return 0.0;
        }
        (a.dot(&b) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Flip the edge `u-v` if the opposite angles sum past π.
    fn relax_edge(&mut self, u: usize, v: usize) -> bool {
        let (Some(&f), Some(&g)) = (self.directed.get(&(u, v)), self.directed.get(&(v, u))) else {
            return false;
        };
        let p = self.apex(f, u, v);
        let q = self.apex(g, v, u);
        if p == q || self.directed.contains_key(&(p, q)) || self.directed.contains_key(&(q, p)) {
            return false;
        }
        if self.angle_at(p, u, v) + self.angle_at(q, u, v) <= PI + 1e-12 {
            return false;
        }

        self.directed.remove(&(u, v));
        self.directed.remove(&(v, u));
        self.faces[f] = [u, q, p];
        self.faces[g] = [q, v, p];
        self.index_face(f);
        self.index_face(g);
        true
    }

    /// Sweep every interior edge until no flip happens or the sweep budget runs out.
    fn relax_all(&mut self, max_sweeps: usize) -> Relaxation {
        let mut total = 0;
        for sweep in 0..max_sweeps {
            let mut edges: Vec<(usize, usize)> = self
                .directed
                .keys()
                .copied()
                .filter(|&(u, v)| u < v && self.directed.contains_key(&(v, u)))
                .collect();
            edges.sort_unstable();

            let flips = edges
                .into_iter()
                .filter(|&(u, v)| self.relax_edge(u, v))
                .count();
            total += flips;
            trace!(sweep, flips, "relaxation sweep");
            if flips == 0 {
                return Relaxation {
                    flips: total,
                    settled: true,
                };
            }
        }
        Relaxation {
            flips: total,
            settled: false,
        }
    }

    /// Split `f` at its centroid if it is too coarse for all three corners.
    fn split_if_coarse(&mut self, f: usize, alpha: f64) -> bool {
        let face = self.faces[f];
        let centroid = Point3::from(
            face.iter()
                .map(|&v| self.positions[v].coords)
                .sum::<Vector3<f64>>()
                / 3.0,
        );
        let sigma = face.iter().map(|&v| self.scales[v]).sum::<f64>() / 3.0;

        let coarse = face.iter().all(|&m| {
            let d = (self.positions[m] - centroid).norm();
            d > alpha * sigma && d > alpha * self.scales[m]
        });
        if !coarse {
            return false;
        }

        let [a, b, c] = face;
        let x = self.positions.len();
        self.positions.push(centroid);
        self.scales.push(sigma);
        self.boundary.push(false);

        self.faces[f] = [a, b, x];
        self.index_face(f);
        self.push_face([b, c, x]);
        self.push_face([c, a, x]);

        for (u, v) in [(a, b), (b, c), (c, a)] {
            self.relax_edge(u, v);
        }
        true
    }

    /// One pass over the faces that existed when it started, stopping once
    /// the patch holds `max_vertices` vertices.
    fn split_pass(&mut self, alpha: f64, max_vertices: usize) -> usize {
        let count = self.faces.len();
        let mut created = 0;
        for f in 0..count {
            if self.positions.len() >= max_vertices {
                break;
            }
            if self.split_if_coarse(f, alpha) {
                created += 1;
            }
        }
        created
    }
}

/// Refine a triangulated patch in place.
///
/// Every vertex gets a scale from the mean length of its boundary edges (or
/// its stored `scale` when it has none). Split passes then run until a pass
/// splits nothing, `max_passes` is reached or the patch holds `max_vertices`
/// vertices; after each productive pass all interior edges are relaxed to a
/// local Delaunay configuration. Hitting either budget logs a warning.
///
/// The refinement runs on a private copy and the result is swapped in at the
/// end, so the caller sees either the input or the fully refined patch.
/// Existing vertices keep their ids; new vertices are appended.
///
/// # Errors
///
/// - [`MeshError::EmptyMesh`] if the mesh has no faces
/// - [`MeshError::NotTriangleMesh`] if any face is not a triangle
/// - [`MeshError::InvalidParameter`] for a negative or non-finite `alpha`
pub fn refine<I: MeshIndex>(mesh: &mut Mesh<I>, options: &LiepaOptions) -> Result<()> {
    refine_with_progress(mesh, options, &Progress::none())
}

/// [`refine`] with progress reporting, one step per split pass.
pub fn refine_with_progress<I: MeshIndex>(
    mesh: &mut Mesh<I>,
    options: &LiepaOptions,
    progress: &Progress,
) -> Result<()> {
    options.validate()?;
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }

    let mut patch = Patch::from_mesh(mesh)?;
    let start_vertices = patch.positions.len();

    let mut passes = 0;
    while passes < options.max_passes {
        if patch.positions.len() >= options.max_vertices {
            warn!(
                vertices = patch.positions.len(),
                max_vertices = options.max_vertices,
                passes,
                "vertex budget reached, refinement stopped"
            );
            break;
        }
        progress.report(passes, options.max_passes, "Liepa refinement");
        let created = patch.split_pass(options.alpha, options.max_vertices);
        passes += 1;
        if created == 0 {
            break;
        }
        let relaxation = patch.relax_all(options.max_relax_sweeps);
        if !relaxation.settled && options.max_relax_sweeps > 0 {
            warn!(
                pass = passes,
                sweeps = options.max_relax_sweeps,
                "relaxation budget exhausted before the patch was locally Delaunay"
            );
        }
        debug!(
            pass = passes,
            split = created,
            flips = relaxation.flips,
            faces = patch.faces.len(),
            "refinement pass"
        );
    }
    progress.report(options.max_passes, options.max_passes, "Liepa refinement");

    debug!(
        passes,
        added = patch.positions.len() - start_vertices,
        faces = patch.faces.len(),
        "refinement finished"
    );

    let refined = patch.into_mesh()?;
    mesh.replace_with(refined);
    Ok(())
}

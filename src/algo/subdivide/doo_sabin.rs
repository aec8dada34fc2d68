//! Doo-Sabin subdivision for polygon meshes.

use std::collections::HashMap;
use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, FaceId, Mesh, MeshIndex, VertexId};

use super::Subdivision;

/// Caller-supplied corner weights, keyed by face degree.
///
/// The list for degree `k` holds exactly `k` weights; entry `t` multiplies the
/// vertex `t` steps after the corner (CCW). Degrees without an entry use the
/// builtin Doo-Sabin formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightOverrides {
    weights: HashMap<usize, Vec<f64>>,
}

impl WeightOverrides {
    /// An empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the weights for faces of degree `degree`.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidParameter`] if `degree < 3` or the list does not
    /// hold exactly `degree` entries.
    pub fn insert(&mut self, degree: usize, weights: Vec<f64>) -> Result<()> {
        Self::check(degree, &weights)?;
        self.weights.insert(degree, weights);
        Ok(())
    }

    /// Builder form of [`WeightOverrides::insert`].
    pub fn with(mut self, degree: usize, weights: Vec<f64>) -> Result<Self> {
        self.insert(degree, weights)?;
        Ok(self)
    }

    /// The weights for `degree`, if overridden.
    pub fn get(&self, degree: usize) -> Option<&[f64]> {
        self.weights.get(&degree).map(Vec::as_slice)
    }

    /// Re-check every entry (deserialised overrides bypass [`insert`](Self::insert)).
    pub fn validate(&self) -> Result<()> {
        self.weights
            .iter()
            .try_for_each(|(&degree, weights)| Self::check(degree, weights))
    }

    fn check(degree: usize, weights: &[f64]) -> Result<()> {
        if degree < 3 {
            return Err(MeshError::invalid_param("degree", degree, "faces have at least 3 corners"));
        }
        if weights.len() != degree {
            return Err(MeshError::invalid_param(
                "weights",
                format!("{} entries for degree {}", weights.len(), degree),
                "need exactly one weight per corner",
            ));
        }
        Ok(())
    }
}

/// How the new corner points of a face are placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DooSabinPoints {
    /// Average of the corner, its two edge midpoints and the face centroid.
    Geometric,
    /// Doo-Sabin weights: `w₀ = 1/4 + 5/(4k)`, `wᵢ = (3 + 2cos(2πi/k)) / (4k)`.
    #[default]
    DooSabin,
    /// Catmull-Clark style weights: `w₀ = 1/2 + 1/(4k)`, the two ring
    /// neighbours `1/8 + 1/(4k)`, everything else `1/(4k)`.
    CatmullClark,
    /// Bilinear `[9, 3, 1, 3] / 16` on quads, Doo-Sabin weights elsewhere.
    Bilinear,
    /// Caller-supplied weights.
    Custom(WeightOverrides),
}

impl DooSabinPoints {
    /// Corner weights for a face of degree `k`, or `None` for the geometric rule.
    pub fn corner_weights(&self, k: usize) -> Option<Vec<f64>> {
        match self {
            DooSabinPoints::Geometric => None,
            DooSabinPoints::DooSabin => Some(doo_sabin_weights(k)),
            DooSabinPoints::CatmullClark => Some(catmull_clark_weights(k)),
            DooSabinPoints::Bilinear if k == 4 => {
                Some(vec![9.0 / 16.0, 3.0 / 16.0, 1.0 / 16.0, 3.0 / 16.0])
            }
            DooSabinPoints::Bilinear => Some(doo_sabin_weights(k)),
            DooSabinPoints::Custom(overrides) => Some(
                overrides
                    .get(k)
                    .map(<[f64]>::to_vec)
                    .unwrap_or_else(|| doo_sabin_weights(k)),
            ),
        }
    }
}

fn doo_sabin_weights(k: usize) -> Vec<f64> {
    let k_f = k as f64;
    (0..k)
        .map(|i| {
            if i == 0 {
                0.25 + 5.0 / (4.0 * k_f)
            } else {
                (3.0 + 2.0 * (2.0 * PI * i as f64 / k_f).cos()) / (4.0 * k_f)
            }
        })
        .collect()
}

fn catmull_clark_weights(k: usize) -> Vec<f64> {
    let base = 1.0 / (4.0 * k as f64);
    (0..k)
        .map(|i| {
            if i == 0 {
                0.5 + base
            } else if i == 1 || i == k - 1 {
                0.125 + base
            } else {
                base
            }
        })
        .collect()
}

/// Doo-Sabin subdivision.
///
/// Three families of faces are built from the per-corner points:
///
/// - **F-faces**: one per old face, its corner points in the original order
/// - **E-faces**: one quad per interior edge, joining the four corner points
///   around it
/// - **V-faces**: one per interior vertex of valency ≥ 3, the ring of corner
///   points contributed by the faces around it
///
/// Boundary edges and boundary vertices get no E-/V-face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DooSabin {
    /// Corner point placement.
    pub points: DooSabinPoints,
}

impl DooSabin {
    /// Doo-Sabin with the given corner point rule.
    pub fn new(points: DooSabinPoints) -> Self {
        Self { points }
    }

    /// Set the corner point rule.
    pub fn with_points(mut self, points: DooSabinPoints) -> Self {
        self.points = points;
        self
    }
}

/// Per-pass cache of corner weights keyed by face degree.
struct WeightTable<'a> {
    points: &'a DooSabinPoints,
    rows: HashMap<usize, Option<Vec<f64>>>,
}

impl<'a> WeightTable<'a> {
    fn new(points: &'a DooSabinPoints) -> Self {
        Self {
            points,
            rows: HashMap::new(),
        }
    }

    fn row(&mut self, k: usize) -> Option<&[f64]> {
        let points = self.points;
        self.rows
            .entry(k)
            .or_insert_with(|| points.corner_weights(k))
            .as_deref()
    }
}

/// Faces around an interior vertex in CCW order (seen from the outside).
///
/// Faces are chained through shared edges starting at the vertex's first
/// edge. The chain comes out CCW when the first edge ends at `v` in the first
/// face's traversal; otherwise it is reversed. Returns `None` for boundary and
/// non-manifold vertices.
pub(crate) fn faces_around<I: MeshIndex>(mesh: &Mesh<I>, v: VertexId<I>) -> Option<Vec<FaceId<I>>> {
    let vertex = mesh.vertex(v);
    let first_edge = *vertex.edges().first()?;
    let start = mesh.edge(first_edge).faces().first()?;

    let mut ring = vec![start];
    let mut edge = first_edge;
    let mut face = mesh.edge(first_edge).faces().other(start)?;

    while face != start {
        if ring.len() >= vertex.faces().len() {
            return None;
        }
        ring.push(face);
        let current = mesh.face(face);
        let (incoming, outgoing) = current.corner_edges(current.corner_of(v)?);
        edge = if incoming.edge == edge {
            outgoing.edge
        } else {
            incoming.edge
        };
        face = mesh.edge(edge).faces().other(face)?;
    }

    if ring.len() != vertex.faces().len() {
        return None;
    }

    let entry = mesh
        .face_edges(start)
        .iter()
        .find(|d| d.edge == first_edge)?;
    if entry.target(mesh) != v {
        ring[1..].reverse();
    }
    Some(ring)
}

impl DooSabin {
    fn corner_points<I: MeshIndex>(
        &self,
        old: &Mesh<I>,
        new: &mut Mesh<I>,
    ) -> Vec<Vec<VertexId<I>>> {
        let mut table = WeightTable::new(&self.points);
        let mut corner_points = Vec::with_capacity(old.num_faces());

        for (f, face) in old.faces() {
            let ring: Vec<Point3<f64>> = face.vertices().iter().map(|&v| *old.position(v)).collect();
            let k = ring.len();
            let ids: Vec<VertexId<I>> = match table.row(k) {
                Some(weights) => (0..k)
                    .map(|j| {
                        let p: Vector3<f64> = weights
                            .iter()
                            .enumerate()
                            .map(|(t, &w)| ring[(j + t) % k].coords * w)
                            .sum();
                        new.add_vertex(Point3::from(p))
                    })
                    .collect(),
                None => {
                    let c = old.face_centroid(f).coords;
                    (0..k)
                        .map(|j| {
                            let v = ring[j].coords;
                            let prev = ring[(j + k - 1) % k].coords;
                            let next = ring[(j + 1) % k].coords;
                            let mid_prev = (v + prev) * 0.5;
                            let mid_next = (v + next) * 0.5;
                            new.add_vertex(Point3::from((v + mid_prev + mid_next + c) * 0.25))
                        })
                        .collect()
                }
            };
            corner_points.push(ids);
        }

        corner_points
    }

    /// The quad closing the gap across an interior edge.
    fn edge_face<I: MeshIndex>(
        old: &Mesh<I>,
        corner_points: &[Vec<VertexId<I>>],
        e: EdgeId<I>,
    ) -> Option<[VertexId<I>; 4]> {
        let edge = old.edge(e);
        let (f, g) = (edge.faces().first()?, edge.faces().second()?);
        let [u, v] = edge.vertices();

        // `a` walks the edge u -> v
        let f_inverted = old.face_edges(f).iter().find(|d| d.edge == e)?.inverted;
        let (a, b) = if f_inverted { (g, f) } else { (f, g) };

        let point = |face: FaceId<I>, w: VertexId<I>| -> Option<VertexId<I>> {
            let corner = old.face(face).corner_of(w)?;
            Some(corner_points[face.index()][corner])
        };

        Some([point(a, u)?, point(b, u)?, point(b, v)?, point(a, v)?])
    }
}

impl Subdivision for DooSabin {
    fn name(&self) -> &'static str {
        "Doo-Sabin"
    }

    fn apply_to<I: MeshIndex>(&self, mesh: &mut Mesh<I>) -> Result<()> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if let DooSabinPoints::Custom(overrides) = &self.points {
            overrides.validate()?;
        }

        let old: &Mesh<I> = mesh;
        let corners: usize = old.faces().map(|(_, f)| f.degree()).sum();
        let mut new = Mesh::with_capacity(
            corners,
            2 * corners,
            old.num_faces() + old.num_edges() + old.num_vertices(),
        );

        let corner_points = self.corner_points(old, &mut new);

        // F-faces
        for ring in &corner_points {
            new.add_face(ring)?;
        }

        // E-faces
        for e in old.edge_ids() {
            match Self::edge_face(old, &corner_points, e) {
                Some(quad) => {
                    new.add_face(&quad)?;
                }
                None => trace!(edge = e.index(), "no E-face for boundary edge"),
            }
        }

        // V-faces
        for v in old.vertex_ids() {
            if old.valency(v) < 3 {
                continue;
            }
            let Some(faces) = faces_around(old, v) else {
                trace!(vertex = v.index(), "no V-face for boundary or non-manifold vertex");
                continue;
            };
            let ring: Option<Vec<VertexId<I>>> = faces
                .iter()
                .map(|&f| {
                    let corner = old.face(f).corner_of(v)?;
                    Some(corner_points[f.index()][corner])
                })
                .collect();
            if let Some(ring) = ring {
                new.add_face(&ring)?;
            }
        }

        trace!(
            vertices = new.num_vertices(),
            faces = new.num_faces(),
            "Doo-Sabin pass built"
        );

        mesh.replace_with(new);
        Ok(())
    }
}

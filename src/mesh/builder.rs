//! Mesh construction and export utilities.
//!
//! Loaders and writers talk to the core through face-vertex lists: positions in
//! insertion order and, for each face, its ordered vertex indices.

use nalgebra::Point3;

use super::index::{MeshIndex, VertexId};
use super::polymesh::Mesh;
use crate::error::{MeshError, Result};

/// Build a mesh from vertex positions and polygon faces of any degree.
///
/// # Example
/// ```
/// use cobble::mesh::{build_from_polygons, Mesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.5, 1.5, 0.0),
/// ];
/// let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3], vec![3, 2, 4]];
///
/// let mesh: Mesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// assert_eq!(mesh.num_edges(), 6);
/// ```
///
/// # Errors
///
/// [`MeshError::EmptyMesh`] when `faces` is empty, otherwise any error of
/// [`Mesh::add_face`].
pub fn build_from_polygons<I, F>(vertices: &[Point3<f64>], faces: &[F]) -> Result<Mesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let corners: usize = faces.iter().map(|f| f.as_ref().len()).sum();
    let mut mesh = Mesh::with_capacity(vertices.len(), corners / 2 + faces.len(), faces.len());

    for &pos in vertices {
        mesh.add_vertex(pos);
    }

    let mut ring: Vec<VertexId<I>> = Vec::new();
    for face in faces {
        ring.clear();
        for &vi in face.as_ref() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex {
                    vertex: vi,
                    num_vertices: vertices.len(),
                });
            }
            ring.push(VertexId::new(vi));
        }
        mesh.add_face(&ring)?;
    }

    Ok(mesh)
}

/// Build a mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use cobble::mesh::{build_from_triangles, Mesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: Mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<Mesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Build a mesh from vertices and quad faces (counter-clockwise).
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<Mesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Convert a mesh back to a face-vertex representation.
///
/// Vertices come out in insertion order (positions only), faces in insertion
/// order as ordered vertex indices.
pub fn to_face_vertex<I: MeshIndex>(mesh: &Mesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertices().map(|(_, v)| v.position).collect();

    let faces: Vec<Vec<usize>> = mesh
        .faces()
        .map(|(_, f)| f.vertices().iter().map(|v| v.index()).collect())
        .collect();

    (vertices, faces)
}

/// Convert a triangle mesh to positions and index triples.
///
/// # Errors
///
/// [`MeshError::NotTriangleMesh`] if any face has more than three vertices.
pub fn to_face_vertex_triangles<I: MeshIndex>(
    mesh: &Mesh<I>,
) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let vertices: Vec<Point3<f64>> = mesh.vertices().map(|(_, v)| v.position).collect();

    let faces = mesh
        .faces()
        .map(|(fid, f)| match f.vertices() {
            &[a, b, c] => Ok([a.index(), b.index(), c.index()]),
            ring => Err(MeshError::NotTriangleMesh {
                face: fid.index(),
                degree: ring.len(),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((vertices, faces))
}

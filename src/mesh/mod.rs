//! Core mesh data structures.
//!
//! This module provides the polygon mesh representation and its topology
//! tables.
//!
//! # Overview
//!
//! The primary type is [`Mesh`], which owns dense arenas of [`Vertex`],
//! [`Edge`] and [`Face`] records. Each face stores its vertex ring and a ring of
//! [`DirectedEdge`] descriptors; each edge stores its canonical endpoints and
//! the faces on either side ([`FacePair`]); each vertex stores its incident
//! edges and adjacent faces.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use cobble::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let mut mesh: Mesh = Mesh::new();
//! let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = mesh.add_vertex(Point3::new(0.5, 1.0, 0.0));
//! mesh.add_face(&[a, b, c]).unwrap();
//!
//! assert_eq!(mesh.num_edges(), 3);
//! ```

mod builder;
mod element;
mod index;
mod polymesh;
mod tables;

pub use builder::{
    build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex,
    to_face_vertex_triangles,
};
pub use element::{DirectedEdge, Edge, Face, Vertex};
pub use index::{EdgeId, FaceId, MeshIndex, VertexId};
pub use polymesh::Mesh;
pub use tables::{EdgeTable, FacePair};

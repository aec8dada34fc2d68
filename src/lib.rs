//! # Cobble
//!
//! Polygon mesh refinement: subdivision surfaces and hole filling.
//!
//! Cobble provides a polygon mesh with explicit edge and face-adjacency tables
//! and the algorithms that rebuild it:
//!
//! - **Polygon mesh**: shared, deduplicated edges with at most two faces each,
//!   type-safe indices over 16-, 32- or 64-bit integers
//! - **Subdivision**: Catmull-Clark, Doo-Sabin and Loop, with selectable
//!   boundary handling and weight policies
//! - **Hole filling**: minimum-weight triangulation of a boundary ring and
//!   Liepa's adaptive refinement
//!
//! ## Quick Start
//!
//! ```
//! use cobble::prelude::*;
//! use cobble::algo::subdivide::{subdivide, CatmullClark, SubdivideOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mut mesh: Mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! subdivide(&mut mesh, &CatmullClark::default(), &SubdivideOptions::new(1)).unwrap();
//! assert_eq!(mesh.num_faces(), 12);
//! assert!(mesh.is_quad_mesh());
//! ```
//!
//! ## Mesh Traversal
//!
//! ```
//! use cobble::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let mesh: Mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let v = VertexId::new(0);
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // every face knows how it walks each of its edges
//! for d in mesh.face_edges(FaceId::new(0)) {
//!     println!("{:?} -> {:?}", d.source(&mesh), d.target(&mesh));
//! }
//! ```
//!
//! ## Logging
//!
//! Algorithms emit [`tracing`](https://docs.rs/tracing) events (`debug` per
//! pass, `trace` for skipped elements, `warn` when refinement hits a budget).
//! No subscriber is installed by the library.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use cobble::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::subdivide::{BoundaryPolicy, Subdivision};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex, EdgeId,
        Face, FaceId, Mesh, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh: Mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.num_faces(), 4);
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_on_boundary(v), "vertex {:?} should not be on boundary", v);
        }
    }
}

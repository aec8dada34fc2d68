//! Error types for cobble.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh construction and refinement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face or vertex ring was given fewer than three vertices.
    #[error("{count} vertices given, at least 3 are required")]
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A face references a vertex id that does not exist.
    #[error("face references invalid vertex index {vertex} (mesh has {num_vertices} vertices)")]
    InvalidVertexIndex {
        /// The invalid vertex index.
        vertex: usize,
        /// Number of vertices in the mesh.
        num_vertices: usize,
    },

    /// A face visits the same vertex more than once.
    #[error("face is degenerate (vertex {vertex} appears more than once)")]
    DegenerateFace {
        /// The repeated vertex.
        vertex: usize,
    },

    /// An edge would gain a third adjacent face.
    #[error("edge ({v0}, {v1}) already has two adjacent faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// An operation that needs triangles found a larger face.
    #[error("face {face} has {degree} vertices, a triangle mesh is required")]
    NotTriangleMesh {
        /// The offending face.
        face: usize,
        /// Its vertex count.
        degree: usize,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

//! Mesh processing algorithms.
//!
//! - **Subdivision**: Catmull-Clark, Doo-Sabin and Loop ([`subdivide`])
//! - **Hole filling**: minimum-weight ring triangulation and Liepa refinement
//!   ([`fill`])

pub mod fill;
mod progress;
pub mod subdivide;

pub use progress::Progress;

//! Progress reporting for multi-pass algorithms.
//!
//! # Example
//!
//! ```
//! use cobble::algo::Progress;
//! use cobble::algo::subdivide::{subdivide_with_progress, LoopSubdivision, SubdivideOptions};
//! use cobble::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mut mesh: Mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! subdivide_with_progress(
//!     &mut mesh,
//!     &LoopSubdivision::default(),
//!     &SubdivideOptions::new(2),
//!     &progress,
//! )
//! .unwrap();
//! ```

/// A callback receiving `(current, total, message)` updates.
///
/// `current` counts finished steps (0-based), so the last report of a run is
/// `current == total`.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// A reporter that discards every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

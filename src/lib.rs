//! # maskcarve
//!
//! Silhouette-consistent pruning of reconstructed point clouds and meshes.
//!
//! This is the umbrella crate that provides convenient access to all maskcarve functionality.
//! You can use this crate to get everything in one place, or use individual crates for
//! more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Cameras, masks, structured point clouds and meshes
//! - **Carving**: Projection, visibility tests and the multi-view carver
//! - **I/O**: PLY, mask directories and camera files
//!
//! ## Quick Start
//!
//! ```rust
//! use maskcarve::prelude::*;
//!
//! # fn main() -> maskcarve::Result<()> {
//! let camera = Camera::new("frame_000", Matrix3::identity(), Vector3::zeros(), 10.0, 10.0, 4, 4)?;
//! let mut masks = MaskStore::new(MaskPolicy::default());
//! masks.insert("frame_000", Mask::filled(4, 4, true));
//!
//! let cloud = PointCloud::from_points(vec![Point3::new(0.0_f64, 0.0, 1.0)]);
//! let outcome = SilhouetteCarver::default().carve(&cloud, &[camera], &masks)?;
//! assert_eq!(outcome.cloud.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core, carving and io
//! - `carving`: Projection and carving algorithms
//! - `io`: File format support
//! - `all`: Enables all features

// Re-export core functionality
pub use maskcarve_core::*;

// Re-export sub-crates
#[cfg(feature = "carving")]
pub use maskcarve_carving as carving;

#[cfg(feature = "io")]
pub use maskcarve_io as io;

/// Convenient imports for common use cases
pub mod prelude {
    pub use maskcarve_core::*;

    #[cfg(feature = "carving")]
    pub use maskcarve_carving::*;

    #[cfg(feature = "io")]
    pub use maskcarve_io::{
        load_mask, load_mask_dir, read_cameras, read_colmap_text, read_gaussian_cameras_json,
        read_ply, view_id_from_name, write_ply, Dilation, IoError, MaskLoadOptions, PlyDocument,
        PlyEncoding,
    };
}

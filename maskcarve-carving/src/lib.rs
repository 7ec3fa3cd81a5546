//! # maskcarve carving
//!
//! Multi-view silhouette carving: project every point into every calibrated
//! view that has a binary mask, and remove the points some view sees on
//! background. Meshes are carved through their vertices and then re-indexed.
//!
//! ```rust
//! use maskcarve_core::{Camera, Mask, MaskPolicy, MaskStore, PointCloud};
//! use maskcarve_carving::SilhouetteCarver;
//! use nalgebra::{Matrix3, Point3, Vector3};
//!
//! fn main() -> maskcarve_core::Result<()> {
//!     let camera = Camera::new("front", Matrix3::identity(), Vector3::zeros(), 2.0, 2.0, 4, 4)?;
//!
//!     let mut mask = Mask::filled(4, 4, false);
//!     mask.set(2, 2, true);
//!     let mut masks = MaskStore::new(MaskPolicy::default());
//!     masks.insert("front", mask);
//!
//!     let cloud = PointCloud::from_points(vec![
//!         Point3::new(0.0_f64, 0.0, 1.0), // lands on pixel (2, 2)
//!         Point3::new(0.5, 0.5, 1.0),     // lands on pixel (3, 3): background
//!     ]);
//!
//!     let outcome = SilhouetteCarver::default().carve(&cloud, &[camera], &masks)?;
//!     assert_eq!(outcome.survivors, vec![0]);
//!     Ok(())
//! }
//! ```

pub mod carver;
pub mod projection;
pub mod topology;
pub mod visibility;

// Re-export commonly used items
pub use carver::*;
pub use projection::*;
pub use topology::*;
pub use visibility::*;

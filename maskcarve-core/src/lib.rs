//! Core data structures and traits for maskcarve
//!
//! This crate provides the value types the carving algorithms operate on:
//! calibrated cameras, binary masks, structured point clouds with arbitrary
//! attribute schemas, and triangle meshes. It performs no file I/O.

pub mod camera;
pub mod error;
pub mod mask;
pub mod mesh;
pub mod point;
pub mod point_cloud;
pub mod schema;
pub mod structured;
pub mod traits;

pub use camera::*;
pub use error::*;
pub use mask::*;
pub use mesh::*;
pub use point::*;
pub use point_cloud::*;
pub use schema::*;
pub use structured::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point2, Point3, Vector3};

/// A mesh whose vertices carry an arbitrary attribute schema
pub type StructuredMesh = TriangleMesh<StructuredPointCloud>;

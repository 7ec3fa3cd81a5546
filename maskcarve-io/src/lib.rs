//! I/O operations for maskcarve
//!
//! The carving crates never touch the file system. This crate adapts the
//! formats a photogrammetry or Gaussian splatting pipeline leaves behind:
//! PLY point clouds and meshes with arbitrary vertex attributes, directories
//! of grayscale mask images, and camera files from COLMAP or 3DGS training.

pub mod cameras;
pub mod error;
pub mod masks;
pub mod ply;

pub use cameras::{read_cameras, read_colmap_text, read_gaussian_cameras_json};
pub use error::*;
pub use masks::{load_mask, load_mask_dir, view_id_from_name, Dilation, MaskLoadOptions};
pub use ply::{read_ply, write_ply, PlyDocument, PlyEncoding};

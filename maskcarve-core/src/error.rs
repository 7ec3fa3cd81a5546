//! Error types for maskcarve

use thiserror::Error;

/// Main error type for maskcarve operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid camera '{view_id}': {reason}")]
    InvalidCamera { view_id: String, reason: String },

    #[error("Camera '{view_id}' is missing required field '{field}'")]
    MissingCameraField { view_id: String, field: &'static str },

    #[error("Face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error(
        "Mask for view '{view_id}' is {}x{} but the camera image is {}x{}",
        .mask.0, .mask.1, .camera.0, .camera.1
    )]
    MaskDimensionMismatch {
        view_id: String,
        camera: (u32, u32),
        mask: (u32, u32),
    },
}

/// Result type alias for maskcarve operations
pub type Result<T> = std::result::Result<T, Error>;

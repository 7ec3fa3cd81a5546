//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur during I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("PLY error: {message}")]
    Ply { message: String },

    #[error("COLMAP parse error at line {line}: {message}")]
    Colmap { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] maskcarve_core::Error),
}

impl IoError {
    pub(crate) fn ply(message: impl Into<String>) -> Self {
        IoError::Ply {
            message: message.into(),
        }
    }
}

/// Result type alias for I/O operations
pub type Result<T> = std::result::Result<T, IoError>;

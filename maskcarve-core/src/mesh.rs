//! Triangle meshes over an arbitrary vertex container

use crate::traits::Carvable;
use crate::{Error, Result};

/// A triangle as three vertex indices
pub type Face = [usize; 3];

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh<V> {
    pub vertices: V,
    pub faces: Vec<Face>,
}

impl<V: Carvable> TriangleMesh<V> {
    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: V, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// A mesh without faces, i.e. a plain point cloud
    pub fn from_vertices(vertices: V) -> Self {
        Self {
            vertices,
            faces: Vec::new(),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.point_count()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Check that every face index is in range
    pub fn validate(&self) -> Result<()> {
        validate_faces(&self.faces, self.vertex_count())
    }
}

/// Check that every index of every face is below `vertex_count`.
///
/// Reports the first offending face and index.
pub fn validate_faces(faces: &[Face], vertex_count: usize) -> Result<()> {
    for (face_index, face) in faces.iter().enumerate() {
        if let Some(&index) = face.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::FaceIndexOutOfRange {
                face: face_index,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

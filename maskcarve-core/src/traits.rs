//! Core traits for maskcarve
//!
//! These are the seams between the carving algorithms and whatever produced
//! the geometry and the cameras.

use crate::camera::Camera;
use crate::Result;
use nalgebra::Point3;

/// Anything with a world-space position
pub trait HasPosition {
    fn position(&self) -> Point3<f64>;
}

impl HasPosition for Point3<f32> {
    fn position(&self) -> Point3<f64> {
        self.cast()
    }
}

impl HasPosition for Point3<f64> {
    fn position(&self) -> Point3<f64> {
        *self
    }
}

/// An indexed collection of points that can be carved.
///
/// Identity is positional: point `i` is whatever sits at index `i`. Carving only
/// ever reads positions and copies whole records, so implementors are free to
/// carry any payload alongside the coordinates.
pub trait Carvable: Sized {
    /// Number of points
    fn point_count(&self) -> usize;

    /// World-space position of point `index`
    fn point_position(&self, index: usize) -> Point3<f64>;

    /// Build a new collection from the points at `indices`, in that order.
    ///
    /// Records are copied verbatim.
    fn gather(&self, indices: &[usize]) -> Self;
}

/// Something that can be turned into a calibrated [`Camera`] on demand.
///
/// Carving only resolves a source once it knows the view has a mask, so a
/// malformed record for an unsegmented view is never an error.
pub trait CameraSource {
    /// Identifier matching the mask file stem
    fn view_id(&self) -> &str;

    /// Resolve into a validated camera
    fn to_camera(&self) -> Result<Camera>;
}

impl CameraSource for Camera {
    fn view_id(&self) -> &str {
        &self.view_id
    }

    fn to_camera(&self) -> Result<Camera> {
        Ok(self.clone())
    }
}

impl<C: CameraSource> CameraSource for &C {
    fn view_id(&self) -> &str {
        (*self).view_id()
    }

    fn to_camera(&self) -> Result<Camera> {
        (*self).to_camera()
    }
}

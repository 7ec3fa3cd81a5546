//! Pinhole projection of world points into camera images

use maskcarve_core::Camera;
use nalgebra::{Matrix3, Point2, Point3};

/// Where a world point lands in one camera's image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Inside the image, `0 <= u < width` and `0 <= v < height`
    InFrame(Point2<f64>),
    /// In front of the camera but outside the image
    OutOfFrame(Point2<f64>),
    /// Not projectable: on or behind the image plane, or non-finite
    Degenerate,
}

impl Projection {
    pub fn in_bounds(&self) -> bool {
        matches!(self, Projection::InFrame(_))
    }

    /// Pixel coordinate, if the projection is well defined
    pub fn pixel(&self) -> Option<Point2<f64>> {
        match *self {
            Projection::InFrame(p) | Projection::OutOfFrame(p) => Some(p),
            Projection::Degenerate => None,
        }
    }
}

/// A camera with its intrinsic matrix resolved, for projecting many points
#[derive(Debug, Clone)]
pub struct Projector<'a> {
    camera: &'a Camera,
    intrinsics: Matrix3<f64>,
    width: f64,
    height: f64,
}

impl<'a> Projector<'a> {
    pub fn new(camera: &'a Camera) -> Self {
        Self {
            camera,
            intrinsics: camera.intrinsic_matrix(),
            width: camera.width() as f64,
            height: camera.height() as f64,
        }
    }

    pub fn camera(&self) -> &Camera {
        self.camera
    }

    /// Project a world-space point.
    ///
    /// Points with non-positive camera-frame depth are [`Projection::Degenerate`];
    /// the perspective divide is never performed for them.
    pub fn project(&self, point: &Point3<f64>) -> Projection {
        if !point.iter().all(|c| c.is_finite()) {
            return Projection::Degenerate;
        }

        let local = self.camera.world_to_camera(point);
        if !(local.z > 0.0) {
            return Projection::Degenerate;
        }

        let homogeneous = self.intrinsics * local.coords;
        let u = homogeneous.x / homogeneous.z;
        let v = homogeneous.y / homogeneous.z;
        if !(u.is_finite() && v.is_finite()) {
            return Projection::Degenerate;
        }

        let pixel = Point2::new(u, v);
        if u >= 0.0 && u < self.width && v >= 0.0 && v < self.height {
            Projection::InFrame(pixel)
        } else {
            Projection::OutOfFrame(pixel)
        }
    }
}

/// Project a single world-space point into `camera`
pub fn project(point: &Point3<f64>, camera: &Camera) -> Projection {
    Projector::new(camera).project(point)
}

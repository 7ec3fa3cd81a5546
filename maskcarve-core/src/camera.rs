//! Calibrated pinhole cameras
//!
//! A [`Camera`] is an immutable view: world-to-camera extrinsics, focal lengths
//! and the image size. The principal point is always the image center because
//! the reconstructions this crate consumes never carry a separate one.
//!
//! Extrinsics follow the COLMAP convention: `p_cam = R * p_world + t`.

use crate::traits::CameraSource;
use crate::{Error, Result};
use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// One calibrated view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub(crate) view_id: String,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    focal_x: f64,
    focal_y: f64,
    width: u32,
    height: u32,
}

impl Camera {
    /// Create a camera from a world-to-camera rotation and translation.
    ///
    /// Fails with [`Error::InvalidCamera`] unless both focal lengths are finite and
    /// positive, the image is non-empty and the extrinsics are finite.
    pub fn new(
        view_id: impl Into<String>,
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        focal_x: f64,
        focal_y: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let view_id = view_id.into();
        let invalid = |reason: &str| Error::InvalidCamera {
            view_id: view_id.clone(),
            reason: reason.to_string(),
        };

        if !(focal_x.is_finite() && focal_x > 0.0) {
            return Err(invalid("focal_x must be positive"));
        }
        if !(focal_y.is_finite() && focal_y > 0.0) {
            return Err(invalid("focal_y must be positive"));
        }
        if width == 0 || height == 0 {
            return Err(invalid("image size must be non-zero"));
        }
        if rotation.iter().any(|v| !v.is_finite()) || translation.iter().any(|v| !v.is_finite()) {
            return Err(invalid("extrinsics must be finite"));
        }

        Ok(Self {
            view_id,
            rotation,
            translation,
            focal_x,
            focal_y,
            width,
            height,
        })
    }

    /// Create a camera from a COLMAP `qvec` (`[qw, qx, qy, qz]`) and `tvec`.
    pub fn from_quaternion(
        view_id: impl Into<String>,
        qvec: [f64; 4],
        tvec: Vector3<f64>,
        focal_x: f64,
        focal_y: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let view_id = view_id.into();
        let quaternion = Quaternion::new(qvec[0], qvec[1], qvec[2], qvec[3]);
        if !(quaternion.norm() > f64::EPSILON) {
            return Err(Error::InvalidCamera {
                view_id,
                reason: "rotation quaternion has zero length".to_string(),
            });
        }
        let rotation = UnitQuaternion::from_quaternion(quaternion).to_rotation_matrix();

        Self::new(
            view_id,
            rotation.into_inner(),
            tvec,
            focal_x,
            focal_y,
            width,
            height,
        )
    }

    /// Create a camera from a camera-to-world rotation and the camera center,
    /// as stored in Gaussian splatting `cameras.json` files.
    pub fn from_camera_to_world(
        view_id: impl Into<String>,
        rotation: Matrix3<f64>,
        center: Point3<f64>,
        focal_x: f64,
        focal_y: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let world_to_camera = rotation.transpose();
        let translation = -(world_to_camera * center.coords);
        Self::new(
            view_id,
            world_to_camera,
            translation,
            focal_x,
            focal_y,
            width,
            height,
        )
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    /// World-to-camera rotation
    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// World-to-camera translation
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn focal_x(&self) -> f64 {
        self.focal_x
    }

    pub fn focal_y(&self) -> f64 {
        self.focal_y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Principal point `(cx, cy)`, always the image center
    pub fn principal_point(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// The pinhole intrinsic matrix `K`
    pub fn intrinsic_matrix(&self) -> Matrix3<f64> {
        let (cx, cy) = self.principal_point();
        Matrix3::new(self.focal_x, 0.0, cx, 0.0, self.focal_y, cy, 0.0, 0.0, 1.0)
    }

    /// Transform a world-space point into this camera's frame
    pub fn world_to_camera(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Camera center in world coordinates
    pub fn center(&self) -> Point3<f64> {
        Point3::from(-(self.rotation.transpose() * self.translation))
    }
}

/// A camera as delivered by an external parser, with every field optional.
///
/// [`CameraRecord::resolve`] turns it into a validated [`Camera`], naming the
/// first missing field if there is one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub view_id: String,
    #[serde(default)]
    pub rotation: Option<Matrix3<f64>>,
    #[serde(default)]
    pub translation: Option<Vector3<f64>>,
    #[serde(default)]
    pub focal_x: Option<f64>,
    #[serde(default)]
    pub focal_y: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl CameraRecord {
    /// Create an empty record for `view_id`
    pub fn new(view_id: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            ..Self::default()
        }
    }

    /// Validate and convert into a [`Camera`]
    pub fn resolve(&self) -> Result<Camera> {
        let missing = |field: &'static str| Error::MissingCameraField {
            view_id: self.view_id.clone(),
            field,
        };

        Camera::new(
            self.view_id.clone(),
            self.rotation.ok_or_else(|| missing("rotation"))?,
            self.translation.ok_or_else(|| missing("translation"))?,
            self.focal_x.ok_or_else(|| missing("focal_x"))?,
            self.focal_y.ok_or_else(|| missing("focal_y"))?,
            self.width.ok_or_else(|| missing("width"))?,
            self.height.ok_or_else(|| missing("height"))?,
        )
    }
}

impl From<Camera> for CameraRecord {
    fn from(camera: Camera) -> Self {
        Self {
            view_id: camera.view_id,
            rotation: Some(camera.rotation),
            translation: Some(camera.translation),
            focal_x: Some(camera.focal_x),
            focal_y: Some(camera.focal_y),
            width: Some(camera.width),
            height: Some(camera.height),
        }
    }
}

impl CameraSource for CameraRecord {
    fn view_id(&self) -> &str {
        &self.view_id
    }

    fn to_camera(&self) -> Result<Camera> {
        self.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity_camera() -> Camera {
        Camera::new("view", Matrix3::identity(), Vector3::zeros(), 100.0, 50.0, 640, 480).unwrap()
    }

    #[test]
    fn test_intrinsic_matrix_uses_image_center() {
        let k = identity_camera().intrinsic_matrix();
        assert_eq!(k[(0, 0)], 100.0);
        assert_eq!(k[(1, 1)], 50.0);
        assert_eq!(k[(0, 2)], 320.0);
        assert_eq!(k[(1, 2)], 240.0);
        assert_eq!(k[(2, 2)], 1.0);
        assert_eq!(k[(1, 0)], 0.0);
        assert_eq!(k[(2, 0)], 0.0);
    }

    #[test]
    fn test_rejects_invalid_intrinsics() {
        let r = Matrix3::identity();
        let t = Vector3::zeros();
        assert!(Camera::new("a", r, t, 0.0, 1.0, 10, 10).is_err());
        assert!(Camera::new("a", r, t, 1.0, -2.0, 10, 10).is_err());
        assert!(Camera::new("a", r, t, f64::NAN, 1.0, 10, 10).is_err());
        assert!(Camera::new("a", r, t, 1.0, 1.0, 0, 10).is_err());
        assert!(Camera::new("a", r, t, 1.0, 1.0, 10, 0).is_err());

        match Camera::new("bad", r, t, 0.0, 1.0, 10, 10) {
            Err(Error::InvalidCamera { view_id, .. }) => assert_eq!(view_id, "bad"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_world_to_camera_applies_rotation_then_translation() {
        // 90 degrees about z
        let rotation = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let camera = Camera::new("v", rotation, Vector3::new(0.0, 0.0, 5.0), 1.0, 1.0, 2, 2).unwrap();

        let p = camera.world_to_camera(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn test_from_camera_to_world_maps_center_to_origin() {
        let rotation = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1)
            .to_rotation_matrix()
            .into_inner();
        let center = Point3::new(1.0, 2.0, -3.0);
        let camera = Camera::from_camera_to_world("v", rotation, center, 1.0, 1.0, 8, 8).unwrap();

        assert_relative_eq!(camera.world_to_camera(&center), Point3::origin(), epsilon = 1e-12);
        assert_relative_eq!(camera.center(), center, epsilon = 1e-12);
    }

    #[test]
    fn test_from_quaternion_identity() {
        let camera = Camera::from_quaternion(
            "v",
            [1.0, 0.0, 0.0, 0.0],
            Vector3::new(0.5, 0.0, 0.0),
            1.0,
            1.0,
            4,
            4,
        )
        .unwrap();
        assert_relative_eq!(*camera.rotation(), Matrix3::identity(), epsilon = 1e-12);
        assert!(Camera::from_quaternion("v", [0.0; 4], Vector3::zeros(), 1.0, 1.0, 4, 4).is_err());
    }

    #[test]
    fn test_record_reports_missing_field() {
        let mut record = CameraRecord::from(identity_camera());
        assert_eq!(record.resolve().unwrap(), identity_camera());

        record.focal_y = None;
        match record.resolve() {
            Err(Error::MissingCameraField { view_id, field }) => {
                assert_eq!(view_id, "view");
                assert_eq!(field, "focal_y");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

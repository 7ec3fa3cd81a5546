//! Per-view visibility predicate

use crate::projection::Projection;
use maskcarve_core::{Camera, Mask};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// What a view does with points that do not land inside its image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FramePolicy {
    /// A view only judges points it can see; everything else survives its pass.
    #[default]
    KeepOutside,
    /// A view removes every point that is not inside its image.
    RejectOutside,
}

/// Reads mask values at camera pixel coordinates
#[derive(Debug, Clone, Copy)]
pub struct MaskSampler<'a> {
    mask: &'a Mask,
    scale_x: f64,
    scale_y: f64,
}

impl<'a> MaskSampler<'a> {
    /// Sample `mask` directly; its raster must match the camera image.
    pub fn exact(mask: &'a Mask) -> Self {
        Self {
            mask,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Sample `mask` after scaling camera pixels into its raster
    pub fn rescaled(mask: &'a Mask, camera: &Camera) -> Self {
        Self {
            mask,
            scale_x: mask.width() as f64 / camera.width() as f64,
            scale_y: mask.height() as f64 / camera.height() as f64,
        }
    }

    /// Mask value under `pixel`. Coordinates are truncated to the containing
    /// pixel; anything off the raster reads as background.
    pub fn sample(&self, pixel: &Point2<f64>) -> bool {
        let x = (pixel.x * self.scale_x).floor();
        let y = (pixel.y * self.scale_y).floor();
        if x < 0.0 || y < 0.0 {
            return false;
        }
        let x = (x as u32).min(self.mask.width().saturating_sub(1));
        let y = (y as u32).min(self.mask.height().saturating_sub(1));
        self.mask.get(x, y).unwrap_or(false)
    }
}

/// Decide whether one view's mask removes a projected point.
///
/// An in-frame point is rejected iff it lands on background. Points outside the
/// frame, or not projectable at all, are handled by `policy`.
pub fn is_rejected(projection: &Projection, sampler: &MaskSampler<'_>, policy: FramePolicy) -> bool {
    match projection {
        Projection::InFrame(pixel) => !sampler.sample(pixel),
        Projection::OutOfFrame(_) | Projection::Degenerate => policy == FramePolicy::RejectOutside,
    }
}

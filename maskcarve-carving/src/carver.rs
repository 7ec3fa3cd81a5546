//! Sequential multi-view carving
//!
//! Views are processed in the order the cameras are given. Each view that has a
//! mask projects every point still alive and keeps the ones its mask does not
//! reject. The working set is a list of indices into the original cloud and
//! each pass builds a fresh list, so earlier passes are never modified.
//!
//! Because a view's verdict on a point depends only on that point, the final
//! survivor set is the intersection over all masked views of the points each
//! view keeps, whatever the processing order.

use crate::projection::Projector;
use crate::topology::update_topology;
use crate::visibility::{is_rejected, FramePolicy, MaskSampler};
use log::{debug, info};
use maskcarve_core::{
    validate_faces, Camera, CameraSource, Carvable, Error, Mask, MaskStore, Result, TriangleMesh,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How mask rasters relate to camera images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaskResolution {
    /// Masks must have exactly the camera's image size
    #[default]
    Exact,
    /// Masks may have any size; pixel coordinates are scaled into them
    Rescale,
}

/// Carving configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarveConfig {
    pub frame_policy: FramePolicy,
    pub mask_resolution: MaskResolution,
    /// Run each view pass on the rayon thread pool
    pub parallel: bool,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            frame_policy: FramePolicy::KeepOutside,
            mask_resolution: MaskResolution::Exact,
            parallel: true,
        }
    }
}

impl CarveConfig {
    pub fn with_frame_policy(mut self, frame_policy: FramePolicy) -> Self {
        self.frame_policy = frame_policy;
        self
    }

    pub fn with_mask_resolution(mut self, mask_resolution: MaskResolution) -> Self {
        self.mask_resolution = mask_resolution;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// What one view did to the working set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewReport {
    pub view_id: String,
    pub before: usize,
    pub after: usize,
}

impl ViewReport {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Result of carving a point cloud
#[derive(Debug, Clone)]
pub struct CarveOutcome<P> {
    /// Surviving points in their original relative order
    pub cloud: P,
    /// Original indices of the survivors, ascending
    pub survivors: Vec<usize>,
    /// Survival flag per original point
    pub kept: Vec<bool>,
    /// One entry per view that took part, in processing order
    pub views: Vec<ViewReport>,
    /// Views without a usable mask
    pub skipped_views: Vec<String>,
}

/// Result of carving a mesh
#[derive(Debug, Clone)]
pub struct MeshCarveOutcome<V> {
    pub mesh: TriangleMesh<V>,
    /// Survival flag per original vertex
    pub kept: Vec<bool>,
    pub views: Vec<ViewReport>,
    pub skipped_views: Vec<String>,
    /// Number of original faces that touched a removed vertex
    pub dropped_faces: usize,
}

/// A view that takes part in carving
struct ActiveView<'m> {
    camera: Camera,
    mask: &'m Mask,
}

/// Multi-view silhouette carver
#[derive(Debug, Clone, Default)]
pub struct SilhouetteCarver {
    config: CarveConfig,
}

impl SilhouetteCarver {
    pub fn new(config: CarveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CarveConfig {
        &self.config
    }

    /// Carve `cloud` against every camera that has a mask in `masks`.
    ///
    /// All participating cameras are resolved and checked against their masks
    /// before any point is projected, so a configuration error aborts the run
    /// without doing any work. An empty result is returned as is.
    pub fn carve<P, C>(&self, cloud: &P, cameras: &[C], masks: &MaskStore) -> Result<CarveOutcome<P>>
    where
        P: Carvable + Sync,
        C: CameraSource,
    {
        let (active, skipped_views) = self.resolve_views(cameras, masks)?;

        let mut working: Vec<usize> = (0..cloud.point_count()).collect();
        let mut views = Vec::with_capacity(active.len());

        for view in &active {
            let before = working.len();
            let survivors = self.view_pass(cloud, &working, &view.camera, view.mask);

            info!(
                "View '{}': {} -> {} points ({} removed)",
                view.camera.view_id(),
                before,
                survivors.len(),
                before - survivors.len()
            );
            views.push(ViewReport {
                view_id: view.camera.view_id().to_string(),
                before,
                after: survivors.len(),
            });
            working = survivors;
        }

        let mut kept = vec![false; cloud.point_count()];
        for &index in &working {
            kept[index] = true;
        }

        Ok(CarveOutcome {
            cloud: cloud.gather(&working),
            survivors: working,
            kept,
            views,
            skipped_views,
        })
    }

    /// Carve the vertices of `mesh`, then drop every face that lost a vertex and
    /// re-index the rest.
    ///
    /// Faces are validated first; an out-of-range index is fatal.
    pub fn carve_mesh<V, C>(
        &self,
        mesh: &TriangleMesh<V>,
        cameras: &[C],
        masks: &MaskStore,
    ) -> Result<MeshCarveOutcome<V>>
    where
        V: Carvable + Sync,
        C: CameraSource,
    {
        validate_faces(&mesh.faces, mesh.vertex_count())?;

        let outcome = self.carve(&mesh.vertices, cameras, masks)?;
        let carved = update_topology(&mesh.vertices, &mesh.faces, &outcome.kept)?;
        let dropped_faces = mesh.face_count() - carved.face_count();

        info!(
            "Mesh carved: {} -> {} vertices, {} -> {} faces",
            mesh.vertex_count(),
            carved.vertex_count(),
            mesh.face_count(),
            carved.face_count()
        );

        Ok(MeshCarveOutcome {
            mesh: carved,
            kept: outcome.kept,
            views: outcome.views,
            skipped_views: outcome.skipped_views,
            dropped_faces,
        })
    }

    /// Run one view over the `working` indices of `cloud` and return the
    /// indices it keeps, in the same relative order.
    pub fn view_pass<P>(&self, cloud: &P, working: &[usize], camera: &Camera, mask: &Mask) -> Vec<usize>
    where
        P: Carvable + Sync,
    {
        let projector = Projector::new(camera);
        let sampler = self.sampler(camera, mask);
        let policy = self.config.frame_policy;
        let keep = |&index: &usize| {
            let projection = projector.project(&cloud.point_position(index));
            !is_rejected(&projection, &sampler, policy)
        };

        if self.config.parallel {
            working.par_iter().copied().filter(|i| keep(i)).collect()
        } else {
            working.iter().copied().filter(|i| keep(i)).collect()
        }
    }

    /// Per original point, whether this single view rejects it
    pub fn rejected_by_view<P>(&self, cloud: &P, camera: &Camera, mask: &Mask) -> Result<Vec<bool>>
    where
        P: Carvable + Sync,
    {
        self.check_mask(camera, mask)?;
        let all: Vec<usize> = (0..cloud.point_count()).collect();
        let mut rejected = vec![true; all.len()];
        for index in self.view_pass(cloud, &all, camera, mask) {
            rejected[index] = false;
        }
        Ok(rejected)
    }

    fn sampler<'m>(&self, camera: &Camera, mask: &'m Mask) -> MaskSampler<'m> {
        match self.config.mask_resolution {
            MaskResolution::Exact => MaskSampler::exact(mask),
            MaskResolution::Rescale => MaskSampler::rescaled(mask, camera),
        }
    }

    fn check_mask(&self, camera: &Camera, mask: &Mask) -> Result<()> {
        let same_size = mask.width() == camera.width() && mask.height() == camera.height();
        if self.config.mask_resolution == MaskResolution::Exact && !same_size {
            return Err(Error::MaskDimensionMismatch {
                view_id: camera.view_id().to_string(),
                camera: (camera.width(), camera.height()),
                mask: (mask.width(), mask.height()),
            });
        }
        Ok(())
    }

    /// Pair every masked camera with its mask, in camera order
    fn resolve_views<'m, C: CameraSource>(
        &self,
        cameras: &[C],
        masks: &'m MaskStore,
    ) -> Result<(Vec<ActiveView<'m>>, Vec<String>)> {
        let mut active = Vec::new();
        let mut skipped = Vec::new();

        for source in cameras {
            let Some(mask) = masks.lookup(source.view_id()) else {
                debug!("No mask for view '{}', skipping", source.view_id());
                skipped.push(source.view_id().to_string());
                continue;
            };

            let camera = source.to_camera()?;
            self.check_mask(&camera, mask)?;
            active.push(ActiveView { camera, mask });
        }

        info!(
            "{} of {} views have masks",
            active.len(),
            active.len() + skipped.len()
        );
        Ok((active, skipped))
    }
}

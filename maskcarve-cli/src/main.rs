//! Carve a PLY point cloud or mesh against a directory of silhouette masks

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use maskcarve_carving::{CarveConfig, FramePolicy, MaskResolution, SilhouetteCarver};
use maskcarve_core::{MaskPolicy, TriangleMesh};
use maskcarve_io::{
    load_mask_dir, read_cameras, read_ply, write_ply, Dilation, MaskLoadOptions, PlyEncoding,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input PLY point cloud or mesh
    #[arg(short, long)]
    input: PathBuf,

    /// Directory of mask images, one per view, named after the view
    #[arg(short, long)]
    masks: PathBuf,

    /// Gaussian splatting cameras.json or a COLMAP text model directory
    #[arg(short, long)]
    cameras: PathBuf,

    /// Output PLY file
    #[arg(short, long)]
    output: PathBuf,

    /// Mask pixels brighter than this are foreground
    #[arg(long, default_value_t = 30)]
    threshold: u8,

    /// Dilate masks with a square kernel of this size
    #[arg(long, value_name = "KERNEL")]
    dilate: Option<u32>,

    /// Dilation passes; only used with --dilate
    #[arg(long, default_value_t = 2)]
    dilate_iterations: u32,

    /// Masks with fewer foreground pixels are ignored
    #[arg(long, default_value_t = 1)]
    min_foreground: usize,

    /// Also remove points that project outside a view or behind its camera
    #[arg(long)]
    reject_outside: bool,

    /// Scale mask lookups when mask and camera resolutions differ
    #[arg(long)]
    rescale_masks: bool,

    /// Write ASCII PLY instead of the input's encoding
    #[arg(long)]
    ascii: bool,
}

impl Args {
    fn mask_options(&self) -> MaskLoadOptions {
        MaskLoadOptions {
            threshold: self.threshold,
            dilation: self
                .dilate
                .map(|kernel| Dilation::new(kernel).with_iterations(self.dilate_iterations)),
            policy: MaskPolicy {
                min_foreground_pixels: self.min_foreground,
            },
        }
    }

    fn carve_config(&self) -> CarveConfig {
        let frame_policy = if self.reject_outside {
            FramePolicy::RejectOutside
        } else {
            FramePolicy::KeepOutside
        };
        let mask_resolution = if self.rescale_masks {
            MaskResolution::Rescale
        } else {
            MaskResolution::Exact
        };
        CarveConfig::default()
            .with_frame_policy(frame_policy)
            .with_mask_resolution(mask_resolution)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let document = read_ply(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let masks = load_mask_dir(&args.masks, &args.mask_options())
        .with_context(|| format!("failed to load masks from {}", args.masks.display()))?;
    let cameras = read_cameras(&args.cameras)
        .with_context(|| format!("failed to read cameras from {}", args.cameras.display()))?;

    if masks.is_empty() {
        warn!("No usable masks; output will equal the input");
    }

    let carver = SilhouetteCarver::new(args.carve_config());
    let mesh = if document.mesh.has_faces() {
        let outcome = carver
            .carve_mesh(&document.mesh, &cameras, &masks)
            .context("carving failed")?;
        info!(
            "Removed {} vertices and {} faces",
            document.mesh.vertex_count() - outcome.mesh.vertex_count(),
            outcome.dropped_faces
        );
        outcome.mesh
    } else {
        let outcome = carver
            .carve(&document.mesh.vertices, &cameras, &masks)
            .context("carving failed")?;
        info!(
            "Kept {} of {} points",
            outcome.survivors.len(),
            document.mesh.vertex_count()
        );
        TriangleMesh::from_vertices(outcome.cloud)
    };

    let encoding = if args.ascii {
        PlyEncoding::Ascii
    } else {
        document.encoding
    };
    write_ply(&args.output, &mesh, encoding, &document.comments)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!("Wrote {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "maskcarve", "-i", "in.ply", "-m", "masks", "-c", "cameras.json", "-o", "out.ply",
        ])
        .unwrap();

        let options = args.mask_options();
        assert_eq!(options, MaskLoadOptions::default());
        assert_eq!(args.carve_config(), CarveConfig::default());
        assert!(!args.ascii);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "maskcarve",
            "--input",
            "in.ply",
            "--masks",
            "masks",
            "--cameras",
            "sparse/0",
            "--output",
            "out.ply",
            "--threshold",
            "100",
            "--dilate",
            "5",
            "--dilate-iterations",
            "1",
            "--min-foreground",
            "0",
            "--reject-outside",
            "--rescale-masks",
        ])
        .unwrap();

        let options = args.mask_options();
        assert_eq!(options.threshold, 100);
        assert_eq!(options.dilation, Some(Dilation::new(5).with_iterations(1)));
        assert_eq!(options.policy.min_foreground_pixels, 0);

        let config = args.carve_config();
        assert_eq!(config.frame_policy, FramePolicy::RejectOutside);
        assert_eq!(config.mask_resolution, MaskResolution::Rescale);
    }

    #[test]
    fn test_missing_required_argument() {
        assert!(Args::try_parse_from(["maskcarve", "-i", "in.ply"]).is_err());
    }
}

//! Loading silhouette masks from grayscale images

use crate::error::Result;
use log::{debug, info};
use maskcarve_core::{Mask, MaskPolicy, MaskStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions recognised as mask images
pub const MASK_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Morphological dilation applied after thresholding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dilation {
    /// Side length of the square structuring element
    pub kernel_size: u32,
    pub iterations: u32,
}

impl Dilation {
    pub fn new(kernel_size: u32) -> Self {
        Self {
            kernel_size,
            iterations: 2,
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }
}

/// How mask images are turned into binary masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskLoadOptions {
    /// Pixels strictly brighter than this are foreground
    pub threshold: u8,
    pub dilation: Option<Dilation>,
    pub policy: MaskPolicy,
}

impl Default for MaskLoadOptions {
    fn default() -> Self {
        Self {
            threshold: 30,
            dilation: None,
            policy: MaskPolicy::default(),
        }
    }
}

/// Load a single mask image.
///
/// Colour images are converted to luma first.
pub fn load_mask<P: AsRef<Path>>(path: P, options: &MaskLoadOptions) -> Result<Mask> {
    let gray = image::open(path.as_ref())?.to_luma8();
    let (width, height) = gray.dimensions();
    let mask = Mask::from_gray(width, height, gray.as_raw(), options.threshold)?;

    Ok(match options.dilation {
        Some(dilation) => mask.dilate(dilation.kernel_size, dilation.iterations),
        None => mask,
    })
}

/// Load every mask image in `dir`, keyed by file stem.
///
/// Files are visited in name order. Entries that are not files or whose
/// extension is not a known image format are skipped; an image that fails to
/// decode is an error. Masks the policy rejects are recorded in
/// [`MaskStore::excluded`].
pub fn load_mask_dir<P: AsRef<Path>>(dir: P, options: &MaskLoadOptions) -> Result<MaskStore> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    paths.sort();

    let mut store = MaskStore::new(options.policy);
    for path in paths {
        if !path.is_file() {
            continue;
        }
        if !has_mask_extension(&path) {
            debug!("Skipping non-image file {}", path.display());
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            debug!("Skipping file with non UTF-8 name {}", path.display());
            continue;
        };

        let mask = load_mask(&path, options)?;
        store.insert(view_id_from_name(file_name), mask);
    }

    info!(
        "Loaded {} masks from {} ({} excluded)",
        store.len(),
        dir.display(),
        store.excluded().len()
    );
    Ok(store)
}

/// View id for an image or mask name: the file stem of its last path
/// component. Both `/` and `\` separate components, so names recorded on
/// another platform resolve alike.
pub fn view_id_from_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    Path::new(base)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(base)
        .to_string()
}

fn has_mask_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MASK_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

//! Camera file readers
//!
//! Both readers produce [`CameraRecord`]s rather than validated cameras: a view
//! with incomplete parameters only becomes an error if carving actually needs
//! it, i.e. if it has a mask.

use crate::error::{IoError, Result};
use crate::masks::view_id_from_name;
use log::{debug, info};
use maskcarve_core::{CameraRecord, Matrix3, Vector3};
use nalgebra::{Quaternion, UnitQuaternion};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// COLMAP camera models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModel {
    SimplePinhole,
    Pinhole,
    SimpleRadial,
    Radial,
    OpenCV,
    OpenCvFishEye,
    FullOpenCV,
    Fov,
    SimpleRadialFisheye,
    RadialFisheye,
    ThinPrismFisheye,
}

impl CameraModel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SIMPLE_PINHOLE" => Some(Self::SimplePinhole),
            "PINHOLE" => Some(Self::Pinhole),
            "SIMPLE_RADIAL" => Some(Self::SimpleRadial),
            "RADIAL" => Some(Self::Radial),
            "OPENCV" => Some(Self::OpenCV),
            "OPENCV_FISHEYE" => Some(Self::OpenCvFishEye),
            "FULL_OPENCV" => Some(Self::FullOpenCV),
            "FOV" => Some(Self::Fov),
            "SIMPLE_RADIAL_FISHEYE" => Some(Self::SimpleRadialFisheye),
            "RADIAL_FISHEYE" => Some(Self::RadialFisheye),
            "THIN_PRISM_FISHEYE" => Some(Self::ThinPrismFisheye),
            _ => None,
        }
    }

    pub fn num_params(&self) -> usize {
        match self {
            Self::SimplePinhole => 3,
            Self::Pinhole => 4,
            Self::SimpleRadial => 4,
            Self::Radial => 5,
            Self::OpenCV => 8,
            Self::OpenCvFishEye => 8,
            Self::FullOpenCV => 12,
            Self::Fov => 5,
            Self::SimpleRadialFisheye => 4,
            Self::RadialFisheye => 5,
            Self::ThinPrismFisheye => 12,
        }
    }

    /// Index of the y focal length in the parameter list
    fn focal_y_index(&self) -> usize {
        match self {
            Self::SimplePinhole
            | Self::SimpleRadial
            | Self::Radial
            | Self::SimpleRadialFisheye
            | Self::RadialFisheye => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone)]
struct ColmapCamera {
    width: u32,
    height: u32,
    focal: (f64, f64),
}

/// One entry of a Gaussian splatting `cameras.json`
#[derive(Debug, Deserialize)]
struct GaussianCameraEntry {
    img_name: String,
    width: Option<u32>,
    height: Option<u32>,
    /// Camera center in world space
    position: Option<[f64; 3]>,
    /// Rows of the camera-to-world rotation
    rotation: Option<[[f64; 3]; 3]>,
    fx: Option<f64>,
    fy: Option<f64>,
}

impl GaussianCameraEntry {
    fn into_record(self) -> CameraRecord {
        let mut record = CameraRecord::new(view_id_from_name(&self.img_name));

        if let (Some(rows), Some(position)) = (self.rotation, self.position) {
            let camera_to_world = Matrix3::from_fn(|r, c| rows[r][c]);
            let world_to_camera = camera_to_world.transpose();
            record.rotation = Some(world_to_camera);
            record.translation = Some(-(world_to_camera * Vector3::from(position)));
        } else if let Some(rows) = self.rotation {
            record.rotation = Some(Matrix3::from_fn(|r, c| rows[r][c]).transpose());
        }

        record.focal_x = self.fx;
        record.focal_y = self.fy;
        record.width = self.width;
        record.height = self.height;
        record
    }
}

/// Read a Gaussian splatting `cameras.json`.
///
/// Records are sorted by view id.
pub fn read_gaussian_cameras_json<P: AsRef<Path>>(path: P) -> Result<Vec<CameraRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let entries: Vec<GaussianCameraEntry> = serde_json::from_reader(reader)?;

    let mut records: Vec<CameraRecord> = entries.into_iter().map(|e| e.into_record()).collect();
    records.sort_by(|a, b| a.view_id.cmp(&b.view_id));

    info!("Read {} cameras from {}", records.len(), path.display());
    Ok(records)
}

/// Read a COLMAP text model (`cameras.txt` and `images.txt`).
///
/// Distortion parameters are ignored. Images referring to an unknown camera
/// yield records without intrinsics. Records are sorted by view id.
pub fn read_colmap_text<P: AsRef<Path>, Q: AsRef<Path>>(
    cameras_txt: P,
    images_txt: Q,
) -> Result<Vec<CameraRecord>> {
    let cameras = parse_colmap_cameras(&fs::read_to_string(cameras_txt.as_ref())?)?;
    let mut records = parse_colmap_images(&fs::read_to_string(images_txt.as_ref())?, &cameras)?;
    records.sort_by(|a, b| a.view_id.cmp(&b.view_id));

    info!(
        "Read {} images over {} cameras from {}",
        records.len(),
        cameras.len(),
        images_txt.as_ref().display()
    );
    Ok(records)
}

/// Read cameras from either a `cameras.json` file or a COLMAP text model
/// directory containing `cameras.txt` and `images.txt`.
pub fn read_cameras<P: AsRef<Path>>(path: P) -> Result<Vec<CameraRecord>> {
    let path = path.as_ref();
    if path.is_file() {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            return read_gaussian_cameras_json(path);
        }
    } else if path.is_dir() {
        let cameras_txt = path.join("cameras.txt");
        let images_txt = path.join("images.txt");
        if cameras_txt.is_file() && images_txt.is_file() {
            return read_colmap_text(cameras_txt, images_txt);
        }
    }

    Err(IoError::InvalidFormat {
        format: format!(
            "{} is neither a cameras.json nor a COLMAP text model",
            path.display()
        ),
    })
}

fn parse_colmap_cameras(content: &str) -> Result<HashMap<u32, ColmapCamera>> {
    let mut cameras = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(colmap_error(line_no, "expected CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]"));
        }
        let id: u32 = parse_token(tokens[0], line_no, "camera id")?;
        let model = CameraModel::from_name(tokens[1])
            .ok_or_else(|| colmap_error(line_no, format!("unknown camera model '{}'", tokens[1])))?;
        let width: u32 = parse_token(tokens[2], line_no, "width")?;
        let height: u32 = parse_token(tokens[3], line_no, "height")?;
        let params = tokens[4..]
            .iter()
            .map(|t| parse_token::<f64>(t, line_no, "camera parameter"))
            .collect::<Result<Vec<f64>>>()?;
        if params.len() != model.num_params() {
            return Err(colmap_error(
                line_no,
                format!(
                    "{:?} expects {} parameters, found {}",
                    model,
                    model.num_params(),
                    params.len()
                ),
            ));
        }

        cameras.insert(
            id,
            ColmapCamera {
                width,
                height,
                focal: (params[0], params[model.focal_y_index()]),
            },
        );
    }
    Ok(cameras)
}

fn parse_colmap_images(
    content: &str,
    cameras: &HashMap<u32, ColmapCamera>,
) -> Result<Vec<CameraRecord>> {
    let mut records = Vec::new();
    let mut expect_points = false;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        // Every image line is followed by its 2D points line, which may be empty.
        if expect_points {
            expect_points = false;
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 10 {
            return Err(colmap_error(
                line_no,
                "expected IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME",
            ));
        }
        let mut numbers = [0.0f64; 7];
        for (slot, token) in numbers.iter_mut().zip(&tokens[1..8]) {
            *slot = parse_token(token, line_no, "pose value")?;
        }
        let camera_id: u32 = parse_token(tokens[8], line_no, "camera id")?;
        // Names may contain spaces
        let name = tokens[9..].join(" ");

        let quaternion = Quaternion::new(numbers[0], numbers[1], numbers[2], numbers[3]);
        if !(quaternion.norm() > f64::EPSILON) {
            return Err(colmap_error(line_no, "rotation quaternion has zero length"));
        }
        let rotation = UnitQuaternion::from_quaternion(quaternion).to_rotation_matrix();

        let mut record = CameraRecord::new(view_id_from_name(&name));
        record.rotation = Some(rotation.into_inner());
        record.translation = Some(Vector3::new(numbers[4], numbers[5], numbers[6]));
        match cameras.get(&camera_id) {
            Some(camera) => {
                record.focal_x = Some(camera.focal.0);
                record.focal_y = Some(camera.focal.1);
                record.width = Some(camera.width);
                record.height = Some(camera.height);
            }
            None => debug!("Image '{}' refers to unknown camera {}", name, camera_id),
        }

        records.push(record);
        expect_points = true;
    }
    Ok(records)
}

fn parse_token<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| colmap_error(line, format!("invalid {} '{}'", what, token)))
}

fn colmap_error(line: usize, message: impl Into<String>) -> IoError {
    IoError::Colmap {
        line,
        message: message.into(),
    }
}

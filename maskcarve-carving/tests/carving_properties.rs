//! Integration tests for maskcarve-carving
//!
//! These tests exercise the carver end to end on small synthetic scenes and
//! check the properties it guarantees: identity under all-foreground masks,
//! order independence, survival of out-of-frame points, monotone shrinkage,
//! sound mesh topology and verbatim attribute preservation.

use maskcarve_carving::*;
use maskcarve_core::{
    Camera, Carvable, FieldDef, Mask, MaskPolicy, MaskStore, PointCloud, PointSchema, ScalarKind,
    ScalarValue, StructuredPointCloud, TriangleMesh,
};
use nalgebra::{Matrix3, Point3, Vector3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const SIZE: u32 = 32;

/// Camera at `center` looking at the origin
fn look_at_origin(id: &str, center: Point3<f64>) -> Camera {
    let forward = (-center.coords).normalize();
    let helper = if forward.y.abs() > 0.9 { Vector3::x() } else { Vector3::y() };
    let right = helper.cross(&forward).normalize();
    let down = forward.cross(&right);
    let world_to_camera = Matrix3::from_rows(&[right.transpose(), down.transpose(), forward.transpose()]);
    let translation = -(world_to_camera * center.coords);
    Camera::new(id, world_to_camera, translation, 40.0, 40.0, SIZE, SIZE).unwrap()
}

fn ring_of_cameras() -> Vec<Camera> {
    vec![
        look_at_origin("front", Point3::new(0.0, 0.0, -5.0)),
        look_at_origin("back", Point3::new(0.0, 0.0, 5.0)),
        look_at_origin("left", Point3::new(-5.0, 0.5, 0.0)),
        look_at_origin("right", Point3::new(5.0, -0.5, 0.0)),
        look_at_origin("top", Point3::new(0.3, 5.0, 0.2)),
    ]
}

fn random_mask(rng: &mut StdRng, density: f64) -> Mask {
    let data = (0..SIZE * SIZE).map(|_| rng.gen_bool(density)).collect();
    Mask::from_raw(SIZE, SIZE, data).unwrap()
}

fn random_masks(rng: &mut StdRng, cameras: &[Camera]) -> MaskStore {
    let mut store = MaskStore::new(MaskPolicy::default());
    for camera in cameras {
        store.insert(camera.view_id(), random_mask(rng, 0.8));
    }
    store
}

fn full_masks(cameras: &[Camera]) -> MaskStore {
    let mut store = MaskStore::new(MaskPolicy::default());
    for camera in cameras {
        store.insert(camera.view_id(), Mask::filled(SIZE, SIZE, true));
    }
    store
}

fn random_cloud(rng: &mut StdRng, count: usize) -> PointCloud<Point3<f64>> {
    (0..count)
        .map(|_| {
            Point3::new(
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
            )
        })
        .collect()
}

fn splat_schema() -> Arc<PointSchema> {
    let mut fields = vec![
        FieldDef::new("x", ScalarKind::Float),
        FieldDef::new("y", ScalarKind::Float),
        FieldDef::new("z", ScalarKind::Float),
        FieldDef::new("nx", ScalarKind::Float),
        FieldDef::new("ny", ScalarKind::Float),
        FieldDef::new("nz", ScalarKind::Float),
    ];
    for i in 0..3 {
        fields.push(FieldDef::new(format!("f_dc_{}", i), ScalarKind::Float));
    }
    fields.push(FieldDef::new("opacity", ScalarKind::Float));
    fields.push(FieldDef::new("segment", ScalarKind::UShort));
    fields.push(FieldDef::new("confidence", ScalarKind::Double));
    Arc::new(PointSchema::new(fields).unwrap())
}

fn random_splats(rng: &mut StdRng, count: usize) -> StructuredPointCloud {
    let mut cloud = StructuredPointCloud::new(splat_schema());
    for _ in 0..count {
        let mut values: Vec<ScalarValue> = (0..10)
            .map(|_| ScalarValue::Float(rng.gen_range(-1.5..1.5)))
            .collect();
        values.push(ScalarValue::UShort(rng.gen()));
        values.push(ScalarValue::Double(rng.gen()));
        cloud.push_values(&values).unwrap();
    }
    cloud
}

#[test]
fn test_identity_with_all_foreground_masks() {
    let mut rng = StdRng::seed_from_u64(1);
    let cameras = ring_of_cameras();
    let masks = full_masks(&cameras);
    let carver = SilhouetteCarver::default();

    let cloud = random_splats(&mut rng, 300);
    let outcome = carver.carve(&cloud, &cameras, &masks).unwrap();
    assert_eq!(outcome.cloud, cloud);
    assert!(outcome.kept.iter().all(|&k| k));

    let vertices = random_cloud(&mut rng, 50);
    let faces: Vec<[usize; 3]> = (0..40)
        .map(|_| [rng.gen_range(0..50), rng.gen_range(0..50), rng.gen_range(0..50)])
        .collect();
    let mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    let carved = carver.carve_mesh(&mesh, &cameras, &masks).unwrap();
    assert_eq!(carved.mesh, mesh);
    assert_eq!(carved.dropped_faces, 0);
}

#[test]
fn test_order_independence() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut cameras = ring_of_cameras();
    let masks = random_masks(&mut rng, &cameras);
    let cloud = random_cloud(&mut rng, 2000);
    let carver = SilhouetteCarver::default();

    let reference = carver.carve(&cloud, &cameras, &masks).unwrap();
    assert!(reference.cloud.len() < cloud.len());

    for _ in 0..10 {
        cameras.shuffle(&mut rng);
        let permuted = carver.carve(&cloud, &cameras, &masks).unwrap();
        assert_eq!(permuted.survivors, reference.survivors);
        assert_eq!(permuted.cloud, reference.cloud);
    }
}

#[test]
fn test_sequential_matches_intersection() {
    let mut rng = StdRng::seed_from_u64(3);
    let cameras = ring_of_cameras();
    let masks = random_masks(&mut rng, &cameras);
    let cloud = random_cloud(&mut rng, 1500);
    let carver = SilhouetteCarver::new(CarveConfig::default().with_parallel(false));

    let mut intersection = vec![true; cloud.len()];
    for camera in &cameras {
        let mask = masks.lookup(camera.view_id()).unwrap();
        let rejected = carver.rejected_by_view(&cloud, camera, mask).unwrap();
        for (keep, rejected) in intersection.iter_mut().zip(rejected) {
            *keep &= !rejected;
        }
    }

    let outcome = carver.carve(&cloud, &cameras, &masks).unwrap();
    assert_eq!(outcome.kept, intersection);
}

#[test]
fn test_out_of_frame_points_survive() {
    let mut rng = StdRng::seed_from_u64(4);
    let cameras = ring_of_cameras();
    let masks = random_masks(&mut rng, &cameras);

    let mut cloud = random_cloud(&mut rng, 500);
    // Far off to the side of every camera, or behind all of them at once is
    // impossible for a ring, so use points well outside every frustum.
    let far = [
        Point3::new(200.0, 200.0, 200.0),
        Point3::new(-300.0, 250.0, 10.0),
        Point3::new(0.0, -400.0, 350.0),
    ];
    for camera in &cameras {
        for p in &far {
            assert!(!project(p, camera).in_bounds());
        }
    }
    let first_far = cloud.len();
    cloud.points.extend_from_slice(&far);

    let outcome = carver_outcome(&cloud, &cameras, &masks);
    for index in first_far..cloud.len() {
        assert!(outcome.kept[index]);
    }
}

fn carver_outcome(
    cloud: &PointCloud<Point3<f64>>,
    cameras: &[Camera],
    masks: &MaskStore,
) -> CarveOutcome<PointCloud<Point3<f64>>> {
    SilhouetteCarver::default().carve(cloud, cameras, masks).unwrap()
}

#[test]
fn test_monotone_shrinkage() {
    let mut rng = StdRng::seed_from_u64(5);
    let cameras = ring_of_cameras();
    let masks = random_masks(&mut rng, &cameras);
    let cloud = random_cloud(&mut rng, 1000);

    let outcome = carver_outcome(&cloud, &cameras, &masks);
    assert_eq!(outcome.views.len(), cameras.len());
    assert_eq!(outcome.views[0].before, cloud.len());
    for report in &outcome.views {
        assert!(report.after <= report.before);
    }
    for pair in outcome.views.windows(2) {
        assert_eq!(pair[0].after, pair[1].before);
    }
    assert_eq!(outcome.views.last().unwrap().after, outcome.cloud.len());
}

#[test]
fn test_mesh_soundness() {
    let mut rng = StdRng::seed_from_u64(6);
    let cameras = ring_of_cameras();
    let masks = random_masks(&mut rng, &cameras);

    let vertices = random_cloud(&mut rng, 400);
    let faces: Vec<[usize; 3]> = (0..600)
        .map(|_| [rng.gen_range(0..400), rng.gen_range(0..400), rng.gen_range(0..400)])
        .collect();
    let mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);

    let outcome = SilhouetteCarver::default().carve_mesh(&mesh, &cameras, &masks).unwrap();
    let carved = &outcome.mesh;
    let kept_count = outcome.kept.iter().filter(|&&k| k).count();
    assert_eq!(carved.vertex_count(), kept_count);
    assert!(carved.faces.iter().flatten().all(|&i| i < carved.vertex_count()));

    // A face survives iff all three of its vertices do, rewritten in order
    let remap = index_remap(&outcome.kept);
    let expected: Vec<[usize; 3]> = mesh
        .faces
        .iter()
        .filter(|f| f.iter().all(|&i| outcome.kept[i]))
        .map(|f| f.map(|i| remap[i].unwrap()))
        .collect();
    assert_eq!(carved.faces, expected);
    assert_eq!(outcome.dropped_faces, mesh.face_count() - expected.len());

    // Surviving faces still connect the same positions
    for (old, new) in mesh
        .faces
        .iter()
        .filter(|f| f.iter().all(|&i| outcome.kept[i]))
        .zip(&carved.faces)
    {
        for k in 0..3 {
            assert_eq!(mesh.vertices[old[k]], carved.vertices[new[k]]);
        }
    }
}

#[test]
fn test_mesh_with_bad_face_is_rejected_up_front() {
    let cameras = ring_of_cameras();
    let masks = full_masks(&cameras);
    let vertices: PointCloud<Point3<f64>> = (0..3).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
    let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2], [2, 1, 7]]);

    let result = SilhouetteCarver::default().carve_mesh(&mesh, &cameras, &masks);
    assert!(matches!(
        result,
        Err(maskcarve_core::Error::FaceIndexOutOfRange { face: 1, index: 7, vertex_count: 3 })
    ));
}

#[test]
fn test_schema_preservation() {
    let mut rng = StdRng::seed_from_u64(7);
    let cameras = ring_of_cameras();
    let masks = random_masks(&mut rng, &cameras);
    let cloud = random_splats(&mut rng, 800);

    let outcome = SilhouetteCarver::default().carve(&cloud, &cameras, &masks).unwrap();
    assert!(outcome.cloud.len() < cloud.len());
    assert_eq!(outcome.cloud.schema(), cloud.schema());
    for (new_index, &old_index) in outcome.survivors.iter().enumerate() {
        assert_eq!(outcome.cloud.record(new_index), cloud.record(old_index));
    }
}

#[test]
fn test_two_view_scenario() {
    // View A looks down +z from the origin; view B looks down -z from (0, 0, 4).
    let a = Camera::new("A", Matrix3::identity(), Vector3::zeros(), 10.0, 10.0, 10, 10).unwrap();
    let b = Camera::new(
        "B",
        Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, -1.0)),
        Vector3::new(0.0, 0.0, 4.0),
        10.0,
        10.0,
        10,
        10,
    )
    .unwrap();

    let cloud = PointCloud::from_points(vec![
        Point3::new(0.0, 0.0, 2.0),    // A (5, 5)   B (5, 5)
        Point3::new(0.5, 0.0, 2.0),    // A (7, 5)   B (2, 5)
        Point3::new(-0.5, 0.5, 2.0),   // A (2, 7)   B (7, 7)
        Point3::new(0.0, -0.5, 2.0),   // A (5, 2)   B (5, 2)
        Point3::new(0.2, 0.2, 2.0),    // A (6, 6)   B (4, 6)
        Point3::new(100.0, 0.0, 2.0),  // outside both frames
    ]);

    let mut mask_a = Mask::filled(10, 10, false);
    for (x, y) in [(5, 5), (7, 5), (5, 2), (6, 6)] {
        mask_a.set(x, y, true);
    }
    let mut mask_b = Mask::filled(10, 10, false);
    for (x, y) in [(5, 5), (2, 5), (7, 7), (5, 2), (4, 6)] {
        mask_b.set(x, y, true);
    }

    let mut masks = MaskStore::new(MaskPolicy::default());
    masks.insert("A", mask_a);
    masks.insert("B", mask_b);

    for cameras in [vec![a.clone(), b.clone()], vec![b, a]] {
        let outcome = carver_outcome(&cloud, &cameras, &masks);
        assert_eq!(outcome.survivors, vec![0, 1, 3, 4, 5]);
        assert!(!outcome.kept[2]);
        assert_eq!(outcome.cloud.point_position(4), Point3::new(100.0, 0.0, 2.0));
    }
}

#[test]
fn test_everything_rejected_is_a_valid_result() {
    let cameras = ring_of_cameras();
    let mut masks = MaskStore::new(MaskPolicy::default());
    for camera in &cameras {
        let mut mask = Mask::filled(SIZE, SIZE, false);
        // One foreground pixel in a corner nothing projects to
        mask.set(0, 0, true);
        masks.insert(camera.view_id(), mask);
    }

    let cloud = PointCloud::from_points(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.1, 0.1, 0.1)]);
    let outcome = carver_outcome(&cloud, &cameras, &masks);
    assert!(outcome.cloud.is_empty());
    assert!(outcome.survivors.is_empty());
}

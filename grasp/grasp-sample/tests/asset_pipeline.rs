//! Loading an asset from disk and sampling it under several rotations.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use grasp_sample::{sample_object, ObjectAsset, SampleError, SampleParams};
use mesh_io::save_ply;
use mesh_types::{axis_aligned_box, Point3};
use nalgebra::Rotation3;

fn write_asset(dir: &std::path::Path) -> std::path::PathBuf {
    // A 150 x 30 x 20 mm tool, off-center.
    let mesh = axis_aligned_box(Point3::new(10.0, 5.0, 0.0), Point3::new(160.0, 35.0, 20.0));
    let path = dir.join("tool.ply");
    save_ply(&mesh, &path, true).unwrap();
    path
}

#[test]
fn every_rotation_gives_a_full_sample_within_radius() {
    let dir = tempfile::tempdir().unwrap();
    let params = SampleParams::default().with_sample_count(3000);
    let asset = ObjectAsset::load(write_asset(dir.path()), None, &params).unwrap();
    assert!(asset.mesh().vertices.len() >= 3000);

    for (i, angles) in [(0.0, 0.0, 0.0), (0.3, -1.1, 2.5), (3.0, 0.5, -0.7)].iter().enumerate() {
        let rotation = Rotation3::from_euler_angles(angles.0, angles.1, angles.2);
        let sample = sample_object(&asset, rotation.matrix(), &params).unwrap();
        assert_eq!(sample.points.len(), 3000, "rotation {i}");
        assert_eq!(sample.normals.len(), 3000);

        let radius = sample.bounding_radius();
        // Centered 150 x 30 x 20 mm box in metres.
        assert!((radius - (0.075f64.powi(2) + 0.015f64.powi(2) + 0.01f64.powi(2)).sqrt()).abs() < 1e-9);
        for p in &sample.points {
            assert!(p.coords.norm() <= radius + 1e-12);
        }
    }
}

#[test]
fn handle_shifts_the_frame() {
    let dir = tempfile::tempdir().unwrap();
    let object = write_asset(dir.path());
    let handle_mesh = axis_aligned_box(Point3::new(10.0, 5.0, 0.0), Point3::new(60.0, 35.0, 20.0));
    let handle = dir.path().join("handle.ply");
    save_ply(&handle_mesh, &handle, false).unwrap();

    let params = SampleParams::default().with_sample_count(100);
    let asset = ObjectAsset::load(&object, Some(handle.as_path()), &params).unwrap();
    assert!((asset.offset().x - 0.035).abs() < 1e-12);
}

#[test]
fn missing_asset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = ObjectAsset::load(dir.path().join("absent.stl"), None, &SampleParams::default())
        .unwrap_err();
    assert!(matches!(err, SampleError::Io(_)));
}

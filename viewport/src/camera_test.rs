#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::DEFAULT_FOV_X;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: DVec3, b: DVec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn intrinsics_640x480() -> Intrinsics {
    Intrinsics { fx: 500.0, fy: 500.0, cx: 320.0, cy: 240.0, width: 640, height: 480 }
}

fn assert_pose_pair_consistent(cam: &Camera) {
    let product = cam.world_to_camera() * cam.camera_to_world();
    assert!(product.abs_diff_eq(DMat4::IDENTITY, 1e-9), "w2c * c2w drifted from identity: {product:?}");
    assert!(cam.world_to_camera().abs_diff_eq(cam.camera_to_world().inverse(), 1e-9));
}

// --- fov / focal ---

#[test]
fn fov_to_focal_ninety_degrees() {
    let focal = fov_to_focal(std::f64::consts::FRAC_PI_2, 200.0);
    assert!(approx_eq(focal, 100.0));
}

#[test]
fn focal_fov_round_trip() {
    let fov = 0.83;
    assert!(approx_eq(focal_to_fov(fov_to_focal(fov, 640.0), 640.0), fov));
}

#[test]
fn intrinsics_from_fov_centers_principal_point() {
    let k = Intrinsics::from_fov(std::f64::consts::FRAC_PI_2, 200, 100).unwrap();
    assert!(approx_eq(k.fx, 100.0));
    assert!(approx_eq(k.fy, 100.0));
    assert!(approx_eq(k.cx, 100.0));
    assert!(approx_eq(k.cy, 50.0));
    assert!(approx_eq(k.fov_x(), std::f64::consts::FRAC_PI_2));
}

#[test]
fn intrinsics_from_fov_rejects_zero_size() {
    assert_eq!(
        Intrinsics::from_fov(1.0, 0, 100),
        Err(CameraError::InvalidSize { width: 0, height: 100 })
    );
}

#[test]
fn intrinsics_matrix_layout() {
    let k = intrinsics_640x480().matrix();
    let p = k * DVec3::new(1.0, 2.0, 1.0);
    assert!(vec_approx_eq(p, DVec3::new(820.0, 1240.0, 1.0)));
}

// --- Construction ---

#[test]
fn new_camera_has_identity_pose() {
    let cam = Camera::new(intrinsics_640x480());
    assert_eq!(cam.camera_to_world(), DMat4::IDENTITY);
    assert_eq!(cam.world_to_camera(), DMat4::IDENTITY);
    assert!(vec_approx_eq(cam.forward(), DVec3::Z));
    assert!(vec_approx_eq(cam.up(), DVec3::NEG_Y));
}

#[test]
fn look_at_puts_target_on_optical_axis() {
    let cam = Camera::look_at(intrinsics_640x480(), DVec3::new(0.0, 0.0, -5.0), DVec3::ZERO, DVec3::Y).unwrap();
    let pixel = cam.project(DVec3::ZERO).unwrap();
    assert!(approx_eq(pixel.x, 320.0));
    assert!(approx_eq(pixel.y, 240.0));
    assert!(vec_approx_eq(cam.forward(), DVec3::Z));
    assert!(vec_approx_eq(cam.up(), DVec3::Y));
    assert_pose_pair_consistent(&cam);
}

#[test]
fn look_at_world_up_projects_above_center() {
    let cam = Camera::look_at(intrinsics_640x480(), DVec3::new(0.0, 0.0, -5.0), DVec3::ZERO, DVec3::Y).unwrap();
    let pixel = cam.project(DVec3::new(0.0, 1.0, 0.0)).unwrap();
    assert!(pixel.y < 240.0, "world up should be toward the top of the image");
}

#[test]
fn look_at_rejects_coincident_eye_and_target() {
    let err = Camera::look_at(intrinsics_640x480(), DVec3::ONE, DVec3::ONE, DVec3::Y).unwrap_err();
    assert_eq!(err, CameraError::DegenerateLookAt);
}

#[test]
fn look_at_rejects_up_parallel_to_view() {
    let err = Camera::look_at(intrinsics_640x480(), DVec3::ZERO, DVec3::new(0.0, 3.0, 0.0), DVec3::Y).unwrap_err();
    assert_eq!(err, CameraError::DegenerateLookAt);
}

// --- Navigation ---

#[test]
fn rotate_yaw_orbits_position_about_world_vertical() {
    let mut cam = Camera::look_at(intrinsics_640x480(), DVec3::new(0.0, 0.0, -4.0), DVec3::ZERO, DVec3::Y).unwrap();
    let yaw = 0.3_f64;
    cam.rotate(yaw, 0.0);
    // The camera swings around the origin and keeps looking at it.
    assert!(vec_approx_eq(cam.position(), DVec3::new(4.0 * yaw.sin(), 0.0, -4.0 * yaw.cos())));
    assert!(vec_approx_eq(cam.forward(), -cam.position().normalize()));
}

#[test]
fn rotate_at_origin_turns_in_place() {
    let mut cam = Camera::new(intrinsics_640x480());
    let yaw = 0.3_f64;
    cam.rotate(yaw, 0.0);
    assert!(vec_approx_eq(cam.forward(), DVec3::new(-yaw.sin(), 0.0, yaw.cos())));
    assert!(vec_approx_eq(cam.position(), DVec3::ZERO));
}

#[test]
fn rotate_pitch_turns_forward_about_right_axis() {
    let mut cam = Camera::new(intrinsics_640x480());
    let pitch = 0.2_f64;
    cam.rotate(0.0, pitch);
    assert!(vec_approx_eq(cam.forward(), DVec3::new(0.0, pitch.sin(), pitch.cos())));
    assert!(vec_approx_eq(cam.right(), DVec3::X));
}

#[test]
fn rotate_keeps_origin_on_its_pixel() {
    let intrinsics = Intrinsics::from_fov(DEFAULT_FOV_X, 512, 512).unwrap();
    let mut cam = Camera::look_at(intrinsics, DVec3::new(0.0, 1.5, -4.0), DVec3::ZERO, DVec3::Y).unwrap();
    let before = cam.project(DVec3::ZERO).unwrap();
    let eye = cam.position();

    for (yaw, pitch) in [(0.5, 0.0), (0.0, 0.3), (-0.7, 0.2)] {
        cam.rotate(yaw, pitch);
        let after = cam.project(DVec3::ZERO).unwrap();
        assert!((after - before).length() < 1e-6, "origin moved from {before} to {after}");
        assert!(approx_eq(cam.position().length(), eye.length()));
    }
    assert!((cam.position() - eye).length() > 0.1);
}

#[test]
fn pan_moves_against_pointer_horizontally() {
    let mut cam = Camera::new(intrinsics_640x480());
    cam.pan(10.0, 0.0);
    assert!(vec_approx_eq(cam.position(), DVec3::new(-10.0 * DEFAULT_PAN_SENSITIVITY, 0.0, 0.0)));
}

#[test]
fn pan_moves_up_for_downward_drag() {
    let mut cam = Camera::new(intrinsics_640x480());
    cam.pan(0.0, 10.0);
    // up is -y in the OpenCV frame
    assert!(vec_approx_eq(cam.position(), DVec3::new(0.0, -10.0 * DEFAULT_PAN_SENSITIVITY, 0.0)));
}

#[test]
fn zoom_positive_backs_away() {
    let mut cam = Camera::new(intrinsics_640x480());
    cam.zoom(100.0);
    assert!(vec_approx_eq(cam.position(), DVec3::new(0.0, 0.0, -100.0 * DEFAULT_ZOOM_SENSITIVITY)));
}

#[test]
fn zoom_respects_custom_sensitivity() {
    let sensitivity = Sensitivity { orbit: 0.01, pan: 0.01, zoom: 0.5 };
    let mut cam = Camera::new(intrinsics_640x480()).with_sensitivity(sensitivity);
    cam.zoom(-2.0);
    assert!(vec_approx_eq(cam.position(), DVec3::new(0.0, 0.0, 1.0)));
}

#[test]
fn pose_pair_stays_inverse_through_navigation() {
    let mut cam = Camera::look_at(intrinsics_640x480(), DVec3::new(1.0, 2.0, -4.0), DVec3::ZERO, DVec3::Y).unwrap();
    for i in 0..200 {
        let f = f64::from(i);
        match i % 3 {
            0 => cam.rotate(0.01 * f.sin(), 0.02 * f.cos()),
            1 => cam.pan(f.cos() * 5.0, f.sin() * 3.0),
            _ => cam.zoom(f.sin() * 40.0),
        }
        assert_pose_pair_consistent(&cam);
    }
}

#[test]
fn rotation_stays_orthonormal_after_many_steps() {
    let mut cam = Camera::new(intrinsics_640x480());
    for _ in 0..10_000 {
        cam.rotate(0.0123, -0.0071);
    }
    let r = DMat3::from_mat4(cam.camera_to_world());
    assert!((r.transpose() * r).abs_diff_eq(DMat3::IDENTITY, 1e-12));
    assert!((r.determinant() - 1.0).abs() < 1e-12);
}

// --- Resize ---

#[test]
fn resize_scales_by_smaller_axis_ratio() {
    let cam = Camera::new(intrinsics_640x480());
    let resized = cam.resize(320, 480).unwrap();
    let k = resized.intrinsics();
    assert!(approx_eq(k.fx, 250.0));
    assert!(approx_eq(k.fy, 250.0));
    assert!(approx_eq(k.cx, 160.0));
    assert!(approx_eq(k.cy, 120.0));
    assert_eq!((k.width, k.height), (320, 480));
}

#[test]
fn resize_preserves_focal_to_principal_ratio() {
    let cam = Camera::new(intrinsics_640x480());
    let resized = cam.resize(1280, 960).unwrap();
    let before = cam.intrinsics();
    let after = resized.intrinsics();
    assert!(approx_eq(before.fx / before.cx, after.fx / after.cx));
    assert!(approx_eq(after.fx / before.fx, 2.0));
}

#[test]
fn resize_to_wider_aspect_keeps_focal_to_principal_ratio() {
    let cam = Camera::new(intrinsics_640x480());
    let resized = cam.resize(1280, 480).unwrap();
    let k = resized.intrinsics();
    // Height limits the scale to 1, so nothing moves.
    assert!(approx_eq(k.fx, 500.0));
    assert!(approx_eq(k.cx, 320.0));
    assert!(approx_eq(k.cy, 240.0));
    assert!(approx_eq(k.fx / k.cx, 500.0 / 320.0));
    assert_eq!((k.width, k.height), (1280, 480));
}

#[test]
fn resize_keeps_pose_and_original() {
    let mut cam = Camera::new(intrinsics_640x480());
    cam.rotate(0.4, 0.1);
    cam.pan(3.0, -2.0);
    let resized = cam.resize(100, 100).unwrap();
    assert_eq!(resized.camera_to_world(), cam.camera_to_world());
    assert_eq!(cam.intrinsics().width, 640);
}

#[test]
fn resize_rejects_zero() {
    let cam = Camera::new(intrinsics_640x480());
    assert_eq!(cam.resize(0, 10), Err(CameraError::InvalidSize { width: 0, height: 10 }));
}

// --- Pose conventions ---

#[test]
fn set_pose_world_to_camera_round_trip() {
    let mut cam = Camera::new(intrinsics_640x480());
    let w2c = DMat4::from_rotation_y(0.7) * DMat4::from_translation(DVec3::new(1.0, -2.0, 3.0));
    cam.set_pose(w2c, PoseKind::WorldToCamera, CoordinateConvention::OpenCv).unwrap();
    assert!(cam.world_to_camera().abs_diff_eq(w2c, 1e-9));
    assert_pose_pair_consistent(&cam);
}

#[test]
fn set_pose_opengl_flips_view_axes() {
    let mut cam = Camera::new(intrinsics_640x480());
    // OpenGL identity looks down -z with y up.
    cam.set_pose(DMat4::IDENTITY, PoseKind::CameraToWorld, CoordinateConvention::OpenGl).unwrap();
    assert!(vec_approx_eq(cam.forward(), DVec3::NEG_Z));
    assert!(vec_approx_eq(cam.up(), DVec3::Y));
}

#[test]
fn pose_round_trips_through_each_convention() {
    let c2w = DMat4::from_rotation_x(0.3) * DMat4::from_rotation_z(-1.1);
    for convention in [CoordinateConvention::OpenCv, CoordinateConvention::OpenGl, CoordinateConvention::PyTorch3d] {
        let mut cam = Camera::new(intrinsics_640x480());
        cam.set_pose(c2w, PoseKind::CameraToWorld, convention).unwrap();
        assert!(cam.pose(PoseKind::CameraToWorld, convention).abs_diff_eq(c2w, 1e-9));
        assert!(cam.pose(PoseKind::WorldToCamera, convention).abs_diff_eq(c2w.inverse(), 1e-9));
    }
}

#[test]
fn set_pose_rejects_scaled_matrix_and_keeps_old_pose() {
    let mut cam = Camera::new(intrinsics_640x480());
    cam.pan(5.0, 0.0);
    let before = cam.camera_to_world();
    let err = cam
        .set_pose(DMat4::from_scale(DVec3::splat(2.0)), PoseKind::CameraToWorld, CoordinateConvention::OpenCv)
        .unwrap_err();
    assert_eq!(err, CameraError::NonRigidPose);
    assert_eq!(cam.camera_to_world(), before);
}

// --- Projection ---

#[test]
fn project_rejects_points_behind_camera() {
    let cam = Camera::new(intrinsics_640x480());
    assert!(cam.project(DVec3::new(0.0, 0.0, -1.0)).is_none());
}

#[test]
fn project_rejects_points_beyond_far_plane() {
    let cam = Camera::new(intrinsics_640x480()).with_clip_planes(0.1, 10.0);
    assert!(cam.project(DVec3::new(0.0, 0.0, 11.0)).is_none());
    assert!(cam.project(DVec3::new(0.0, 0.0, 9.0)).is_some());
}

#[test]
fn project_offsets_by_focal_length() {
    let cam = Camera::new(intrinsics_640x480());
    let pixel = cam.project(DVec3::new(1.0, 0.5, 2.0)).unwrap();
    assert!(approx_eq(pixel.x, 500.0 * 0.5 + 320.0));
    assert!(approx_eq(pixel.y, 500.0 * 0.25 + 240.0));
}

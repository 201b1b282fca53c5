use glam::DVec3;
use viewport::camera::Intrinsics;
use viewport::input::PointerState;
use viewport::resolution::{Padding, Size};

use super::*;

fn camera(size: u32) -> Camera {
    let intrinsics = Intrinsics::from_fov(std::f64::consts::FRAC_PI_3, size, size).unwrap();
    Camera::look_at(intrinsics, DVec3::new(0.0, 1.5, -4.0), DVec3::ZERO, DVec3::Y).unwrap()
}

fn request(size: u32, frame_index: u64) -> RenderRequest {
    RenderRequest {
        size: Size::new(size, size),
        padding: Padding::ZERO,
        frame_index,
        camera: Some(camera(size)),
        pointer: PointerState::default(),
        cursor: None,
    }
}

fn frame(outcome: RenderOutcome) -> RasterImage {
    match outcome {
        RenderOutcome::Frame(image) => image,
        other => panic!("expected a frame, got {other:?}"),
    }
}

fn count(image: &RasterImage, rgb: [u8; 3]) -> usize {
    image.data().chunks_exact(3).filter(|px| *px == rgb).count()
}

#[test]
fn without_camera_is_unsupported() {
    let mut req = request(64, 0);
    req.camera = None;
    assert!(matches!(DemoRenderer::default().render(&req).unwrap(), RenderOutcome::Unsupported));
}

#[test]
fn frame_matches_requested_size() {
    let image = frame(DemoRenderer::default().render(&request(96, 0)).unwrap());
    assert_eq!(image.size(), Size::new(96, 96));
    assert_eq!(image.channels(), 3);
}

#[test]
fn scene_draws_cube_and_grid() {
    let image = frame(DemoRenderer::new(0, 1).render(&request(128, 0)).unwrap());
    assert!(count(&image, CUBE) > 0);
    assert!(count(&image, GRID) > 0);
}

#[test]
fn same_seed_same_picture() {
    let a = frame(DemoRenderer::new(50, 3).render(&request(64, 5)).unwrap());
    let b = frame(DemoRenderer::new(50, 3).render(&request(64, 5)).unwrap());
    assert_eq!(a, b);
}

#[test]
fn cube_spins_with_frame_index() {
    let renderer = DemoRenderer::new(0, 1);
    let a = frame(renderer.render(&request(128, 0)).unwrap());
    let b = frame(renderer.render(&request(128, 20)).unwrap());
    assert_ne!(a, b);
}

#[test]
fn crosshair_marks_cursor() {
    let mut req = request(64, 0);
    req.cursor = Some((10.0, 12.0));
    let image = frame(DemoRenderer::new(0, 1).render(&req).unwrap());
    let idx = (12 * 64 + 10) * 3;
    assert_eq!(&image.data()[idx..idx + 3], &CURSOR);
}

#[test]
fn off_canvas_cursor_is_ignored() {
    let mut req = request(32, 0);
    req.cursor = Some((-500.0, 900.0));
    let image = frame(DemoRenderer::new(0, 1).render(&req).unwrap());
    assert_eq!(image.size(), Size::new(32, 32));
}

//! Built-in scene so the server streams something without an external
//! renderer: a ground grid, a spinning wireframe cube, a seeded point cloud,
//! and a crosshair at the pointer.
//!
//! Everything is drawn with the session camera's projection, so orbit, pan,
//! and zoom are visible immediately. Without a camera the scene cannot be
//! placed and the renderer reports `Unsupported`.

#[cfg(test)]
#[path = "demo_test.rs"]
mod demo_test;

use glam::{DQuat, DVec2, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use viewport::camera::Camera;

use crate::render::{RasterImage, RenderError, RenderOutcome, RenderRequest, Renderer};

const SKY_TOP: [u8; 3] = [18, 22, 34];
const SKY_BOTTOM: [u8; 3] = [52, 60, 82];
const GRID: [u8; 3] = [90, 98, 120];
const CUBE: [u8; 3] = [240, 180, 60];
const POINTS: [u8; 3] = [120, 220, 200];
const CURSOR: [u8; 3] = [255, 255, 255];

const GRID_HALF_EXTENT: i32 = 5;
/// Radians per published frame.
const SPIN_PER_FRAME: f64 = 0.02;
const CROSSHAIR_ARM: i64 = 6;
/// Segments longer than this many pixels are skipped; they only occur for
/// points grazing the near plane.
const MAX_SEGMENT_PIXELS: f64 = 8192.0;

const CUBE_EDGES: [(usize, usize); 12] =
    [(0, 1), (1, 3), (3, 2), (2, 0), (4, 5), (5, 7), (7, 6), (6, 4), (0, 4), (1, 5), (2, 6), (3, 7)];

pub struct DemoRenderer {
    points: Vec<DVec3>,
}

impl DemoRenderer {
    /// Scene with `point_count` cloud points scattered from `seed`.
    #[must_use]
    pub fn new(point_count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = (0..point_count)
            .map(|_| {
                DVec3::new(rng.random_range(-3.0..3.0), rng.random_range(0.0..2.5), rng.random_range(-3.0..3.0))
            })
            .collect();
        Self { points }
    }
}

impl Default for DemoRenderer {
    fn default() -> Self {
        Self::new(400, 7)
    }
}

impl Renderer for DemoRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutcome, RenderError> {
        let Some(camera) = request.camera.as_ref() else {
            return Ok(RenderOutcome::Unsupported);
        };
        let mut canvas = Canvas::sky(request.size.width, request.size.height)?;

        for i in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
            let i = f64::from(i);
            let extent = f64::from(GRID_HALF_EXTENT);
            canvas.polyline(camera, DVec3::new(i, 0.0, -extent), DVec3::new(i, 0.0, extent), GRID);
            canvas.polyline(camera, DVec3::new(-extent, 0.0, i), DVec3::new(extent, 0.0, i), GRID);
        }

        #[allow(clippy::cast_precision_loss)]
        let spin = DQuat::from_rotation_y(request.frame_index as f64 * SPIN_PER_FRAME);
        let corners: Vec<DVec3> = (0..8)
            .map(|bits: u8| {
                let corner = DVec3::new(
                    if bits & 1 == 0 { -0.5 } else { 0.5 },
                    if bits & 2 == 0 { 0.0 } else { 1.0 },
                    if bits & 4 == 0 { -0.5 } else { 0.5 },
                );
                spin * corner
            })
            .collect();
        for (a, b) in CUBE_EDGES {
            canvas.polyline(camera, corners[a], corners[b], CUBE);
        }

        for &point in &self.points {
            if let Some(p) = camera.project(point) {
                canvas.dot(p, POINTS);
            }
        }

        if let Some((x, y)) = request.cursor {
            canvas.crosshair(DVec2::new(x, y), CURSOR);
        }

        Ok(RenderOutcome::Frame(canvas.finish()))
    }
}

// =============================================================================
// RASTER DRAWING
// =============================================================================

struct Canvas {
    image: RasterImage,
}

impl Canvas {
    /// Vertical gradient background.
    fn sky(width: u32, height: u32) -> Result<Self, RenderError> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            let t = f64::from(y) / f64::from(height.max(2) - 1);
            let row = lerp_rgb(SKY_TOP, SKY_BOTTOM, t);
            for _ in 0..width {
                data.extend_from_slice(&row);
            }
        }
        Ok(Self { image: RasterImage::new(width, height, 3, data)? })
    }

    fn finish(self) -> RasterImage {
        self.image
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn put(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        let (width, height) = (self.image.width(), self.image.height());
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
            return;
        }
        let idx = (y as usize * width as usize + x as usize) * 3;
        self.image.data_mut()[idx..idx + 3].copy_from_slice(&rgb);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn dot(&mut self, p: DVec2, rgb: [u8; 3]) {
        let (x, y) = (p.x.floor() as i64, p.y.floor() as i64);
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            self.put(x + dx, y + dy, rgb);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn crosshair(&mut self, p: DVec2, rgb: [u8; 3]) {
        let (x, y) = (p.x.round() as i64, p.y.round() as i64);
        for d in -CROSSHAIR_ARM..=CROSSHAIR_ARM {
            self.put(x + d, y, rgb);
            self.put(x, y + d, rgb);
        }
    }

    /// World-space segment, split so parts behind the camera drop out
    /// piecewise instead of hiding the whole line.
    fn polyline(&mut self, camera: &Camera, from: DVec3, to: DVec3, rgb: [u8; 3]) {
        const PIECES: u32 = 16;
        let mut prev = camera.project(from);
        for i in 1..=PIECES {
            let next = camera.project(from.lerp(to, f64::from(i) / f64::from(PIECES)));
            if let (Some(a), Some(b)) = (prev, next) {
                self.line(a, b, rgb);
            }
            prev = next;
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn line(&mut self, a: DVec2, b: DVec2, rgb: [u8; 3]) {
        let steps = (b - a).abs().max_element().ceil().max(1.0);
        if !steps.is_finite() || steps > MAX_SEGMENT_PIXELS {
            return;
        }
        let steps = steps as u32;
        for i in 0..=steps {
            let p = a.lerp(b, f64::from(i) / f64::from(steps));
            self.put(p.x.round() as i64, p.y.round() as i64, rgb);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round().clamp(0.0, 255.0) as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

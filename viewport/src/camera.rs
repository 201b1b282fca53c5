//! Pinhole camera: intrinsics, rigid pose, and orbit/pan/zoom navigation.
//!
//! DESIGN
//! ======
//! Poses are stored in the OpenCV axis convention (x right, y down,
//! z forward). The camera-to-world matrix and its world-to-camera inverse
//! are rebuilt together by [`Camera::commit`]; nothing writes one without
//! the other. The rotation block is re-orthonormalized on every commit so
//! long navigation sessions stay rigid.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use glam::{DMat3, DMat4, DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_FAR, DEFAULT_NEAR, DEFAULT_ORBIT_SENSITIVITY, DEFAULT_PAN_SENSITIVITY, DEFAULT_ZOOM_SENSITIVITY,
};

/// Tolerance used when checking that a supplied pose is rigid.
const RIGID_EPSILON: f64 = 1e-6;

/// Vectors shorter than this are treated as zero in `look_at`.
const DEGENERATE_EPSILON: f64 = 1e-12;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("camera size must be positive, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("focal length must be positive and finite, got {0}")]
    InvalidFocal(f64),
    #[error("pose is not a rigid transform")]
    NonRigidPose,
    #[error("look_at is degenerate: eye equals target or up is parallel to the view direction")]
    DegenerateLookAt,
}

// =============================================================================
// INTRINSICS
// =============================================================================

/// Convert a field of view (radians) spanning `pixels` into a focal length.
#[must_use]
pub fn fov_to_focal(fov: f64, pixels: f64) -> f64 {
    pixels / (2.0 * (fov / 2.0).tan())
}

/// Convert a focal length into the field of view (radians) it spans over `pixels`.
#[must_use]
pub fn focal_to_fov(focal: f64, pixels: f64) -> f64 {
    2.0 * (pixels / (2.0 * focal)).atan()
}

/// Pinhole intrinsics in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub width: u32,
    pub height: u32,
}

impl Intrinsics {
    /// Square-pixel intrinsics with the principal point at the image center.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvalidSize`] for a zero dimension and
    /// [`CameraError::InvalidFocal`] when `fov_x` does not yield a positive focal length.
    pub fn from_fov(fov_x: f64, width: u32, height: u32) -> Result<Self, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidSize { width, height });
        }
        let focal = fov_to_focal(fov_x, f64::from(width));
        if !focal.is_finite() || focal <= 0.0 {
            return Err(CameraError::InvalidFocal(focal));
        }
        Ok(Self {
            fx: focal,
            fy: focal,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
            width,
            height,
        })
    }

    /// The 3×3 calibration matrix `K`.
    #[must_use]
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols(
            DVec3::new(self.fx, 0.0, 0.0),
            DVec3::new(0.0, self.fy, 0.0),
            DVec3::new(self.cx, self.cy, 1.0),
        )
    }

    #[must_use]
    pub fn fov_x(&self) -> f64 {
        focal_to_fov(self.fx, f64::from(self.width))
    }

    #[must_use]
    pub fn fov_y(&self) -> f64 {
        focal_to_fov(self.fy, f64::from(self.height))
    }
}

// =============================================================================
// POSE CONVENTIONS
// =============================================================================

/// Direction of a 4×4 extrinsic matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseKind {
    WorldToCamera,
    CameraToWorld,
}

/// Camera axis convention of an externally supplied pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateConvention {
    /// x right, y down, z forward.
    #[default]
    OpenCv,
    /// x right, y up, z backward (also Blender).
    OpenGl,
    /// x left, y up, z forward.
    PyTorch3d,
}

impl CoordinateConvention {
    /// Axis flip mapping this convention's camera frame onto OpenCV's.
    /// Every flip is its own inverse.
    fn axis_flip(self) -> DMat4 {
        match self {
            Self::OpenCv => DMat4::IDENTITY,
            Self::OpenGl => DMat4::from_diagonal(DVec4::new(1.0, -1.0, -1.0, 1.0)),
            Self::PyTorch3d => DMat4::from_diagonal(DVec4::new(-1.0, -1.0, 1.0, 1.0)),
        }
    }
}

// =============================================================================
// CAMERA
// =============================================================================

/// Per-pixel gains applied by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Radians of rotation per pointer pixel.
    pub orbit: f64,
    /// World units of translation per pointer pixel.
    pub pan: f64,
    /// World units of dolly per wheel unit.
    pub zoom: f64,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self { orbit: DEFAULT_ORBIT_SENSITIVITY, pan: DEFAULT_PAN_SENSITIVITY, zoom: DEFAULT_ZOOM_SENSITIVITY }
    }
}

/// Perspective camera with a rigid pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    intrinsics: Intrinsics,
    near: f64,
    far: f64,
    sensitivity: Sensitivity,
    camera_to_world: DMat4,
    world_to_camera: DMat4,
}

impl Camera {
    /// Camera at the world origin looking down +z.
    #[must_use]
    pub fn new(intrinsics: Intrinsics) -> Self {
        Self {
            intrinsics,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            sensitivity: Sensitivity::default(),
            camera_to_world: DMat4::IDENTITY,
            world_to_camera: DMat4::IDENTITY,
        }
    }

    /// Camera at `eye` looking at `target`, with `up` hinting the world's up direction.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::DegenerateLookAt`] if `eye == target` or `up`
    /// is parallel to the viewing direction.
    pub fn look_at(intrinsics: Intrinsics, eye: DVec3, target: DVec3, up: DVec3) -> Result<Self, CameraError> {
        let forward = target - eye;
        if forward.length_squared() < DEGENERATE_EPSILON {
            return Err(CameraError::DegenerateLookAt);
        }
        let forward = forward.normalize();
        let right = forward.cross(up);
        if right.length_squared() < DEGENERATE_EPSILON {
            return Err(CameraError::DegenerateLookAt);
        }
        let right = right.normalize();
        let down = forward.cross(right);

        let mut camera = Self::new(intrinsics);
        camera.commit(DMat4::from_cols(right.extend(0.0), down.extend(0.0), forward.extend(0.0), eye.extend(1.0)));
        Ok(camera)
    }

    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    #[must_use]
    pub fn with_clip_planes(mut self, near: f64, far: f64) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    // --- Accessors ---

    #[must_use]
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    #[must_use]
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    #[must_use]
    pub fn near(&self) -> f64 {
        self.near
    }

    #[must_use]
    pub fn far(&self) -> f64 {
        self.far
    }

    #[must_use]
    pub fn camera_to_world(&self) -> DMat4 {
        self.camera_to_world
    }

    #[must_use]
    pub fn world_to_camera(&self) -> DMat4 {
        self.world_to_camera
    }

    /// Camera center in world coordinates.
    #[must_use]
    pub fn position(&self) -> DVec3 {
        self.camera_to_world.w_axis.truncate()
    }

    #[must_use]
    pub fn right(&self) -> DVec3 {
        self.camera_to_world.x_axis.truncate()
    }

    #[must_use]
    pub fn up(&self) -> DVec3 {
        -self.camera_to_world.y_axis.truncate()
    }

    #[must_use]
    pub fn forward(&self) -> DVec3 {
        self.camera_to_world.z_axis.truncate()
    }

    // --- Pose I/O ---

    /// Replace the pose with one expressed in another direction or axis convention.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::NonRigidPose`] if `pose` is not a proper rigid transform;
    /// the current pose is left untouched.
    pub fn set_pose(
        &mut self,
        pose: DMat4,
        kind: PoseKind,
        convention: CoordinateConvention,
    ) -> Result<(), CameraError> {
        if !is_rigid(&pose) {
            return Err(CameraError::NonRigidPose);
        }
        let camera_to_world = match kind {
            PoseKind::CameraToWorld => pose,
            PoseKind::WorldToCamera => rigid_inverse(&pose),
        };
        self.commit(camera_to_world * convention.axis_flip());
        Ok(())
    }

    /// The pose in the requested direction and axis convention.
    #[must_use]
    pub fn pose(&self, kind: PoseKind, convention: CoordinateConvention) -> DMat4 {
        let camera_to_world = self.camera_to_world * convention.axis_flip();
        match kind {
            PoseKind::CameraToWorld => camera_to_world,
            PoseKind::WorldToCamera => rigid_inverse(&camera_to_world),
        }
    }

    // --- Navigation ---

    /// Orbit the world about its origin as seen from the camera: yaw about
    /// the world vertical axis, then pitch about the world X axis, both
    /// applied on the world-to-camera side. The origin keeps its pixel and
    /// the camera keeps its distance to it. Angles in radians.
    pub fn rotate(&mut self, yaw: f64, pitch: f64) {
        let world_to_camera = self.world_to_camera * DMat4::from_rotation_y(yaw) * DMat4::from_rotation_x(pitch);
        self.commit(rigid_inverse(&world_to_camera));
    }

    /// Slide along the camera's right/up axes. Positive `dx` moves the
    /// camera left so the scene follows the pointer.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let offset = self.right() * (-dx * self.sensitivity.pan) + self.up() * (dy * self.sensitivity.pan);
        self.translate(offset);
    }

    /// Dolly along the viewing direction. Positive `delta` backs away.
    pub fn zoom(&mut self, delta: f64) {
        let offset = self.forward() * (-delta * self.sensitivity.zoom);
        self.translate(offset);
    }

    /// A camera for a `width`×`height` image sharing this pose. Intrinsics,
    /// principal point included, scale uniformly by the smaller of the two
    /// axis ratios so the whole original view stays visible.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvalidSize`] for a zero dimension.
    pub fn resize(&self, width: u32, height: u32) -> Result<Camera, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidSize { width, height });
        }
        let scale = (f64::from(width) / f64::from(self.intrinsics.width))
            .min(f64::from(height) / f64::from(self.intrinsics.height));
        let intrinsics = Intrinsics {
            fx: self.intrinsics.fx * scale,
            fy: self.intrinsics.fy * scale,
            cx: self.intrinsics.cx * scale,
            cy: self.intrinsics.cy * scale,
            width,
            height,
        };
        Ok(Camera { intrinsics, ..self.clone() })
    }

    /// Project a world point to pixel coordinates. Points outside the
    /// near/far range yield `None`.
    #[must_use]
    pub fn project(&self, world: DVec3) -> Option<DVec2> {
        let p = self.world_to_camera.transform_point3(world);
        if p.z <= self.near || p.z > self.far {
            return None;
        }
        Some(DVec2::new(
            self.intrinsics.fx * p.x / p.z + self.intrinsics.cx,
            self.intrinsics.fy * p.y / p.z + self.intrinsics.cy,
        ))
    }

    // --- Internals ---

    fn translate(&mut self, offset: DVec3) {
        let mut moved = self.camera_to_world;
        moved.w_axis = (self.position() + offset).extend(1.0);
        self.commit(moved);
    }

    /// Single write path for the pose pair.
    fn commit(&mut self, camera_to_world: DMat4) {
        let camera_to_world = orthonormalize(camera_to_world);
        self.world_to_camera = rigid_inverse(&camera_to_world);
        self.camera_to_world = camera_to_world;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Rebuild the rotation columns as an orthonormal right-handed basis,
/// trusting the forward axis most and the down axis second.
fn orthonormalize(m: DMat4) -> DMat4 {
    let z = m.z_axis.truncate().normalize();
    let x = m.y_axis.truncate().cross(z).normalize();
    let y = z.cross(x);
    DMat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), m.w_axis.truncate().extend(1.0))
}

/// Inverse of a rigid transform: `[Rᵀ | -Rᵀt]`.
fn rigid_inverse(m: &DMat4) -> DMat4 {
    let rt = DMat3::from_mat4(*m).transpose();
    let t = -(rt * m.w_axis.truncate());
    DMat4::from_cols(rt.x_axis.extend(0.0), rt.y_axis.extend(0.0), rt.z_axis.extend(0.0), t.extend(1.0))
}

fn is_rigid(m: &DMat4) -> bool {
    if !m.is_finite() {
        return false;
    }
    let r = DMat3::from_mat4(*m);
    let orthonormal = (r.transpose() * r).abs_diff_eq(DMat3::IDENTITY, RIGID_EPSILON);
    let proper = (r.determinant() - 1.0).abs() < RIGID_EPSILON;
    let affine = m.row(3).abs_diff_eq(DVec4::W, RIGID_EPSILON);
    orthonormal && proper && affine
}

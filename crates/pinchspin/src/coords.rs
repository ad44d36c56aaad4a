//! Conversion between detection space, scene space and screen space.

use nalgebra::{Isometry3, Matrix4, Perspective3, Point2, Point3, Vector3};
use serde::Deserialize;

use crate::landmark::Landmark;

/// Scene units spanned by the full width (and height) of the detection image.
pub const SCENE_SCALE: f32 = 3.5;

/// Lifts a detection-space landmark into scene space using [`SCENE_SCALE`].
#[inline]
pub fn to_scene(landmark: Landmark) -> Point3<f32> {
    to_scene_scaled(landmark, SCENE_SCALE)
}

/// Lifts a detection-space landmark into scene space.
///
/// The image center maps to the scene origin, Y is flipped to point up and depth is flipped so
/// that landmarks closer to the camera get larger Z values.
#[inline]
pub fn to_scene_scaled(landmark: Landmark, scale: f32) -> Point3<f32> {
    Point3::new(
        (landmark.x - 0.5) * scale,
        -(landmark.y - 0.5) * scale,
        -landmark.z * scale,
    )
}

/// Size of the render target in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    ///
    /// Returns 1.0 if either dimension is zero, negative, or not finite.
    pub fn aspect_ratio(&self) -> f32 {
        let valid = |dim: f32| dim.is_finite() && dim > 0.0;
        if valid(self.width) && valid(self.height) {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// A perspective camera looking at the scene.
///
/// NDC follow the OpenGL convention: X and Y are in range -1.0 to 1.0 for visible points, with Y
/// pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
}

impl Default for Camera {
    /// 75° vertical field of view, placed 2.5 units in front of the origin and looking at it.
    fn default() -> Self {
        Self {
            fov_y: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            eye: Point3::new(0.0, 0.0, 2.5),
            target: Point3::origin(),
        }
    }
}

impl Camera {
    /// Returns the matrix mapping scene-space points to clip space for the given viewport.
    pub fn view_projection(&self, viewport: Viewport) -> Matrix4<f32> {
        let proj = Perspective3::new(viewport.aspect_ratio(), self.fov_y, self.near, self.far);
        let view = Isometry3::look_at_rh(&self.eye, &self.target, &Vector3::y());
        proj.as_matrix() * view.to_homogeneous()
    }
}

/// Projects a scene-space position to pixel coordinates (origin top left, Y pointing down).
///
/// Returns [`None`] if the point lies in the camera's eye plane, where the perspective division
/// is undefined. Points behind the camera or outside the frustum still produce coordinates.
pub fn to_screen(
    position: &Point3<f32>,
    view_projection: &Matrix4<f32>,
    viewport: Viewport,
) -> Option<Point2<f32>> {
    let clip = view_projection * position.to_homogeneous();
    let ndc = Point3::from_homogeneous(clip)?;
    Some(Point2::new(
        (ndc.x * 0.5 + 0.5) * viewport.width,
        (-ndc.y * 0.5 + 0.5) * viewport.height,
    ))
}

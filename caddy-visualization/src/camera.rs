//! Camera state and the orbit, pan and dolly primitives that act on it

use caddy_core::{Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Keeps the polar angle away from the up axis so the view never flips.
const POLAR_EPSILON: f32 = 1e-3;

/// Smallest camera-to-target offset a move may leave behind. Anything shorter
/// loses its direction, and orbit, pan and dolly all need one.
const MIN_OFFSET: f32 = 1e-6;

/// Default camera placement, in plain numbers so it can come from a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 2.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 50.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

/// A perspective camera looking at a target point
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3f,
        target: Point3f,
        up: Vector3f,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Build a camera from its configured placement
    pub fn from_config(config: &CameraConfig, aspect_ratio: f32) -> Self {
        Self::new(
            Point3f::from(config.position),
            Point3f::from(config.target),
            Vector3f::from(config.up),
            config.fov_degrees.to_radians(),
            aspect_ratio,
            config.near,
            config.far,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix (OpenGL clip-space conventions)
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far).into_inner()
    }

    /// Projection times view
    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    /// Map a world point to normalized device coordinates.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, point: &Point3f) -> Option<Point3f> {
        let clip = self.view_projection_matrix() * point.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        Some(Point3f::from(clip.xyz() / clip.w))
    }

    /// Whether a world point lands inside the view frustum
    pub fn sees(&self, point: &Point3f) -> bool {
        self.project(point)
            .map(|ndc| ndc.iter().all(|c| (-1.0..=1.0).contains(c)))
            .unwrap_or(false)
    }

    /// Rotate the camera around the target.
    ///
    /// Angles are in radians: positive `delta_azimuth` swings the camera to
    /// the left around the up axis, positive `delta_polar` raises it toward
    /// the up axis. The distance to the target is preserved.
    pub fn orbit(&mut self, delta_azimuth: f32, delta_polar: f32) -> bool {
        let Some(up) = self.up.try_normalize(f32::EPSILON) else {
            return false;
        };
        // Work in a frame where `up` is +Y.
        let to_y_up = UnitQuaternion::rotation_between(&up, &Vector3::y())
            .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI));

        let offset = to_y_up * (self.position - self.target);
        let radius = offset.norm();
        if radius <= 0.0 || !radius.is_finite() {
            return false;
        }

        let theta = offset.x.atan2(offset.z) - delta_azimuth;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() - delta_polar)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let sin_phi = phi.sin();
        let rotated = Vector3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );

        let position = self.target + to_y_up.inverse() * rotated;
        if !keeps_direction(&position, &self.target) {
            return false;
        }
        self.position = position;
        true
    }

    /// Translate camera and target together in the view plane.
    ///
    /// Deltas are in screen pixels (y grows downward); the scene follows the
    /// pointer at the target's depth.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32, viewport_height: f32) -> bool {
        if viewport_height <= 0.0 {
            return false;
        }
        let offset = self.position - self.target;
        let Some(forward) = (-offset).try_normalize(f32::EPSILON) else {
            return false;
        };
        let Some(right) = forward.cross(&self.up).try_normalize(f32::EPSILON) else {
            return false;
        };
        let screen_up = right.cross(&forward);

        // World units covered by one pixel at the target's depth
        let half_height = offset.norm() * (self.fov / 2.0).tan();
        let per_pixel = 2.0 * half_height / viewport_height;

        let shift = -right * (delta_x * per_pixel) + screen_up * (delta_y * per_pixel);
        if !shift.iter().all(|c| c.is_finite()) {
            return false;
        }
        let (position, target) = (self.position + shift, self.target + shift);
        if !keeps_direction(&position, &target) {
            return false;
        }
        self.position = position;
        self.target = target;
        true
    }

    /// Scale the distance to the target by `scale` (below 1 moves closer)
    pub fn dolly(&mut self, scale: f32) -> bool {
        self.set_distance(self.distance() * scale)
    }

    /// Move along the view direction to sit exactly `distance` from the target.
    ///
    /// Rejected when the result would come within `MIN_OFFSET` of the target
    /// or leave the representable range.
    pub fn set_distance(&mut self, distance: f32) -> bool {
        if !distance.is_finite() || distance <= 0.0 {
            return false;
        }
        let Some(direction) = (self.position - self.target).try_normalize(f32::EPSILON) else {
            return false;
        };
        let position = self.target + direction * distance;
        if !keeps_direction(&position, &self.target) {
            return false;
        }
        self.position = position;
        true
    }

    /// Center the target on a bounding box and back off until the box's
    /// bounding sphere fits the vertical field of view
    pub fn focus_on(&mut self, min: Point3f, max: Point3f) {
        let center = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() * 0.5).max(1e-3);
        let distance = radius / (self.fov * 0.5).sin();

        let direction = (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        self.target = center;
        self.position = center + direction * distance;
    }
}

/// Finite and far enough from `target` that the view direction survives
fn keeps_direction(position: &Point3f, target: &Point3f) -> bool {
    position.coords.iter().all(|c| c.is_finite()) && (position - target).norm() > MIN_OFFSET
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_camera_on_z_axis() {
        let camera = Camera::default();
        assert_eq!(camera.position, Point3f::new(0.0, 0.0, 2.0));
        assert_eq!(camera.target, Point3f::origin());
        assert_relative_eq!(camera.fov, 50f32.to_radians());
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::default();
        let ndc = camera.project(&Point3f::origin()).unwrap();
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(camera.project(&Point3f::new(0.0, 0.0, 5.0)).is_none());
    }

    #[test]
    fn test_orbit_preserves_distance_and_target() {
        let mut camera = Camera::default();
        assert!(camera.orbit(0.7, -0.3));
        assert_relative_eq!(camera.distance(), 2.0, epsilon = 1e-5);
        assert_eq!(camera.target, Point3f::origin());
        assert!(camera.position.x.abs() > 0.1);
    }

    #[test]
    fn test_orbit_quarter_turn() {
        let mut camera = Camera::default();
        camera.orbit(-std::f32::consts::FRAC_PI_2, 0.0);
        assert_relative_eq!(camera.position.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orbit_never_crosses_the_pole() {
        let mut camera = Camera::default();
        camera.orbit(0.0, 10.0);
        assert!(camera.position.y < 2.0);
        assert!(camera.position.x.abs() + camera.position.z.abs() > 0.0);
        // View matrix stays finite at the clamp.
        assert!(camera.view_matrix().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_pan_moves_position_and_target_together() {
        let mut camera = Camera::default();
        let before = camera.position - camera.target;
        assert!(camera.pan(100.0, -50.0, 800.0));

        let after = camera.position - camera.target;
        assert_relative_eq!(before, after, epsilon = 1e-6);
        // Dragging right moves the camera left.
        assert!(camera.target.x < 0.0);
        // Dragging up moves the camera down.
        assert!(camera.target.y < 0.0);
    }

    #[test]
    fn test_pan_is_not_clamped() {
        let mut camera = Camera::default();
        for _ in 0..1000 {
            assert!(camera.pan(1.0e4, 0.0, 100.0));
        }
        assert!(camera.target.x < -1.0e5);
    }

    #[test]
    fn test_dolly_scales_distance() {
        let mut camera = Camera::default();
        assert!(camera.dolly(0.5));
        assert_relative_eq!(camera.distance(), 1.0, epsilon = 1e-6);
        assert!(camera.dolly(100.0));
        assert_relative_eq!(camera.distance(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_set_distance_rejects_collapse() {
        let mut camera = Camera::default();
        assert!(!camera.set_distance(0.0));
        assert!(!camera.set_distance(f32::INFINITY));
        assert!(!camera.set_distance(f32::NAN));
        assert_eq!(camera.position, Point3f::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_close_approach_stays_reversible() {
        let mut camera = Camera::default();
        assert!(!camera.set_distance(MIN_OFFSET * 0.5));
        assert!(camera.set_distance(MIN_OFFSET * 4.0));

        assert!(camera.dolly(1.0e6));
        assert_relative_eq!(camera.distance(), 4.0, epsilon = 1e-3);
        assert!(camera.pan(10.0, 10.0, 600.0));
        assert!(camera.orbit(0.5, 0.2));
    }

    #[test]
    fn test_focus_on_frames_box() {
        let mut camera = Camera::default();
        camera.focus_on(Point3f::new(9.0, 9.0, 9.0), Point3f::new(11.0, 11.0, 11.0));
        assert_eq!(camera.target, Point3f::new(10.0, 10.0, 10.0));
        assert!(camera.sees(&Point3f::new(9.0, 9.0, 11.0)));
        assert!(camera.sees(&Point3f::new(11.0, 11.0, 9.0)));
    }
}

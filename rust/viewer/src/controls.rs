// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Damped orbit navigation
//!
//! The controls are bound to exactly one camera (the active one) and move its
//! position on a sphere around its target. Input accumulates as pending
//! motion; each `update` applies a damped share of it. Without pending motion
//! `update` leaves the pose untouched.
//!
//! Zooming dollies a perspective camera toward its target. An orthographic
//! camera keeps its distance and scales its frustum instead.

use std::f32::consts::PI;

use nalgebra::Vector3;

use crate::camera::{ActiveCameraMut, CameraManager, CameraPose, OrthographicCamera, ViewMode};
use crate::config::ControlsConfig;

const REST_EPSILON: f32 = 1e-6;
const POLAR_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: ControlsConfig,
    bound: ViewMode,
    pending_azimuth: f32,
    pending_polar: f32,
    /// Multiplicative dolly factor, 1.0 = none
    pending_zoom: f32,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            config: config.clone(),
            bound: ViewMode::Perspective,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 1.0,
        }
    }

    /// Camera the controls currently drive
    pub fn bound(&self) -> ViewMode {
        self.bound
    }

    /// Re-bind to another camera, dropping motion meant for the previous one
    pub fn attach(&mut self, mode: ViewMode) {
        self.bound = mode;
        self.stop();
    }

    /// Discard pending motion
    pub fn stop(&mut self) {
        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_zoom = 1.0;
    }

    pub fn is_idle(&self) -> bool {
        self.pending_azimuth.abs() < REST_EPSILON
            && self.pending_polar.abs() < REST_EPSILON
            && (self.pending_zoom - 1.0).abs() < REST_EPSILON
    }

    /// Queue a rotation in radians
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) {
        self.pending_azimuth += d_azimuth;
        self.pending_polar += d_polar;
    }

    /// Queue a rotation from a pointer drag of `(dx, dy)` pixels
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        let per_pixel = 2.0 * PI / viewport_height.max(1) as f32 * self.config.rotate_speed;
        self.rotate(-dx * per_pixel, -dy * per_pixel);
    }

    /// Queue a dolly; `scale > 1` moves away from the target
    pub fn zoom(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.pending_zoom *= scale;
        }
    }

    /// Apply pending motion to whichever camera is active
    pub fn update_active(&mut self, cameras: &mut CameraManager) -> bool {
        match cameras.active_mut() {
            ActiveCameraMut::Perspective(camera) => self.update(&mut camera.pose),
            ActiveCameraMut::Orthographic(camera) => self.update_orthographic(camera),
        }
    }

    /// Apply pending motion to `pose`, dollying on zoom. Returns whether the
    /// pose moved.
    pub fn update(&mut self, pose: &mut CameraPose) -> bool {
        self.advance(pose, true).is_some()
    }

    /// Orbit an orthographic camera; zoom scales its frustum and leaves the
    /// distance to the target alone.
    pub fn update_orthographic(&mut self, camera: &mut OrthographicCamera) -> bool {
        match self.advance(&mut camera.pose, false) {
            Some(zoom) => {
                camera.scale_frustum(zoom);
                true
            }
            None => false,
        }
    }

    /// Step the pending motion once. Returns the zoom factor applied this
    /// step, or `None` when nothing moved.
    fn advance(&mut self, pose: &mut CameraPose, dolly: bool) -> Option<f32> {
        if self.is_idle() {
            self.stop();
            return None;
        }

        let offset = pose.position - pose.target;
        let radius = offset.norm();
        if radius < REST_EPSILON {
            self.stop();
            return None;
        }

        let share = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };

        let azimuth = offset.x.atan2(offset.z) + self.pending_azimuth * share;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.pending_polar * share)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let zoom = self.pending_zoom.powf(share);
        let radius = if dolly {
            (radius * zoom).clamp(self.config.min_distance, self.config.max_distance)
        } else {
            radius
        };

        pose.position = pose.target
            + Vector3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );

        if self.config.enable_damping {
            self.pending_azimuth *= 1.0 - share;
            self.pending_polar *= 1.0 - share;
            self.pending_zoom = self.pending_zoom.powf(1.0 - share);
            if self.is_idle() {
                self.stop();
            }
        } else {
            self.stop();
        }
        Some(zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn undamped() -> OrbitControls {
        OrbitControls::new(&ControlsConfig {
            enable_damping: false,
            ..ControlsConfig::default()
        })
    }

    #[test]
    fn test_idle_update_leaves_pose_untouched() {
        let mut controls = OrbitControls::new(&ControlsConfig::default());
        let mut pose = CameraPose::new(Point3::new(8.0, 13.0, 15.0), Point3::new(-2.0, 0.0, 0.0));
        let before = pose;

        for _ in 0..100 {
            assert!(!controls.update(&mut pose));
        }
        assert_eq!(pose, before);
    }

    #[test]
    fn test_rotation_keeps_distance_to_target() {
        let mut controls = undamped();
        let mut pose = CameraPose::new(Point3::new(0.0, 0.0, 10.0), Point3::origin());

        controls.rotate(PI / 2.0, 0.0);
        assert!(controls.update(&mut pose));

        assert_relative_eq!(pose.position, Point3::new(10.0, 0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(pose.distance(), 10.0, epsilon = 1e-4);
        assert!(controls.is_idle());
    }

    #[test]
    fn test_damping_spreads_motion_over_frames() {
        let mut controls = OrbitControls::new(&ControlsConfig::default());
        let mut pose = CameraPose::new(Point3::new(0.0, 0.0, 10.0), Point3::origin());

        controls.rotate(1.0, 0.0);
        controls.update(&mut pose);
        let first_step = pose.position.x;
        assert!(first_step > 0.0);
        assert!(!controls.is_idle());

        for _ in 0..1000 {
            controls.update(&mut pose);
        }
        assert!(controls.is_idle());
        let azimuth = pose.position.x.atan2(pose.position.z);
        assert_relative_eq!(azimuth, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut controls = undamped();
        let mut pose = CameraPose::new(Point3::new(0.0, 0.0, 10.0), Point3::origin());

        controls.zoom(1e9);
        controls.update(&mut pose);
        assert_relative_eq!(pose.distance(), ControlsConfig::default().max_distance, epsilon = 1e-1);
    }

    #[test]
    fn test_orthographic_zoom_scales_frustum() {
        let mut controls = undamped();
        controls.attach(ViewMode::FrontOrthographic);
        let mut camera = OrthographicCamera {
            left: -4.0,
            right: 4.0,
            top: 3.0,
            bottom: -3.0,
            near: 0.1,
            far: 1000.0,
            pose: CameraPose::new(Point3::new(1.0, 2.0, 9.0), Point3::new(1.0, 2.0, 0.0)),
        };

        controls.zoom(0.5);
        assert!(controls.update_orthographic(&mut camera));

        assert_relative_eq!(camera.pose.distance(), 9.0, epsilon = 1e-4);
        assert_relative_eq!(camera.right, 2.0, epsilon = 1e-5);
        assert_relative_eq!(camera.left, -2.0, epsilon = 1e-5);
        assert_relative_eq!(camera.top, 1.5, epsilon = 1e-5);
        assert_relative_eq!(camera.bottom, -1.5, epsilon = 1e-5);
        assert!(controls.is_idle());
    }

    #[test]
    fn test_attach_drops_pending_motion() {
        let mut controls = OrbitControls::new(&ControlsConfig::default());
        controls.rotate(0.5, 0.5);
        controls.attach(ViewMode::FrontOrthographic);

        assert!(controls.is_idle());
        assert_eq!(controls.bound(), ViewMode::FrontOrthographic);
    }
}

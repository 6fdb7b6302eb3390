// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera manager
//!
//! Owns a perspective and an orthographic camera and selects which one is
//! active. Only the active camera is rendered and driven by the orbit
//! controls. Entering the front view refits the orthographic frustum to the
//! model's bounding box.

use nalgebra::{Isometry3, Matrix4, Orthographic3, Perspective3, Point2, Point3, Vector3};
use serde::Serialize;

use crate::bounds::BoundingExtent;
use crate::config::CameraConfig;
use crate::error::{Result, ViewerError};
use crate::model::Model;
use crate::picking::Ray;
use crate::viewport::Viewport;

/// Which camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Perspective,
    FrontOrthographic,
}

/// Camera placement: position, aim point and up direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl CameraPose {
    /// Y-up pose looking from `position` at `target`
    pub fn new(position: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            position,
            target,
            up: Vector3::y(),
        }
    }

    /// World-to-camera transform
    #[inline]
    pub fn view(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Distance between the camera and its aim point
    pub fn distance(&self) -> f32 {
        nalgebra::distance(&self.position, &self.target)
    }
}

/// Perspective projection parameters plus pose
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub pose: CameraPose,
}

impl PerspectiveCamera {
    pub fn projection(&self) -> Perspective3<f32> {
        Perspective3::new(self.aspect, self.fov_degrees.to_radians(), self.near, self.far)
    }
}

/// Orthographic frustum bounds plus pose
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub pose: CameraPose,
}

impl OrthographicCamera {
    pub fn projection(&self) -> Orthographic3<f32> {
        Orthographic3::new(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    /// Scale the frustum bounds around their center; `factor < 1` magnifies
    pub fn scale_frustum(&mut self, factor: f32) {
        let center_x = (self.left + self.right) / 2.0;
        let center_y = (self.top + self.bottom) / 2.0;
        let half_width = (self.right - self.left) / 2.0 * factor;
        let half_height = (self.top - self.bottom) / 2.0 * factor;
        self.left = center_x - half_width;
        self.right = center_x + half_width;
        self.top = center_y + half_height;
        self.bottom = center_y - half_height;
    }

    fn apply_fit(&mut self, fit: &FrontViewFit) {
        self.left = fit.left;
        self.right = fit.right;
        self.top = fit.top;
        self.bottom = fit.bottom;
        self.near = fit.near;
        self.far = fit.far;
        self.pose = CameraPose::new(fit.center + Vector3::new(0.0, 0.0, fit.distance), fit.center);
    }
}

/// Projection of whichever camera is active
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Perspective(Perspective3<f32>),
    Orthographic(Orthographic3<f32>),
}

impl Projection {
    pub fn matrix(&self) -> Matrix4<f32> {
        match self {
            Projection::Perspective(p) => p.to_homogeneous(),
            Projection::Orthographic(o) => o.to_homogeneous(),
        }
    }

    /// Camera-space point to NDC
    pub fn project_point(&self, point: &Point3<f32>) -> Point3<f32> {
        match self {
            Projection::Perspective(p) => p.project_point(point),
            Projection::Orthographic(o) => o.project_point(point),
        }
    }

    /// NDC point back to camera space
    pub fn unproject_point(&self, point: &Point3<f32>) -> Point3<f32> {
        match self {
            Projection::Perspective(p) => p.unproject_point(point),
            Projection::Orthographic(o) => o.unproject_point(point),
        }
    }
}

/// Everything the render loop needs from the active camera for one frame
#[derive(Debug, Clone, Copy)]
pub struct CameraSnapshot {
    pub mode: ViewMode,
    pub pose: CameraPose,
    pub view: Isometry3<f32>,
    pub projection: Projection,
}

impl CameraSnapshot {
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view.to_homogeneous()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix()
    }

    /// Combined projection * view, column-major for WebGL
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// World point to NDC
    pub fn project(&self, world: &Point3<f32>) -> Point3<f32> {
        self.projection.project_point(&self.view.transform_point(world))
    }

    /// Ray from the near plane through an NDC position
    pub fn ray_through(&self, ndc: Point2<f32>) -> Ray {
        let camera_to_world = self.view.inverse();
        let near = camera_to_world
            .transform_point(&self.projection.unproject_point(&Point3::new(ndc.x, ndc.y, -1.0)));
        let far = camera_to_world
            .transform_point(&self.projection.unproject_point(&Point3::new(ndc.x, ndc.y, 1.0)));
        Ray::new(near, (far - near).normalize())
    }
}

/// Result of fitting the orthographic camera to a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontViewFit {
    pub center: Point3<f32>,
    pub max_dimension: f32,
    pub distance: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

/// Frame `extent` for an orthographic camera placed in front of it (+Z).
///
/// `distance = max_dimension * fit_factor`; the frustum is `distance` tall
/// and `distance * aspect` wide. Portrait viewports grow the height instead
/// so the width still covers `distance`. Near and far widen from the given
/// defaults when the box depth needs it.
pub fn fit_front_view(
    extent: &BoundingExtent,
    aspect: f32,
    fit_factor: f32,
    min_extent: f32,
    default_near: f32,
    default_far: f32,
) -> FrontViewFit {
    let center = extent.center();
    let half_depth = extent.size().z / 2.0;

    let max_dimension = match extent.max_dimension() {
        d if d > f32::EPSILON => d,
        _ => min_extent,
    };
    let distance = max_dimension * fit_factor;

    let half_height = if aspect >= 1.0 {
        distance / 2.0
    } else {
        distance / (2.0 * aspect)
    };
    let half_width = half_height * aspect;

    FrontViewFit {
        center,
        max_dimension,
        distance,
        left: -half_width,
        right: half_width,
        top: half_height,
        bottom: -half_height,
        near: default_near.min((distance - half_depth) * 0.5),
        far: default_far.max((distance + half_depth) * 1.01),
    }
}

/// Borrowed view of the active camera
#[derive(Debug, Clone, Copy)]
pub enum ActiveCamera<'a> {
    Perspective(&'a PerspectiveCamera),
    Orthographic(&'a OrthographicCamera),
}

/// Mutable view of the active camera, handed to the orbit controls
#[derive(Debug)]
pub enum ActiveCameraMut<'a> {
    Perspective(&'a mut PerspectiveCamera),
    Orthographic(&'a mut OrthographicCamera),
}

/// Owner of both cameras and the active selector
#[derive(Debug, Clone)]
pub struct CameraManager {
    perspective: PerspectiveCamera,
    orthographic: OrthographicCamera,
    mode: ViewMode,
    config: CameraConfig,
    fit_factor: f32,
}

impl CameraManager {
    pub fn new(config: &CameraConfig, fit_factor: f32, viewport: &Viewport) -> Self {
        let aspect = viewport.aspect();
        let half = config.frustum_size / 2.0;
        Self {
            perspective: PerspectiveCamera {
                fov_degrees: config.fov_degrees,
                aspect,
                near: config.perspective_near,
                far: config.perspective_far,
                pose: CameraPose::new(
                    Point3::from(config.perspective_position),
                    Point3::from(config.orbit_target),
                ),
            },
            orthographic: OrthographicCamera {
                left: -half * aspect,
                right: half * aspect,
                top: half,
                bottom: -half,
                near: config.ortho_near,
                far: config.ortho_far,
                pose: CameraPose::new(
                    Point3::from(config.ortho_position),
                    Point3::from(config.ortho_target),
                ),
            },
            mode: ViewMode::Perspective,
            config: config.clone(),
            fit_factor,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn perspective(&self) -> &PerspectiveCamera {
        &self.perspective
    }

    pub fn orthographic(&self) -> &OrthographicCamera {
        &self.orthographic
    }

    /// The camera currently rendered and driven by the controls
    pub fn active(&self) -> ActiveCamera<'_> {
        match self.mode {
            ViewMode::Perspective => ActiveCamera::Perspective(&self.perspective),
            ViewMode::FrontOrthographic => ActiveCamera::Orthographic(&self.orthographic),
        }
    }

    pub fn active_mut(&mut self) -> ActiveCameraMut<'_> {
        match self.mode {
            ViewMode::Perspective => ActiveCameraMut::Perspective(&mut self.perspective),
            ViewMode::FrontOrthographic => ActiveCameraMut::Orthographic(&mut self.orthographic),
        }
    }

    pub fn active_pose(&self) -> &CameraPose {
        match self.mode {
            ViewMode::Perspective => &self.perspective.pose,
            ViewMode::FrontOrthographic => &self.orthographic.pose,
        }
    }

    /// The active camera as seen by the render loop
    pub fn snapshot(&self) -> CameraSnapshot {
        match self.mode {
            ViewMode::Perspective => self.perspective_snapshot(),
            ViewMode::FrontOrthographic => {
                let pose = self.orthographic.pose;
                CameraSnapshot {
                    mode: ViewMode::FrontOrthographic,
                    pose,
                    view: pose.view(),
                    projection: Projection::Orthographic(self.orthographic.projection()),
                }
            }
        }
    }

    /// The perspective camera regardless of which one is active.
    ///
    /// Click picking always casts from here, also in the front view.
    pub fn perspective_snapshot(&self) -> CameraSnapshot {
        let pose = self.perspective.pose;
        CameraSnapshot {
            mode: ViewMode::Perspective,
            pose,
            view: pose.view(),
            projection: Projection::Perspective(self.perspective.projection()),
        }
    }

    /// Make the perspective camera active
    pub fn use_perspective(&mut self) {
        self.mode = ViewMode::Perspective;
        tracing::debug!("Switched to perspective view");
    }

    /// Fit the orthographic camera in front of the model and make it active.
    ///
    /// Leaves every camera untouched when there is nothing to frame.
    pub fn use_front_orthographic_view(
        &mut self,
        model: Option<&Model>,
        viewport: &Viewport,
    ) -> Result<FrontViewFit> {
        let model = model.ok_or(ViewerError::NoModelLoaded)?;
        let extent = model.bounding_extent();
        if !extent.is_valid() {
            return Err(ViewerError::EmptyModel);
        }

        let fit = fit_front_view(
            &extent,
            viewport.aspect(),
            self.fit_factor,
            self.config.min_fit_extent,
            self.config.ortho_near,
            self.config.ortho_far,
        );
        self.orthographic.apply_fit(&fit);
        self.mode = ViewMode::FrontOrthographic;

        tracing::debug!(
            max_dimension = fit.max_dimension,
            distance = fit.distance,
            "Switched to front orthographic view"
        );
        Ok(fit)
    }

    /// Follow a viewport change. Only the perspective aspect tracks the
    /// viewport; the orthographic frustum changes on the next front view.
    pub fn resize(&mut self, viewport: &Viewport) {
        self.perspective.aspect = viewport.aspect();
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer state and command dispatch
//!
//! [`Viewer`] owns everything the page used to keep in globals: scene,
//! cameras, controls, viewport and the load sequence. Hosts translate UI
//! events into [`Command`]s and call [`Viewer::frame`] once per animation
//! frame.

use serde::{Deserialize, Serialize};

use crate::camera::{CameraManager, CameraSnapshot, ViewMode};
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::error::{LoadError, Result};
use crate::export::{self, ExportedImage};
use crate::host::ViewerHost;
use crate::interaction::{ClickOutcome, InteractionController};
use crate::loader::{LoadOutcome, LoadTicket, LoadTracker, ModelLoader};
use crate::model::Model;
use crate::scene::Scene;
use crate::viewport::Viewport;

/// A user action, already stripped of its DOM event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Resize {
        width: u32,
        height: u32,
        #[serde(default = "default_pixel_ratio", rename = "pixelRatio")]
        pixel_ratio: f32,
    },
    Click {
        x: f32,
        y: f32,
    },
    KeyDown {
        key: String,
    },
    PerspectiveView,
    FrontView,
    SaveImage,
    /// Pointer drag in CSS pixels
    Orbit {
        dx: f32,
        dy: f32,
    },
    Zoom {
        scale: f32,
    },
}

fn default_pixel_ratio() -> f32 {
    1.0
}

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandOutcome {
    #[serde(rename_all = "camelCase")]
    Resized {
        surface_width: u32,
        surface_height: u32,
        pixel_ratio: f32,
    },
    Clicked(ClickOutcome),
    ViewChanged {
        mode: ViewMode,
    },
    #[serde(rename_all = "camelCase")]
    Exported {
        filename: String,
        mime_type: &'static str,
        size: usize,
    },
    /// Motion queued for the next frames
    Moved,
    /// Nothing to do (no model, unbound key)
    Ignored,
}

impl From<&ExportedImage> for CommandOutcome {
    fn from(image: &ExportedImage) -> Self {
        CommandOutcome::Exported {
            filename: image.filename.clone(),
            mime_type: image.mime_type,
            size: image.bytes.len(),
        }
    }
}

/// Everything the viewer mutates
#[derive(Debug)]
pub struct ViewerState {
    pub config: ViewerConfig,
    pub viewport: Viewport,
    pub scene: Scene,
    pub cameras: CameraManager,
    pub controls: OrbitControls,
    pub interaction: InteractionController,
    pub loads: LoadTracker,
}

#[derive(Debug)]
pub struct Viewer {
    state: ViewerState,
}

impl Viewer {
    /// Build the initial scene: lights, helpers, perspective camera active.
    pub fn new(config: ViewerConfig, viewport: Viewport) -> Self {
        let scene = Scene::with_defaults(&config.scene);
        let cameras = CameraManager::new(&config.camera, config.fit_factor, &viewport);
        let controls = OrbitControls::new(&config.controls);
        let interaction = InteractionController::new(config.highlight_color);

        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "Viewer initialized"
        );

        Self {
            state: ViewerState {
                config,
                viewport,
                scene,
                cameras,
                controls,
                interaction,
                loads: LoadTracker::new(),
            },
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.state.config
    }

    pub fn scene(&self) -> &Scene {
        &self.state.scene
    }

    pub fn model(&self) -> Option<&Model> {
        self.state.scene.model()
    }

    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    pub fn mode(&self) -> ViewMode {
        self.state.cameras.mode()
    }

    pub fn cameras(&self) -> &CameraManager {
        &self.state.cameras
    }

    pub fn camera(&self) -> CameraSnapshot {
        self.state.cameras.snapshot()
    }

    /// Route a command to its handler
    pub fn dispatch(&mut self, command: Command, host: &mut dyn ViewerHost) -> Result<CommandOutcome> {
        match command {
            Command::Resize {
                width,
                height,
                pixel_ratio,
            } => Ok(self.resize(width, height, pixel_ratio)),
            Command::Click { x, y } => Ok(self
                .click(x, y)
                .map(CommandOutcome::Clicked)
                .unwrap_or(CommandOutcome::Ignored)),
            Command::KeyDown { key } => self.key_down(&key, host),
            Command::PerspectiveView => {
                self.use_perspective();
                Ok(CommandOutcome::ViewChanged { mode: self.mode() })
            }
            Command::FrontView => {
                self.front_view()?;
                Ok(CommandOutcome::ViewChanged { mode: self.mode() })
            }
            Command::SaveImage => self.save_image(host).map(|image| CommandOutcome::from(&image)),
            Command::Orbit { dx, dy } => {
                self.orbit(dx, dy);
                Ok(CommandOutcome::Moved)
            }
            Command::Zoom { scale } => {
                self.zoom(scale);
                Ok(CommandOutcome::Moved)
            }
        }
    }

    /// One animation frame: step the controls, then render the active camera.
    ///
    /// Render failures are logged and the loop keeps going.
    pub fn frame(&mut self, host: &mut dyn ViewerHost) -> bool {
        let state = &mut self.state;
        state.controls.update_active(&mut state.cameras);

        let snapshot = state.cameras.snapshot();
        match host.render(&state.scene, &snapshot) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Frame render failed");
                false
            }
        }
    }

    /// Activate the perspective camera and hand it the controls
    pub fn use_perspective(&mut self) {
        let state = &mut self.state;
        state.cameras.use_perspective();
        state.controls.attach(ViewMode::Perspective);
        state.controls.update_active(&mut state.cameras);
    }

    /// Frame the model head-on with the orthographic camera.
    ///
    /// Without a model (or without geometry) this returns an error and the
    /// active camera stays as it was.
    pub fn front_view(&mut self) -> Result<()> {
        let state = &mut self.state;
        state
            .cameras
            .use_front_orthographic_view(state.scene.model(), &state.viewport)?;
        state.controls.attach(ViewMode::FrontOrthographic);
        state.controls.update_active(&mut state.cameras);
        Ok(())
    }

    /// Follow a host resize: viewport and perspective aspect. The
    /// orthographic frustum is left as it is.
    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) -> CommandOutcome {
        let state = &mut self.state;
        state.viewport = Viewport::new(width, height).with_pixel_ratio(pixel_ratio);
        state.cameras.resize(&state.viewport);

        let max_ratio = state.config.max_pixel_ratio;
        let (surface_width, surface_height) = state.viewport.surface_size(max_ratio);
        CommandOutcome::Resized {
            surface_width,
            surface_height,
            pixel_ratio: state.viewport.effective_pixel_ratio(max_ratio),
        }
    }

    /// Pick, highlight and measure at a screen position.
    ///
    /// The pick ray always comes from the perspective camera, also while the
    /// front view is shown.
    pub fn click(&mut self, x: f32, y: f32) -> Option<ClickOutcome> {
        let state = &mut self.state;
        let snapshot = state.cameras.perspective_snapshot();
        state
            .interaction
            .handle_click(state.scene.model_mut(), &snapshot, &state.viewport, x, y)
    }

    /// Keyboard shortcut handling; only the export key is bound
    pub fn key_down(&mut self, key: &str, host: &mut dyn ViewerHost) -> Result<CommandOutcome> {
        if key != self.state.config.export.key {
            return Ok(CommandOutcome::Ignored);
        }
        self.save_image(host).map(|image| CommandOutcome::from(&image))
    }

    pub fn save_image(&mut self, host: &mut dyn ViewerHost) -> Result<ExportedImage> {
        let state = &self.state;
        export::save_image(
            &state.scene,
            &state.cameras.snapshot(),
            host,
            &state.config.export,
        )
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let height = self.state.viewport.height;
        self.state.controls.rotate_by_pixels(dx, dy, height);
    }

    pub fn zoom(&mut self, scale: f32) {
        self.state.controls.zoom(scale);
    }

    /// Start loading a newly selected file
    pub fn begin_load(&mut self) -> LoadTicket {
        let ticket = self.state.loads.begin();
        tracing::debug!(ticket = ticket.0, "Model load started");
        ticket
    }

    /// Apply a finished load if `ticket` is still the latest one.
    ///
    /// A successful load replaces any previous model. A failed load leaves
    /// the scene as it was.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<Model, LoadError>,
    ) -> Result<LoadOutcome> {
        if !self.state.loads.complete(ticket) {
            tracing::debug!(ticket = ticket.0, "Discarding superseded model load");
            return Ok(LoadOutcome::Superseded);
        }

        let model = result.map_err(|e| {
            tracing::warn!(ticket = ticket.0, error = %e, "Model load failed");
            e
        })?;

        let meshes = model.mesh_count();
        let replaced = self.state.scene.set_model(model).is_some();
        tracing::info!(ticket = ticket.0, meshes, replaced, "IFC model loaded");
        Ok(LoadOutcome::Loaded { meshes })
    }

    /// Parse `bytes` with `loader` and finish `ticket` with the result
    pub fn load_bytes(
        &mut self,
        ticket: LoadTicket,
        bytes: &[u8],
        loader: &dyn ModelLoader,
    ) -> Result<LoadOutcome> {
        let result = loader.load(bytes);
        self.finish_load(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use crate::host::HeadlessHost;
    use crate::model::tests::box_geometry;
    use crate::model::{Material, ModelNode};
    use nalgebra::Point3;

    fn viewer() -> Viewer {
        Viewer::new(ViewerConfig::default(), Viewport::new(800, 600))
    }

    fn box_model() -> Model {
        Model::new(ModelNode::group("model").with_child(ModelNode::mesh(
            box_geometry(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 2.0, 6.0)),
            Some(Material::from_rgba([0.5, 0.5, 0.5, 1.0])),
        )))
    }

    fn loaded_viewer() -> Viewer {
        let mut viewer = viewer();
        let ticket = viewer.begin_load();
        viewer.finish_load(ticket, Ok(box_model())).unwrap();
        viewer
    }

    #[test]
    fn test_initial_state() {
        let viewer = viewer();
        assert_eq!(viewer.mode(), ViewMode::Perspective);
        assert!(viewer.model().is_none());
        assert_eq!(viewer.scene().objects().len(), 4);
    }

    #[test]
    fn test_front_view_without_model_keeps_perspective() {
        let mut viewer = viewer();
        let mut host = HeadlessHost::new(8, 8);

        let err = viewer.dispatch(Command::FrontView, &mut host).unwrap_err();

        assert!(matches!(err, ViewerError::NoModelLoaded));
        assert_eq!(viewer.mode(), ViewMode::Perspective);
    }

    #[test]
    fn test_front_view_switches_mode() {
        let mut viewer = loaded_viewer();
        let mut host = HeadlessHost::new(8, 8);

        let outcome = viewer.dispatch(Command::FrontView, &mut host).unwrap();

        assert_eq!(
            outcome,
            CommandOutcome::ViewChanged {
                mode: ViewMode::FrontOrthographic
            }
        );
        assert_eq!(viewer.state().controls.bound(), ViewMode::FrontOrthographic);
        assert!(viewer.frame(&mut host));
        assert_eq!(host.last_mode(), Some(ViewMode::FrontOrthographic));
    }

    #[test]
    fn test_resize_leaves_front_view_frustum() {
        let mut viewer = loaded_viewer();
        viewer.front_view().unwrap();
        let ortho_before = viewer.cameras().orthographic().clone();

        let outcome = viewer.resize(400, 800, 3.0);

        assert_eq!(viewer.mode(), ViewMode::FrontOrthographic);
        assert_eq!(viewer.cameras().orthographic(), &ortho_before);
        assert_eq!(viewer.cameras().perspective().aspect, 0.5);
        assert_eq!(
            outcome,
            CommandOutcome::Resized {
                surface_width: 800,
                surface_height: 1600,
                pixel_ratio: 2.0
            }
        );
    }

    #[test]
    fn test_export_key_triggers_download() {
        let mut viewer = viewer();
        let mut host = HeadlessHost::new(8, 8);

        let ignored = viewer
            .dispatch(Command::KeyDown { key: "x".into() }, &mut host)
            .unwrap();
        assert_eq!(ignored, CommandOutcome::Ignored);
        assert!(host.downloads().is_empty());

        let exported = viewer
            .dispatch(Command::KeyDown { key: "s".into() }, &mut host)
            .unwrap();
        assert!(matches!(exported, CommandOutcome::Exported { ref filename, .. } if filename == "scene.jpeg"));
        assert_eq!(host.downloads().len(), 1);
    }

    #[test]
    fn test_click_in_front_view_picks_through_perspective_camera() {
        let mut viewer = viewer();
        let mut host = HeadlessHost::new(8, 8);
        let grey = || Some(Material::from_rgba([0.5, 0.5, 0.5, 1.0]));
        // One cube on the perspective aim point, one far off to the side, so
        // the front view's center lands between them.
        let model = Model::new(
            ModelNode::group("model")
                .with_child(ModelNode::mesh(
                    box_geometry(Point3::new(-2.5, -0.5, -0.5), Point3::new(-1.5, 0.5, 0.5)),
                    grey(),
                )
                .with_express_id(1))
                .with_child(ModelNode::mesh(
                    box_geometry(Point3::new(19.5, -0.5, -0.5), Point3::new(20.5, 0.5, 0.5)),
                    grey(),
                )
                .with_express_id(2)),
        );
        let ticket = viewer.begin_load();
        viewer.finish_load(ticket, Ok(model)).unwrap();
        viewer.dispatch(Command::FrontView, &mut host).unwrap();

        let outcome = viewer
            .dispatch(Command::Click { x: 400.0, y: 300.0 }, &mut host)
            .unwrap();

        let CommandOutcome::Clicked(click) = outcome else {
            panic!("expected a click outcome, got {outcome:?}");
        };
        let selected = click.selected.unwrap();
        let node = viewer.model().unwrap().node(selected).unwrap();
        assert_eq!(node.express_id, Some(1));
        assert!(click.highlighted);
        assert_eq!(viewer.mode(), ViewMode::FrontOrthographic);
    }

    #[test]
    fn test_front_view_zoom_magnifies_without_clipping() {
        let mut viewer = loaded_viewer();
        let mut host = HeadlessHost::new(8, 8);
        viewer.front_view().unwrap();
        let corner = Point3::new(4.0, 2.0, 6.0);
        let before = viewer.camera().project(&corner);
        let distance = viewer.cameras().orthographic().pose.distance();

        for _ in 0..40 {
            viewer.dispatch(Command::Zoom { scale: 0.95 }, &mut host).unwrap();
        }
        for _ in 0..2000 {
            viewer.frame(&mut host);
        }

        let after = viewer.camera().project(&corner);
        assert!(after.x.abs() > before.x.abs());
        assert!(after.y.abs() > before.y.abs());
        assert!((-1.0..=1.0).contains(&after.z), "corner clipped: {after:?}");
        assert!((viewer.cameras().orthographic().pose.distance() - distance).abs() < 1e-3);
    }

    #[test]
    fn test_click_without_model_is_ignored() {
        let mut viewer = viewer();
        let mut host = HeadlessHost::new(8, 8);

        let outcome = viewer
            .dispatch(Command::Click { x: 400.0, y: 300.0 }, &mut host)
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Ignored);
    }

    #[test]
    fn test_orbit_moves_camera_over_frames() {
        let mut viewer = viewer();
        let mut host = HeadlessHost::new(8, 8);
        let before = *viewer.cameras().active_pose();

        viewer.dispatch(Command::Orbit { dx: 50.0, dy: 0.0 }, &mut host).unwrap();
        viewer.frame(&mut host);

        let after = *viewer.cameras().active_pose();
        assert_ne!(before.position, after.position);
        assert_eq!(before.target, after.target);
    }

    #[test]
    fn test_command_deserializes_from_js_shape() {
        let command: Command =
            serde_json::from_str(r#"{ "type": "resize", "width": 10, "height": 20 }"#).unwrap();
        assert_eq!(
            command,
            Command::Resize {
                width: 10,
                height: 20,
                pixel_ratio: 1.0
            }
        );

        let command: Command = serde_json::from_str(r#"{ "type": "frontView" }"#).unwrap();
        assert_eq!(command, Command::FrontView);
    }

    #[test]
    fn test_failed_render_does_not_panic() {
        struct FailingHost;
        impl ViewerHost for FailingHost {
            fn render(&mut self, _: &Scene, _: &CameraSnapshot) -> std::result::Result<(), crate::error::HostError> {
                Err(crate::error::HostError::new("context lost"))
            }
            fn read_pixels(&mut self) -> std::result::Result<image::RgbaImage, crate::error::HostError> {
                Err(crate::error::HostError::new("context lost"))
            }
            fn download(&mut self, _: &ExportedImage) -> std::result::Result<(), crate::error::HostError> {
                Ok(())
            }
        }

        let mut viewer = viewer();
        assert!(!viewer.frame(&mut FailingHost));
        assert!(matches!(
            viewer.save_image(&mut FailingHost),
            Err(ViewerError::Host(_))
        ));
    }
}

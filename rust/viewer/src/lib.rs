// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Lite Viewer
//!
//! Interaction layer of the IFC scene viewer: a perspective camera under
//! damped orbit controls, a front orthographic view fitted to the model,
//! click picking with highlight and dimension readout, and screenshot export.
//!
//! Drawing and file delivery are left to a [`ViewerHost`]; IFC parsing is
//! left to a [`ModelLoader`].
//!
//! ```
//! use ifc_lite_viewer::{Command, HeadlessHost, Viewer, ViewerConfig, Viewport};
//!
//! let mut viewer = Viewer::new(ViewerConfig::default(), Viewport::new(640, 480));
//! let mut host = HeadlessHost::new(640, 480);
//!
//! viewer.frame(&mut host);
//! let image = viewer.save_image(&mut host).unwrap();
//! assert_eq!(image.filename, "scene.jpeg");
//! # let _ = Command::PerspectiveView;
//! ```

pub mod bounds;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod export;
pub mod host;
pub mod interaction;
pub mod loader;
pub mod model;
pub mod picking;
pub mod scene;
pub mod viewer;
pub mod viewport;

pub use image::RgbaImage;
pub use nalgebra::{Isometry3, Matrix4, Point2, Point3, Vector3};

pub use bounds::{BoundingExtent, Dimensions};
pub use camera::{ActiveCamera, ActiveCameraMut, CameraManager, CameraPose, CameraSnapshot, FrontViewFit, ViewMode};
pub use config::ViewerConfig;
pub use controls::OrbitControls;
pub use error::{ExportError, HostError, LoadError, Result, ViewerError};
pub use export::{ExportFormat, ExportedImage};
pub use host::{HeadlessHost, ViewerHost};
pub use interaction::{ClickOutcome, InteractionController};
pub use loader::{GeometryJsonLoader, GeometryPayload, LoadOutcome, LoadTicket, MeshData, ModelLoader};
pub use model::{Color, Material, Model, ModelNode, NodeId};
pub use picking::{Intersection, Ray};
pub use scene::{Scene, SceneObject};
pub use viewer::{Command, CommandOutcome, Viewer};
pub use viewport::Viewport;

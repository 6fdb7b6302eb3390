// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for the IFC-Lite viewer

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use ifc_lite_viewer::{
    Command, CommandOutcome, GeometryPayload, HostError, LoadError, LoadOutcome, LoadTicket, Model,
    ViewMode, Viewer, ViewerConfig, ViewerError,
};
use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::dom;
use crate::host::{mode_name, JsHost};
use crate::utils::get_function;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Convert loader output (`{ meshes: [...] }`) into a model
pub(crate) fn geometry_to_model(geometry: JsValue) -> Result<Model, LoadError> {
    let payload: GeometryPayload = serde_wasm_bindgen::from_value(geometry)
        .map_err(|e| LoadError::Rejected(format!("unexpected geometry shape: {e}")))?;
    payload.into_model()
}

const BUSY: &str = "viewer is busy inside a render callback";

/// Viewer plus its browser host, shared by the JS object and DOM listeners.
///
/// The viewer stays mutably borrowed while JS `render` / `readPixels` run.
/// Values those callbacks may read (`mode`, `pixelRatio`, `wasmPath`) are
/// mirrored outside the `RefCell`.
pub(crate) struct ViewerHandle {
    viewer: RefCell<Viewer>,
    host: RefCell<JsHost>,
    on_highlight: Option<Function>,
    pub(crate) load_file: Option<Function>,
    mode: Cell<ViewMode>,
    pixel_ratio: Cell<f32>,
    wasm_path: String,
}

impl ViewerHandle {
    fn new(viewer: Viewer, host: JsHost, callbacks: &JsValue) -> Self {
        let handle = Self {
            wasm_path: viewer.config().loader.wasm_path.clone(),
            mode: Cell::new(viewer.mode()),
            pixel_ratio: Cell::new(1.0),
            viewer: RefCell::new(viewer),
            host: RefCell::new(host),
            on_highlight: get_function(callbacks, "onHighlight"),
            load_file: get_function(callbacks, "loadFile"),
        };
        handle.sync(&handle.viewer.borrow());
        handle
    }

    fn sync(&self, viewer: &Viewer) {
        self.mode.set(viewer.mode());
        self.pixel_ratio
            .set(viewer.viewport().effective_pixel_ratio(viewer.config().max_pixel_ratio));
    }

    /// Shared borrow that fails instead of panicking during a callback
    fn viewer(&self) -> Result<Ref<'_, Viewer>, JsValue> {
        self.viewer.try_borrow().map_err(|_| JsValue::from_str(BUSY))
    }

    pub(crate) fn mode(&self) -> ViewMode {
        self.mode.get()
    }

    pub(crate) fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio.get()
    }

    pub(crate) fn dispatch(&self, command: Command) -> Result<CommandOutcome, ViewerError> {
        let outcome = {
            let (Ok(mut viewer), Ok(mut host)) =
                (self.viewer.try_borrow_mut(), self.host.try_borrow_mut())
            else {
                return Err(HostError::new(BUSY).into());
            };
            let outcome = viewer.dispatch(command, &mut *host);
            self.sync(&viewer);
            outcome?
        };
        if let CommandOutcome::Clicked(click) = &outcome {
            if click.highlighted {
                self.notify_highlight(click.selected);
            }
        }
        Ok(outcome)
    }

    /// Tell the page which element to recolor
    fn notify_highlight(&self, node: Option<ifc_lite_viewer::NodeId>) {
        let Some(callback) = &self.on_highlight else {
            return;
        };
        let (express_id, color) = {
            let viewer = self.viewer.borrow();
            let express_id = node
                .and_then(|id| viewer.model().and_then(|m| m.node(id)))
                .and_then(|n| n.express_id);
            (express_id, viewer.config().highlight_color)
        };
        let Some(express_id) = express_id else {
            return;
        };
        if let Err(e) = callback.call2(
            &JsValue::NULL,
            &JsValue::from(express_id),
            &JsValue::from(color),
        ) {
            tracing::warn!(error = ?e, "onHighlight callback failed");
        }
    }

    /// Render one frame; skipped while a JS callback holds the viewer
    pub(crate) fn frame(&self) -> bool {
        match (self.viewer.try_borrow_mut(), self.host.try_borrow_mut()) {
            (Ok(mut viewer), Ok(mut host)) => viewer.frame(&mut *host),
            _ => {
                tracing::debug!("Viewer busy, skipping frame");
                false
            }
        }
    }

    pub(crate) fn begin_load(&self) -> LoadTicket {
        self.viewer.borrow_mut().begin_load()
    }

    pub(crate) fn finish_load(
        &self,
        ticket: LoadTicket,
        result: Result<Model, LoadError>,
    ) -> Result<LoadOutcome, ViewerError> {
        self.viewer.borrow_mut().finish_load(ticket, result)
    }

    pub(crate) fn wasm_path(&self) -> &str {
        &self.wasm_path
    }
}

/// Browser-facing viewer
///
/// Example:
/// ```javascript
/// const viewer = new IfcViewer({
///   render: (viewProjection, mode) => { /* draw with three.js */ },
///   readPixels: () => ctx.getImageData(0, 0, w, h),
///   loadFile: (file, wasmPath) => loader.parse(file, wasmPath),
///   onHighlight: (expressId, color) => { /* recolor */ },
/// });
/// viewer.attachToDocument();
/// ```
///
/// `render` and `readPixels` may read `mode`, `pixelRatio` and `wasmPath`.
/// Other methods called from inside those callbacks throw instead of
/// re-entering the viewer; load methods must not be called from them.
#[wasm_bindgen]
pub struct IfcViewer {
    handle: Rc<ViewerHandle>,
}

#[wasm_bindgen]
impl IfcViewer {
    /// Create a viewer. `config` may be a partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(callbacks: JsValue, config: JsValue) -> Result<IfcViewer, JsValue> {
        let config: ViewerConfig = if config.is_undefined() || config.is_null() {
            ViewerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let host = JsHost::from_callbacks(&callbacks).map_err(to_js)?;
        let viewer = Viewer::new(config, dom::window_viewport());

        Ok(Self {
            handle: Rc::new(ViewerHandle::new(viewer, host, &callbacks)),
        })
    }

    /// Wire up window, canvas, buttons and file input, and start the
    /// animation loop. Missing elements are skipped.
    #[wasm_bindgen(js_name = attachToDocument)]
    pub fn attach_to_document(&self) -> Result<(), JsValue> {
        dom::attach(self.handle.clone())
    }

    /// Run a command object, e.g. `{ type: "frontView" }`
    #[wasm_bindgen]
    pub fn dispatch(&self, command: JsValue) -> Result<JsValue, JsValue> {
        let command: Command = serde_wasm_bindgen::from_value(command)?;
        let outcome = self.handle.dispatch(command).map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&outcome)?)
    }

    /// Advance controls and render once
    #[wasm_bindgen]
    pub fn frame(&self) -> bool {
        self.handle.frame()
    }

    /// Start a load; pass the returned ticket to `finishLoad` / `failLoad`
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&self) -> f64 {
        self.handle.begin_load().0 as f64
    }

    #[wasm_bindgen(js_name = finishLoad)]
    pub fn finish_load(&self, ticket: f64, geometry: JsValue) -> Result<JsValue, JsValue> {
        let outcome = self
            .handle
            .finish_load(LoadTicket(ticket as u64), geometry_to_model(geometry))
            .map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&outcome)?)
    }

    #[wasm_bindgen(js_name = failLoad)]
    pub fn fail_load(&self, ticket: f64, message: String) -> Result<JsValue, JsValue> {
        let outcome = self
            .handle
            .finish_load(LoadTicket(ticket as u64), Err(LoadError::Rejected(message)))
            .map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&outcome)?)
    }

    /// Active camera: "perspective" or "frontOrthographic"
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        mode_name(self.handle.mode()).to_string()
    }

    /// Column-major view-projection matrix of the active camera
    #[wasm_bindgen(js_name = viewProjection)]
    pub fn view_projection(&self) -> Result<Vec<f32>, JsValue> {
        let viewer = self.handle.viewer()?;
        Ok(viewer.camera().view_projection().as_slice().to_vec())
    }

    /// Lights and helpers the page should add to its scene
    #[wasm_bindgen(js_name = sceneObjects)]
    pub fn scene_objects(&self) -> Result<JsValue, JsValue> {
        let viewer = self.handle.viewer()?;
        let objects: Vec<_> = viewer.scene().objects().iter().collect();
        Ok(serde_wasm_bindgen::to_value(&objects)?)
    }

    /// Location of the IFC decoder's wasm files
    #[wasm_bindgen(getter, js_name = wasmPath)]
    pub fn wasm_path(&self) -> String {
        self.handle.wasm_path().to_string()
    }

    /// Renderer pixel ratio after the configured cap
    #[wasm_bindgen(getter, js_name = pixelRatio)]
    pub fn pixel_ratio(&self) -> f32 {
        self.handle.pixel_ratio()
    }
}

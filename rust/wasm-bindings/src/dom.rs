// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DOM wiring: listeners, file input and the animation-frame loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ifc_lite_viewer::{Command, CommandOutcome, LoadError, ViewerError, Viewport};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Event, EventTarget, File, HtmlCanvasElement, HtmlInputElement, KeyboardEvent,
    MouseEvent, PointerEvent, WheelEvent, Window,
};

use crate::api::{geometry_to_model, ViewerHandle};
use crate::utils::js_error_message;

const CANVAS_ID: &str = "three-canvas";
const FILE_INPUT_ID: &str = "file-input";
const PERSPECTIVE_BUTTON_ID: &str = "perspective-view";
const FRONT_BUTTON_ID: &str = "front-view";

/// Dolly step per wheel notch
const WHEEL_ZOOM_STEP: f32 = 0.95;

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))
}

fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document available"))
}

/// Current window size and device pixel ratio
pub fn window_viewport() -> Viewport {
    let Some(window) = web_sys::window() else {
        return Viewport::default();
    };
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).map(|v| v as u32)
    };
    match (dimension(window.inner_width()), dimension(window.inner_height())) {
        (Some(width), Some(height)) => {
            Viewport::new(width, height).with_pixel_ratio(window.device_pixel_ratio() as f32)
        }
        _ => Viewport::default(),
    }
}

fn listen(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Dispatch from an event handler, where errors can only be logged
fn dispatch_logged(handle: &ViewerHandle, command: Command) -> Option<CommandOutcome> {
    match handle.dispatch(command) {
        Ok(outcome) => Some(outcome),
        Err(ViewerError::NoModelLoaded) => {
            tracing::info!("Load an IFC model first");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Command failed");
            None
        }
    }
}

fn resize(handle: &ViewerHandle, canvas: Option<&HtmlCanvasElement>) {
    let viewport = window_viewport();
    let outcome = dispatch_logged(
        handle,
        Command::Resize {
            width: viewport.width,
            height: viewport.height,
            pixel_ratio: viewport.pixel_ratio,
        },
    );
    if let (
        Some(CommandOutcome::Resized {
            surface_width,
            surface_height,
            ..
        }),
        Some(canvas),
    ) = (outcome, canvas)
    {
        canvas.set_width(surface_width);
        canvas.set_height(surface_height);
    }
}

/// Hook the viewer into the page and start rendering
pub fn attach(handle: Rc<ViewerHandle>) -> Result<(), JsValue> {
    let window = window()?;
    let document = document()?;
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok());

    {
        let handle = handle.clone();
        let canvas = canvas.clone();
        listen(&window, "resize", move |_| resize(&handle, canvas.as_ref()))?;
    }
    resize(&handle, canvas.as_ref());

    {
        let handle = handle.clone();
        listen(&window, "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                dispatch_logged(&handle, Command::KeyDown { key: event.key() });
            }
        })?;
    }

    if let Some(canvas) = &canvas {
        attach_canvas(&handle, &window, canvas)?;
    } else {
        tracing::debug!("No #{CANVAS_ID} element, pointer input disabled");
    }

    for (id, command) in [
        (PERSPECTIVE_BUTTON_ID, Command::PerspectiveView),
        (FRONT_BUTTON_ID, Command::FrontView),
    ] {
        let Some(button) = document.get_element_by_id(id) else {
            tracing::debug!("No #{id} button");
            continue;
        };
        let handle = handle.clone();
        listen(&button, "click", move |_| {
            dispatch_logged(&handle, command.clone());
        })?;
    }

    if let Some(input) = document.get_element_by_id(FILE_INPUT_ID) {
        let handle = handle.clone();
        listen(&input, "change", move |event| {
            let file = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            if let Some(file) = file {
                load_file(handle.clone(), file);
            }
        })?;
    }

    start_render_loop(handle)
}

fn attach_canvas(
    handle: &Rc<ViewerHandle>,
    window: &Window,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    {
        let handle = handle.clone();
        listen(canvas, "click", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                dispatch_logged(
                    &handle,
                    Command::Click {
                        x: event.client_x() as f32,
                        y: event.client_y() as f32,
                    },
                );
            }
        })?;
    }

    // Last pointer position while a drag is in progress
    let drag: Rc<Cell<Option<(i32, i32)>>> = Rc::new(Cell::new(None));
    {
        let drag = drag.clone();
        listen(canvas, "pointerdown", move |event| {
            if let Some(event) = event.dyn_ref::<PointerEvent>() {
                drag.set(Some((event.client_x(), event.client_y())));
            }
        })?;
    }
    {
        let drag = drag.clone();
        let handle = handle.clone();
        listen(canvas, "pointermove", move |event| {
            let (Some((last_x, last_y)), Some(event)) = (drag.get(), event.dyn_ref::<PointerEvent>())
            else {
                return;
            };
            let (x, y) = (event.client_x(), event.client_y());
            drag.set(Some((x, y)));
            dispatch_logged(
                &handle,
                Command::Orbit {
                    dx: (x - last_x) as f32,
                    dy: (y - last_y) as f32,
                },
            );
        })?;
    }
    listen(window, "pointerup", move |_| drag.set(None))?;

    let handle = handle.clone();
    listen(canvas, "wheel", move |event| {
        if let Some(event) = event.dyn_ref::<WheelEvent>() {
            event.prevent_default();
            let notch = (event.delta_y() as f32).signum();
            dispatch_logged(
                &handle,
                Command::Zoom {
                    scale: WHEEL_ZOOM_STEP.powf(-notch),
                },
            );
        }
    })
}

/// Hand the file to the page's IFC loader and apply the result if no newer
/// selection came in meanwhile
fn load_file(handle: Rc<ViewerHandle>, file: File) {
    let Some(loader) = handle.load_file.clone() else {
        tracing::warn!("No loadFile callback configured, ignoring file selection");
        return;
    };

    let ticket = handle.begin_load();
    tracing::info!(file = %file.name(), ticket = ticket.0, "Loading IFC file");
    let call = loader.call2(&JsValue::NULL, &file, &JsValue::from_str(handle.wasm_path()));

    spawn_local(async move {
        let geometry = match call {
            Ok(value) => match value.dyn_into::<Promise>() {
                Ok(promise) => JsFuture::from(promise).await,
                Err(value) => Ok(value),
            },
            Err(e) => Err(e),
        };
        let result = geometry
            .map_err(|e| LoadError::Rejected(js_error_message(&e)))
            .and_then(geometry_to_model);

        if let Err(e) = handle.finish_load(ticket, result) {
            tracing::error!(error = %e, "Failed to load IFC model");
        }
    });
}

fn start_render_loop(handle: Rc<ViewerHandle>) -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();

    *callback.borrow_mut() = Some(Closure::new(move || {
        handle.frame();
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(closure) = next.borrow().as_ref() {
            if let Err(e) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                tracing::error!(error = %js_error_message(&e), "Render loop stopped");
            }
        }
    }));

    if let Some(closure) = callback.borrow().as_ref() {
        window()?.request_animation_frame(closure.as_ref().unchecked_ref())?;
    }
    Ok(())
}

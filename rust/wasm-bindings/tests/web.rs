// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![cfg(target_arch = "wasm32")]

use ifc_lite_viewer_wasm::{version, IfcViewer};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn callbacks() -> JsValue {
    let callbacks = Object::new();
    Reflect::set(&callbacks, &"render".into(), &Function::new_no_args("")).unwrap();
    Reflect::set(
        &callbacks,
        &"readPixels".into(),
        &Function::new_no_args("return new ImageData(4, 4);"),
    )
    .unwrap();
    callbacks.into()
}

#[wasm_bindgen_test]
fn test_version() {
    assert!(!version().is_empty());
}

#[wasm_bindgen_test]
fn test_missing_callbacks_are_rejected() {
    assert!(IfcViewer::new(Object::new().into(), JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn test_load_ticket_flow() {
    let viewer = IfcViewer::new(callbacks(), JsValue::UNDEFINED).unwrap();

    let stale = viewer.begin_load();
    let current = viewer.begin_load();
    let geometry = js_sys::JSON::parse(
        r#"{ "meshes": [{ "expressId": 5, "positions": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,2], "color": [1,1,1,1] }] }"#,
    )
    .unwrap();

    let outcome = viewer.finish_load(stale, geometry.clone()).unwrap();
    assert_eq!(
        Reflect::get(&outcome, &"status".into()).unwrap().as_string().as_deref(),
        Some("superseded")
    );

    let outcome = viewer.finish_load(current, geometry).unwrap();
    assert_eq!(
        Reflect::get(&outcome, &"status".into()).unwrap().as_string().as_deref(),
        Some("loaded")
    );
    assert_eq!(viewer.view_projection().unwrap().len(), 16);
}

#[wasm_bindgen_test]
fn test_front_view_command() {
    let viewer = IfcViewer::new(callbacks(), JsValue::UNDEFINED).unwrap();
    let command = js_sys::JSON::parse(r#"{ "type": "frontView" }"#).unwrap();

    // No model yet
    assert!(viewer.dispatch(command).is_err());
    assert!(viewer.frame());
}

#[wasm_bindgen_test]
fn test_render_callback_can_read_viewer() {
    let callbacks = Object::new();
    let render = Function::new_with_args(
        "viewProjection, mode",
        "const viewer = globalThis.viewerUnderTest;
         const seen = { mode: viewer.mode, ratio: viewer.pixelRatio, argument: mode };
         try { viewer.viewProjection(); seen.matrix = 'read'; } catch (e) { seen.matrix = 'busy'; }
         globalThis.renderSaw = seen;",
    );
    Reflect::set(&callbacks, &"render".into(), &render).unwrap();
    Reflect::set(
        &callbacks,
        &"readPixels".into(),
        &Function::new_no_args("return new ImageData(4, 4);"),
    )
    .unwrap();

    let viewer = IfcViewer::new(callbacks.into(), JsValue::UNDEFINED).unwrap();
    let global = js_sys::global();
    Reflect::set(&global, &"viewerUnderTest".into(), &JsValue::from(viewer)).unwrap();

    let frame = Function::new_no_args("return globalThis.viewerUnderTest.frame();");
    assert_eq!(frame.call0(&JsValue::NULL).unwrap().as_bool(), Some(true));

    let seen = Reflect::get(&global, &"renderSaw".into()).unwrap();
    let field = |name: &str| Reflect::get(&seen, &name.into()).unwrap();
    assert_eq!(field("mode").as_string().as_deref(), Some("perspective"));
    assert_eq!(field("argument").as_string().as_deref(), Some("perspective"));
    assert!(field("ratio").as_f64().is_some());
    assert_eq!(field("matrix").as_string().as_deref(), Some("busy"));
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser host: rendering and readback through JS callbacks, downloads
//! through an object URL on a temporary anchor.

use ifc_lite_viewer::export::pixels_from_rgba;
use ifc_lite_viewer::{
    CameraSnapshot, ExportedImage, HostError, RgbaImage, Scene, ViewMode, ViewerHost,
};
use js_sys::{Array, Float32Array, Function, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, ImageData, Url};

use crate::utils::{get_function, js_error_message};

/// Delay before a download's object URL is released
pub(crate) const REVOKE_DELAY_MS: i32 = 1_000;

/// Callbacks supplied by the page's renderer
pub struct JsHost {
    render: Function,
    read_pixels: Function,
}

impl JsHost {
    /// Pull `render` and `readPixels` off a JS callbacks object
    pub fn from_callbacks(callbacks: &JsValue) -> Result<Self, HostError> {
        let render = get_function(callbacks, "render")
            .ok_or_else(|| HostError::new("callbacks.render must be a function"))?;
        let read_pixels = get_function(callbacks, "readPixels")
            .ok_or_else(|| HostError::new("callbacks.readPixels must be a function"))?;
        Ok(Self { render, read_pixels })
    }
}

pub(crate) fn mode_name(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Perspective => "perspective",
        ViewMode::FrontOrthographic => "frontOrthographic",
    }
}

fn call_failed(what: &str, err: JsValue) -> HostError {
    HostError::new(format!("{what} failed: {}", js_error_message(&err)))
}

impl ViewerHost for JsHost {
    fn render(&mut self, _scene: &Scene, camera: &CameraSnapshot) -> Result<(), HostError> {
        let view_projection = Float32Array::from(camera.view_projection().as_slice());
        self.render
            .call2(
                &JsValue::NULL,
                &view_projection,
                &JsValue::from_str(mode_name(camera.mode)),
            )
            .map(|_| ())
            .map_err(|e| call_failed("render", e))
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, HostError> {
        let value = self
            .read_pixels
            .call0(&JsValue::NULL)
            .map_err(|e| call_failed("readPixels", e))?;
        let image_data = value
            .dyn_into::<ImageData>()
            .map_err(|_| HostError::new("readPixels must return ImageData"))?;

        pixels_from_rgba(image_data.width(), image_data.height(), image_data.data().0)
            .map_err(|e| HostError::new(e.to_string()))
    }

    fn download(&mut self, image: &ExportedImage) -> Result<(), HostError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| HostError::new("no document available"))?;

        let parts = Array::of1(&Uint8Array::from(image.bytes.as_slice()));
        let options = BlobPropertyBag::new();
        options.set_type(image.mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| call_failed("Blob", e))?;
        let url = Url::create_object_url_with_blob(&blob).map_err(|e| call_failed("createObjectURL", e))?;

        let link = document
            .create_element("a")
            .map_err(|e| call_failed("createElement", e))?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| HostError::new("anchor element has unexpected type"))?;
        link.set_href(&url);
        link.set_download(&image.filename);
        link.click();

        revoke_later(url)
    }
}

/// Release `url` once the download has had time to start. Revoking in the
/// same tick as the click can cancel it.
pub(crate) fn revoke_later(url: String) -> Result<(), HostError> {
    let window = web_sys::window().ok_or_else(|| HostError::new("no window available"))?;
    let revoke = Closure::once_into_js(move || {
        if let Err(e) = Url::revoke_object_url(&url) {
            tracing::warn!(error = %js_error_message(&e), "revokeObjectURL failed");
        }
    });
    window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            revoke.unchecked_ref(),
            REVOKE_DELAY_MS,
        )
        .map(|_| ())
        .map_err(|e| call_failed("setTimeout", e))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use js_sys::Promise;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn fetch_ok(url: &str) -> bool {
        let fetch = Function::new_with_args(
            "url",
            "return fetch(url).then(() => true, () => false);",
        );
        let promise: Promise = fetch
            .call1(&JsValue::NULL, &JsValue::from_str(url))
            .unwrap()
            .unchecked_into();
        JsFuture::from(promise).await.unwrap().as_bool().unwrap()
    }

    async fn sleep(ms: i32) {
        let promise = Promise::new(&mut |resolve: Function, _: Function| {
            web_sys::window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .unwrap();
        });
        JsFuture::from(promise).await.unwrap();
    }

    #[wasm_bindgen_test]
    async fn test_object_url_outlives_the_click() {
        let parts = Array::of1(&Uint8Array::from(&[1u8, 2, 3][..]));
        let blob = Blob::new_with_u8_array_sequence(&parts).unwrap();
        let url = Url::create_object_url_with_blob(&blob).unwrap();

        revoke_later(url.clone()).unwrap();
        assert!(fetch_ok(&url).await);

        sleep(REVOKE_DELAY_MS + 500).await;
        assert!(!fetch_ok(&url).await);
    }
}

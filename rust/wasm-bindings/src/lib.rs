// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Lite Viewer WebAssembly Bindings
//!
//! Browser host for the IFC-Lite viewer built with wasm-bindgen.

use wasm_bindgen::prelude::*;

mod api;
mod dom;
mod host;
mod logging;
mod utils;

pub use api::IfcViewer;
pub use utils::set_panic_hook as init_panic_hook;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
    logging::init(cfg!(debug_assertions));
}

/// Switch console logging to debug level
#[wasm_bindgen(js_name = enableDebugLogging)]
pub fn enable_debug_logging() {
    logging::set_verbose(true);
}

/// Get the version of the IFC-Lite viewer
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

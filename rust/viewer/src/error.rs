// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for viewer operations.

use thiserror::Error;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Errors surfaced by viewer commands.
///
/// None of these stop the render loop; each one ends only the action that
/// produced it.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// The operation needs a loaded model and none is present.
    #[error("No model loaded")]
    NoModelLoaded,

    /// A model is loaded but contains no geometry to measure or frame.
    #[error("Model has no geometry")]
    EmptyModel,

    #[error("Model load failed: {0}")]
    LoadFailed(#[from] LoadError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Errors produced while turning loader output into a model.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid geometry payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid mesh {express_id}: {reason}")]
    InvalidGeometry { express_id: u32, reason: String },

    /// The external parser reported a failure.
    #[error("Loader rejected file: {0}")]
    Rejected(String),
}

/// Errors produced while encoding an exported frame.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    PixelBuffer { width: u32, height: u32, len: usize },
}

/// Failure reported by the host environment (renderer, readback, download).
#[derive(Error, Debug)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

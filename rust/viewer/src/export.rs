// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Screenshot export
//!
//! Forces one render through the active camera, reads the frame back,
//! encodes it and hands it to the host for download.

use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::camera::CameraSnapshot;
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::host::ViewerHost;
use crate::scene::Scene;

/// Encoding used for exported frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            ExportFormat::Png => &["png"],
            ExportFormat::Jpeg => &["jpg", "jpeg"],
        }
    }

    /// Whether `filename` carries an extension for this format
    pub fn matches_filename(self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// An encoded frame ready for download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub filename: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Wrap a raw RGBA readback, checking its length
pub fn pixels_from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> std::result::Result<RgbaImage, ExportError> {
    let len = rgba.len();
    RgbaImage::from_raw(width, height, rgba).ok_or(ExportError::PixelBuffer { width, height, len })
}

/// Encode pixels in the given format
pub fn encode(pixels: &RgbaImage, format: ExportFormat) -> std::result::Result<Vec<u8>, ExportError> {
    let mut cursor = Cursor::new(Vec::new());
    match format {
        ExportFormat::Png => pixels.write_to(&mut cursor, ImageFormat::Png)?,
        // JPEG has no alpha channel
        ExportFormat::Jpeg => DynamicImage::ImageRgba8(pixels.clone())
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg)?,
    }
    Ok(cursor.into_inner())
}

/// Render, read back, encode and offer the current frame.
pub fn save_image(
    scene: &Scene,
    camera: &CameraSnapshot,
    host: &mut dyn ViewerHost,
    config: &ExportConfig,
) -> Result<ExportedImage> {
    host.render(scene, camera)?;
    let pixels = host.read_pixels()?;
    let bytes = encode(&pixels, config.format)?;

    if !config.format.matches_filename(&config.filename) {
        tracing::warn!(
            filename = %config.filename,
            mime_type = config.format.mime_type(),
            "Export filename extension does not match the encoded format"
        );
    }

    let image = ExportedImage {
        filename: config.filename.clone(),
        mime_type: config.format.mime_type(),
        width: pixels.width(),
        height: pixels.height(),
        bytes,
    };
    host.download(&image)?;

    tracing::info!(
        filename = %image.filename,
        size = image.bytes.len(),
        "Exported scene image"
    );
    Ok(image)
}

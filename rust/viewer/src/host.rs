// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host environment seam
//!
//! Drawing, pixel readback and file delivery belong to the environment the
//! viewer runs in (a WebGL canvas in the browser). The viewer reaches them
//! only through [`ViewerHost`].

use image::{Rgba, RgbaImage};

use crate::camera::{CameraSnapshot, ViewMode};
use crate::error::HostError;
use crate::export::ExportedImage;
use crate::scene::Scene;

pub trait ViewerHost {
    /// Draw `scene` through `camera`
    fn render(&mut self, scene: &Scene, camera: &CameraSnapshot) -> Result<(), HostError>;

    /// Read back the most recently rendered frame
    fn read_pixels(&mut self) -> Result<RgbaImage, HostError>;

    /// Offer an exported image to the user
    fn download(&mut self, image: &ExportedImage) -> Result<(), HostError>;
}

/// Host without a GPU: every frame is the clear color.
///
/// Useful for native embedding and for exercising the viewer in tests.
#[derive(Debug)]
pub struct HeadlessHost {
    width: u32,
    height: u32,
    clear: Rgba<u8>,
    frames: usize,
    last_mode: Option<ViewMode>,
    downloads: Vec<ExportedImage>,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            clear: Rgba([0, 0, 0, 0]),
            frames: 0,
            last_mode: None,
            downloads: Vec::new(),
        }
    }

    pub fn with_clear_color(mut self, clear: [u8; 4]) -> Self {
        self.clear = Rgba(clear);
        self
    }

    /// Number of frames rendered so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Camera mode of the last rendered frame
    pub fn last_mode(&self) -> Option<ViewMode> {
        self.last_mode
    }

    pub fn downloads(&self) -> &[ExportedImage] {
        &self.downloads
    }
}

impl ViewerHost for HeadlessHost {
    fn render(&mut self, _scene: &Scene, camera: &CameraSnapshot) -> Result<(), HostError> {
        self.frames += 1;
        self.last_mode = Some(camera.mode);
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, HostError> {
        if self.frames == 0 {
            return Err(HostError::new("no frame has been rendered"));
        }
        Ok(RgbaImage::from_pixel(self.width, self.height, self.clear))
    }

    fn download(&mut self, image: &ExportedImage) -> Result<(), HostError> {
        self.downloads.push(image.clone());
        Ok(())
    }
}

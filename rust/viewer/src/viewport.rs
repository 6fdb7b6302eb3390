// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewport size and screen-to-NDC conversion.

use nalgebra::Point2;

/// Size of the render surface in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio reported by the host
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Width and height are clamped to at least one pixel
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        self
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Pixel ratio the renderer should use, capped at `max_ratio`
    pub fn effective_pixel_ratio(&self, max_ratio: f32) -> f32 {
        self.pixel_ratio.min(max_ratio)
    }

    /// Backing-store size in device pixels
    pub fn surface_size(&self, max_ratio: f32) -> (u32, u32) {
        let ratio = self.effective_pixel_ratio(max_ratio);
        (
            (self.width as f32 * ratio).round() as u32,
            (self.height as f32 * ratio).round() as u32,
        )
    }

    /// Convert a screen position to normalized device coordinates.
    ///
    /// Screen y grows downwards, NDC y grows upwards.
    #[inline]
    pub fn to_ndc(&self, screen_x: f32, screen_y: f32) -> Point2<f32> {
        Point2::new(
            (screen_x / self.width as f32) * 2.0 - 1.0,
            -(screen_y / self.height as f32) * 2.0 + 1.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_origin() {
        let viewport = Viewport::new(1920, 1080);
        let ndc = viewport.to_ndc(960.0, 540.0);
        assert_eq!(ndc, Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_corners_map_to_unit_square() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(viewport.to_ndc(0.0, 0.0), Point2::new(-1.0, 1.0));
        assert_eq!(viewport.to_ndc(800.0, 600.0), Point2::new(1.0, -1.0));
    }

    #[test]
    fn test_ndc_stays_in_range_inside_viewport() {
        for &(w, h) in &[(1u32, 1u32), (640, 480), (1920, 1080), (333, 1234)] {
            let viewport = Viewport::new(w, h);
            for step in 0..=10 {
                let x = w as f32 * step as f32 / 10.0;
                let y = h as f32 * (10 - step) as f32 / 10.0;
                let ndc = viewport.to_ndc(x, y);
                assert!((-1.0..=1.0).contains(&ndc.x), "x {} out of range", ndc.x);
                assert!((-1.0..=1.0).contains(&ndc.y), "y {} out of range", ndc.y);
            }
        }
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let viewport = Viewport::new(0, 0);
        assert_eq!((viewport.width, viewport.height), (1, 1));
        assert_eq!(viewport.aspect(), 1.0);
    }

    #[test]
    fn test_pixel_ratio_is_capped() {
        let viewport = Viewport::new(100, 50).with_pixel_ratio(3.0);
        assert_eq!(viewport.effective_pixel_ratio(2.0), 2.0);
        assert_eq!(viewport.surface_size(2.0), (200, 100));
    }
}

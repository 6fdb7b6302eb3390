// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration.
//!
//! Every field has a default, so hosts may pass a partial object (the wasm
//! bindings deserialize one straight from JavaScript). Native hosts can use
//! [`ViewerConfig::from_env`].

use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub scene: SceneConfig,
    pub export: ExportConfig,
    pub loader: LoaderConfig,
    /// Color written into a clicked object's material (0xRRGGBB).
    pub highlight_color: u32,
    /// Front view camera distance as a multiple of the largest model dimension.
    pub fit_factor: f32,
    /// Upper bound for the renderer's device pixel ratio.
    pub max_pixel_ratio: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            scene: SceneConfig::default(),
            export: ExportConfig::default(),
            loader: LoaderConfig::default(),
            highlight_color: 0xffcc00,
            fit_factor: 1.5,
            max_pixel_ratio: 2.0,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            highlight_color: std::env::var("IFC_VIEWER_HIGHLIGHT_COLOR")
                .ok()
                .and_then(|v| u32::from_str_radix(v.trim_start_matches("0x"), 16).ok())
                .unwrap_or(defaults.highlight_color),
            fit_factor: std::env::var("IFC_VIEWER_FIT_FACTOR")
                .unwrap_or_else(|_| defaults.fit_factor.to_string())
                .parse()
                .unwrap_or(defaults.fit_factor),
            max_pixel_ratio: std::env::var("IFC_VIEWER_MAX_PIXEL_RATIO")
                .unwrap_or_else(|_| defaults.max_pixel_ratio.to_string())
                .parse()
                .unwrap_or(defaults.max_pixel_ratio),
            export: ExportConfig {
                filename: std::env::var("IFC_VIEWER_EXPORT_FILENAME")
                    .unwrap_or(defaults.export.filename),
                format: std::env::var("IFC_VIEWER_EXPORT_FORMAT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.export.format),
                key: std::env::var("IFC_VIEWER_EXPORT_KEY").unwrap_or(defaults.export.key),
            },
            loader: LoaderConfig {
                wasm_path: std::env::var("IFC_VIEWER_WASM_PATH")
                    .unwrap_or(defaults.loader.wasm_path),
            },
            ..defaults
        }
    }
}

/// Initial camera setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    /// Vertical field of view of the perspective camera, in degrees.
    pub fov_degrees: f32,
    pub perspective_near: f32,
    pub perspective_far: f32,
    pub perspective_position: [f32; 3],
    /// Point the orbit controls revolve around in perspective mode.
    pub orbit_target: [f32; 3],
    /// Full height of the orthographic frustum before any model is framed.
    pub frustum_size: f32,
    pub ortho_near: f32,
    pub ortho_far: f32,
    pub ortho_position: [f32; 3],
    pub ortho_target: [f32; 3],
    /// Extent used when framing a model whose bounding box has zero size.
    pub min_fit_extent: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            perspective_near: 0.1,
            perspective_far: 2000.0,
            perspective_position: [8.0, 13.0, 15.0],
            orbit_target: [-2.0, 0.0, 0.0],
            frustum_size: 10.0,
            ortho_near: 0.1,
            ortho_far: 1000.0,
            ortho_position: [0.0, 1.6, 5.0],
            ortho_target: [0.0, 1.6, 0.0],
            min_fit_extent: 1.0,
        }
    }
}

/// Orbit navigation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlsConfig {
    pub enable_damping: bool,
    /// Fraction of pending motion applied per frame when damping is on.
    pub damping_factor: f32,
    /// Multiplier on drag rotation; 1.0 turns a full circle per viewport height.
    pub rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            min_distance: 0.01,
            max_distance: 5000.0,
        }
    }
}

/// Lights and helpers added to every scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub light_color: u32,
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub directional_target: [f32; 3],
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub axes_size: f32,
    /// Axes draw after the model and ignore depth so they stay visible.
    pub axes_render_order: i32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            light_color: 0xffffff,
            ambient_intensity: 0.5,
            directional_intensity: 1.0,
            directional_position: [0.0, 10.0, 0.0],
            directional_target: [-5.0, 0.0, 0.0],
            grid_size: 50.0,
            grid_divisions: 20,
            axes_size: 1.0,
            axes_render_order: 15,
        }
    }
}

/// Screenshot export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    pub filename: String,
    pub format: ExportFormat,
    /// Key that triggers an export when pressed.
    pub key: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: "scene.jpeg".into(),
            format: ExportFormat::Png,
            key: "s".into(),
        }
    }
}

/// Settings handed to the external IFC parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Location of the parser's WASM decoding runtime.
    pub wasm_path: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            wasm_path: "../wasm/".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "fitFactor": 2.0, "export": { "key": "p" } }"#).unwrap();

        assert_eq!(config.fit_factor, 2.0);
        assert_eq!(config.export.key, "p");
        assert_eq!(config.export.filename, "scene.jpeg");
        assert_eq!(config.highlight_color, 0xffcc00);
        assert_eq!(config.camera.orbit_target, [-2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_export_format_parses_lowercase() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "export": { "format": "jpeg" } }"#).unwrap();
        assert_eq!(config.export.format, ExportFormat::Jpeg);
    }
}

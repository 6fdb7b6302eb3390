// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene graph host
//!
//! Lights and helpers are only ever added; the model occupies a single slot
//! that a completed load fills or replaces.

use serde::Serialize;

use crate::config::SceneConfig;
use crate::model::{Color, Model};

/// Non-model renderables described to the host renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SceneObject {
    AmbientLight {
        color: Color,
        intensity: f32,
    },
    DirectionalLight {
        color: Color,
        intensity: f32,
        position: [f32; 3],
        target: [f32; 3],
    },
    #[serde(rename_all = "camelCase")]
    Grid {
        size: f32,
        divisions: u32,
    },
    #[serde(rename_all = "camelCase")]
    Axes {
        size: f32,
        depth_test: bool,
        render_order: i32,
    },
}

/// Renderable collection: lights, helpers and at most one model
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    model: Option<Model>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene with the standard lights, grid and axes
    pub fn with_defaults(config: &SceneConfig) -> Self {
        let light_color = Color::from_hex(config.light_color);
        let mut scene = Self::new();
        scene.add(SceneObject::AmbientLight {
            color: light_color,
            intensity: config.ambient_intensity,
        });
        scene.add(SceneObject::DirectionalLight {
            color: light_color,
            intensity: config.directional_intensity,
            position: config.directional_position,
            target: config.directional_target,
        });
        scene.add(SceneObject::Grid {
            size: config.grid_size,
            divisions: config.grid_divisions,
        });
        scene.add(SceneObject::Axes {
            size: config.axes_size,
            depth_test: false,
            render_order: config.axes_render_order,
        });
        scene
    }

    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Put a model into the scene, returning the one it replaces
    pub fn set_model(&mut self, model: Model) -> Option<Model> {
        self.model.replace(model)
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.model.as_mut()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelNode;

    #[test]
    fn test_default_scene_contents() {
        let scene = Scene::with_defaults(&SceneConfig::default());

        assert_eq!(scene.objects().len(), 4);
        assert!(!scene.has_model());
        match &scene.objects()[1] {
            SceneObject::DirectionalLight {
                position, target, ..
            } => {
                assert_eq!(*position, [0.0, 10.0, 0.0]);
                assert_eq!(*target, [-5.0, 0.0, 0.0]);
            }
            other => panic!("expected directional light, got {:?}", other),
        }
        assert!(matches!(
            scene.objects()[3],
            SceneObject::Axes { depth_test: false, render_order: 15, .. }
        ));
    }

    #[test]
    fn test_set_model_replaces_previous() {
        let mut scene = Scene::new();
        assert!(scene.set_model(Model::new(ModelNode::group("first"))).is_none());

        let previous = scene.set_model(Model::new(ModelNode::group("second")));
        assert_eq!(previous.unwrap().root().name.as_deref(), Some("first"));
        assert_eq!(scene.model().unwrap().root().name.as_deref(), Some("second"));
    }

    #[test]
    fn test_objects_serialize_with_kind_tag() {
        let json = serde_json::to_value(SceneObject::Grid {
            size: 50.0,
            divisions: 20,
        })
        .unwrap();
        assert_eq!(json["kind"], "grid");
        assert_eq!(json["divisions"], 20);
    }
}

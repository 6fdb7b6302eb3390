// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Click handling: pick, highlight, measure.

use serde::Serialize;

use crate::bounds::Dimensions;
use crate::camera::CameraSnapshot;
use crate::model::{Color, Model, NodeId};
use crate::picking::{intersect_model, Intersection};
use crate::viewport::Viewport;

/// What a click on the render surface did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickOutcome {
    /// Nearest node under the cursor, if any
    pub selected: Option<NodeId>,
    /// Whether the selected node's color was overwritten
    pub highlighted: bool,
    /// Model dimensions, `None` for a model without geometry
    pub dimensions: Option<Dimensions>,
}

/// Turns clicks into a ray cast against the model.
///
/// The highlight is written straight into the hit node's material. A later
/// click elsewhere does not restore the earlier node's color.
#[derive(Debug, Clone)]
pub struct InteractionController {
    highlight: Color,
}

impl InteractionController {
    pub fn new(highlight_color: u32) -> Self {
        Self {
            highlight: Color::from_hex(highlight_color),
        }
    }

    pub fn highlight_color(&self) -> Color {
        self.highlight
    }

    /// Handle a click at screen position `(x, y)`.
    ///
    /// Returns `None` without touching anything when no model is loaded.
    pub fn handle_click(
        &self,
        model: Option<&mut Model>,
        camera: &CameraSnapshot,
        viewport: &Viewport,
        screen_x: f32,
        screen_y: f32,
    ) -> Option<ClickOutcome> {
        let model = model?;

        let ndc = viewport.to_ndc(screen_x, screen_y);
        let ray = camera.ray_through(ndc);
        let hits = intersect_model(model, &ray);

        let mut outcome = ClickOutcome {
            selected: None,
            highlighted: false,
            dimensions: None,
        };

        if let Some(Intersection { node, distance, .. }) = hits.first().copied() {
            tracing::info!(node = node.0, distance, "Selected object");
            outcome.selected = Some(node);
            outcome.highlighted = self.apply_highlight(model, node);
        }

        let extent = model.bounding_extent();
        if extent.is_valid() {
            let dimensions = extent.dimensions();
            tracing::info!(
                width = dimensions.width,
                height = dimensions.height,
                depth = dimensions.depth,
                "Model dimensions"
            );
            outcome.dimensions = Some(dimensions);
        }

        Some(outcome)
    }

    /// Overwrite the node's material color. Nodes without a colorable
    /// material are left alone.
    fn apply_highlight(&self, model: &mut Model, node: NodeId) -> bool {
        let Some(color) = model
            .node_mut(node)
            .and_then(|n| n.material.as_mut())
            .and_then(|m| m.color.as_mut())
        else {
            return false;
        };
        *color = self.highlight;
        true
    }
}

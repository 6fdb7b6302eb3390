// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loading
//!
//! Parsing IFC is the job of an external loader. This module sequences loads
//! with tickets so only the most recent file selection can reach the scene,
//! and builds models from the mesh buffers loaders hand back.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::model::{Geometry, Material, Model, ModelNode};

/// Identifies one file selection's load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoadTicket(pub u64);

/// How a finished load was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoadOutcome {
    /// The model is now in the scene
    Loaded { meshes: usize },
    /// A newer selection superseded this load; its result was dropped
    Superseded,
}

/// Issues tickets and remembers which one may still deliver
#[derive(Debug, Default)]
pub struct LoadTracker {
    issued: u64,
    pending: Option<LoadTicket>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load, superseding any one still in flight
    pub fn begin(&mut self) -> LoadTicket {
        self.issued += 1;
        let ticket = LoadTicket(self.issued);
        if let Some(previous) = self.pending.replace(ticket) {
            tracing::debug!(previous = previous.0, current = ticket.0, "Superseding pending load");
        }
        ticket
    }

    pub fn pending(&self) -> Option<LoadTicket> {
        self.pending
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.pending == Some(ticket)
    }

    /// Close `ticket`. Returns false when it is no longer the current load.
    pub fn complete(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.pending = None;
        true
    }
}

/// External parser turning file bytes into a model
pub trait ModelLoader {
    fn load(&self, bytes: &[u8]) -> Result<Model, LoadError>;
}

/// Mesh of a single IFC element, in the shape ifc-lite geometry results use
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshData {
    pub express_id: u32,
    #[serde(default)]
    pub ifc_type: Option<String>,
    /// Vertex positions (x, y, z triplets)
    pub positions: Vec<f32>,
    /// Triangle indices
    pub indices: Vec<u32>,
    /// RGBA color
    pub color: [f32; 4],
}

impl MeshData {
    /// Validate buffers and convert to a mesh node. Empty meshes yield `None`.
    fn into_node(self) -> Result<Option<ModelNode>, LoadError> {
        let invalid = |reason: String| LoadError::InvalidGeometry {
            express_id: self.express_id,
            reason,
        };

        if self.positions.is_empty() || self.indices.is_empty() {
            return Ok(None);
        }
        if self.positions.len() % 3 != 0 {
            return Err(invalid(format!(
                "{} position values is not a multiple of 3",
                self.positions.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "{} indices is not a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = self.positions.len() / 3;
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(invalid(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }

        let positions = self
            .positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let triangles = self
            .indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let mut node = ModelNode::mesh(
            Geometry::new(positions, triangles),
            Some(Material::from_rgba(self.color)),
        )
        .with_express_id(self.express_id);
        if let Some(ifc_type) = self.ifc_type {
            node = node.with_ifc_type(ifc_type);
        }
        Ok(Some(node))
    }
}

/// Geometry result as produced by ifc-lite (`{ "meshes": [...] }`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryPayload {
    pub meshes: Vec<MeshData>,
}

impl GeometryPayload {
    /// Build a model with one mesh node per element under a single root
    pub fn into_model(self) -> Result<Model, LoadError> {
        let mut root = ModelNode::group("IfcModel");
        for mesh in self.meshes {
            if let Some(node) = mesh.into_node()? {
                root.children.push(node);
            }
        }
        Ok(Model::new(root))
    }
}

/// Loader for geometry already decoded to ifc-lite JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryJsonLoader;

impl ModelLoader for GeometryJsonLoader {
    fn load(&self, bytes: &[u8]) -> Result<Model, LoadError> {
        let payload: GeometryPayload = serde_json::from_slice(bytes)?;
        payload.into_model()
    }
}

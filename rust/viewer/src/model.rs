// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loaded model tree
//!
//! A model is an opaque renderable subtree: groups and meshes, each with a
//! local rigid transform. Node ids are assigned when the tree is wrapped in a
//! [`Model`] and are unique within it.

use nalgebra::{Isometry3, Point3};
use serde::Serialize;

use crate::bounds::BoundingExtent;

/// Stable id of a node inside one [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// Linear RGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decode a `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Encode as `0xRRGGBB`
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

/// Surface appearance of a mesh node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    /// `None` for materials that cannot be recolored
    pub color: Option<Color>,
    pub opacity: f32,
}

impl Material {
    pub fn colored(color: Color, opacity: f32) -> Self {
        Self {
            color: Some(color),
            opacity,
        }
    }

    pub fn uncolored() -> Self {
        Self {
            color: None,
            opacity: 1.0,
        }
    }

    /// Build from an RGBA quadruple as produced by geometry loaders
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        Self::colored(Color::new(rgba[0], rgba[1], rgba[2]), rgba[3])
    }
}

/// Indexed triangle geometry in node-local coordinates
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<Point3<f32>>,
    pub triangles: Vec<[u32; 3]>,
}

impl Geometry {
    pub fn new(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.triangles.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// A group or mesh inside the model tree
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub id: NodeId,
    /// IFC express id of the element this node was built from, if any
    pub express_id: Option<u32>,
    pub name: Option<String>,
    pub ifc_type: Option<String>,
    /// Transform relative to the parent node
    pub transform: Isometry3<f32>,
    pub geometry: Option<Geometry>,
    pub material: Option<Material>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Create an empty group node
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            id: NodeId(0),
            express_id: None,
            name: Some(name.into()),
            ifc_type: None,
            transform: Isometry3::identity(),
            geometry: None,
            material: None,
            children: Vec::new(),
        }
    }

    /// Create a mesh node
    pub fn mesh(geometry: Geometry, material: Option<Material>) -> Self {
        Self {
            geometry: Some(geometry),
            material,
            name: None,
            ..Self::group("")
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_express_id(mut self, express_id: u32) -> Self {
        self.express_id = Some(express_id);
        self
    }

    pub fn with_ifc_type(mut self, ifc_type: impl Into<String>) -> Self {
        self.ifc_type = Some(ifc_type.into());
        self
    }

    pub fn with_transform(mut self, transform: Isometry3<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether a click on this node can recolor it
    pub fn is_colorable(&self) -> bool {
        self.material.map_or(false, |m| m.color.is_some())
    }

    fn assign_ids(&mut self, next: &mut u32) {
        self.id = NodeId(*next);
        *next += 1;
        for child in &mut self.children {
            child.assign_ids(next);
        }
    }

    fn visit<'a>(&'a self, parent: &Isometry3<f32>, f: &mut impl FnMut(&'a ModelNode, &Isometry3<f32>)) {
        let world = parent * self.transform;
        f(self, &world);
        for child in &self.children {
            child.visit(&world, f);
        }
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut ModelNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }
}

/// A loaded model owned by the scene
#[derive(Debug, Clone)]
pub struct Model {
    root: ModelNode,
    node_count: usize,
}

impl Model {
    /// Wrap a node tree, assigning unique ids in depth-first order
    pub fn new(mut root: ModelNode) -> Self {
        let mut next = 0;
        root.assign_ids(&mut next);
        Self {
            root,
            node_count: next as usize,
        }
    }

    pub fn root(&self) -> &ModelNode {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of nodes carrying non-empty geometry
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.for_each_node(|node, _| {
            if node.geometry.as_ref().map_or(false, |g| !g.is_empty()) {
                count += 1;
            }
        });
        count
    }

    /// Visit every node together with its world transform
    pub fn for_each_node<'a>(&'a self, mut f: impl FnMut(&'a ModelNode, &Isometry3<f32>)) {
        self.root.visit(&Isometry3::identity(), &mut f);
    }

    pub fn node(&self, id: NodeId) -> Option<&ModelNode> {
        let mut found = None;
        self.for_each_node(|node, _| {
            if node.id == id {
                found = Some(node);
            }
        });
        found
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ModelNode> {
        self.root.find_mut(id)
    }

    /// World-space bounding box over all geometry in the tree.
    ///
    /// Invalid (see [`BoundingExtent::is_valid`]) when the model has no vertices.
    pub fn bounding_extent(&self) -> BoundingExtent {
        let mut bounds = BoundingExtent::new();
        self.for_each_node(|node, world| {
            if let Some(geometry) = &node.geometry {
                for position in &geometry.positions {
                    bounds.expand(&world.transform_point(position));
                }
            }
        });
        bounds
    }
}

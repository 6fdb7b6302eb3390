// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ray casting against the model tree
//!
//! Triangle and box tests are delegated to parry3d; this module only walks
//! the tree, moves geometry into world space and sorts the hits.

use nalgebra::{Point3, Vector3};
use parry3d::bounding_volume::Aabb;
use parry3d::math::{Point, Vector};
use parry3d::query::{Ray as ParryRay, RayCast};
use parry3d::shape::Triangle;

use crate::model::{Model, NodeId};

/// World-space ray with unit-length direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn point_at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }

    fn to_parry(self) -> ParryRay {
        ParryRay::new(
            Point::new(self.origin.x, self.origin.y, self.origin.z),
            Vector::new(self.direction.x, self.direction.y, self.direction.z),
        )
    }
}

/// One ray hit on a model node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeId,
    /// Distance from the ray origin
    pub distance: f32,
    pub point: Point3<f32>,
    /// Index of the hit triangle within the node's geometry
    pub triangle: usize,
}

/// All hits of `ray` on the model, nearest first.
///
/// Each node reports at most its nearest triangle. Nodes without geometry are
/// skipped, so an empty model simply yields no hits.
pub fn intersect_model(model: &Model, ray: &Ray) -> Vec<Intersection> {
    let parry_ray = ray.to_parry();
    let mut hits = Vec::new();

    model.for_each_node(|node, world| {
        let Some(geometry) = node.geometry.as_ref().filter(|g| !g.is_empty()) else {
            return;
        };

        let world_positions: Vec<Point<f32>> = geometry
            .positions
            .iter()
            .map(|p| {
                let w = world.transform_point(p);
                Point::new(w.x, w.y, w.z)
            })
            .collect();

        let aabb = Aabb::from_points(&world_positions);
        if aabb.cast_local_ray(&parry_ray, f32::MAX, true).is_none() {
            return;
        }

        let mut nearest: Option<(f32, usize)> = None;
        for (index, tri) in geometry.triangles.iter().enumerate() {
            let (Some(a), Some(b), Some(c)) = (
                world_positions.get(tri[0] as usize),
                world_positions.get(tri[1] as usize),
                world_positions.get(tri[2] as usize),
            ) else {
                continue;
            };
            let triangle = Triangle::new(*a, *b, *c);
            if let Some(toi) = triangle.cast_local_ray(&parry_ray, f32::MAX, true) {
                if nearest.map_or(true, |(best, _)| toi < best) {
                    nearest = Some((toi, index));
                }
            }
        }

        if let Some((distance, triangle)) = nearest {
            hits.push(Intersection {
                node: node.id,
                distance,
                point: ray.point_at(distance),
                triangle,
            });
        }
    });

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::box_geometry;
    use crate::model::ModelNode;
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    fn unit_box_at(x: f32, z: f32) -> ModelNode {
        ModelNode::mesh(
            box_geometry(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5)),
            None,
        )
        .with_transform(Translation3::new(x, 0.0, z).into())
    }

    fn down_negative_z(x: f32) -> Ray {
        Ray::new(Point3::new(x, 0.0, 100.0), -Vector3::z())
    }

    #[test]
    fn test_hits_are_sorted_nearest_first() {
        let model = Model::new(
            ModelNode::group("row")
                .with_child(unit_box_at(0.0, -10.0).with_name("far"))
                .with_child(unit_box_at(0.0, 0.0).with_name("near")),
        );

        let hits = intersect_model(&model, &down_negative_z(0.0));

        assert_eq!(hits.len(), 2);
        assert_eq!(model.node(hits[0].node).unwrap().name.as_deref(), Some("near"));
        assert_relative_eq!(hits[0].distance, 99.5, epsilon = 1e-3);
        assert_relative_eq!(hits[1].distance, 109.5, epsilon = 1e-3);
        assert_relative_eq!(hits[0].point.z, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_miss_returns_nothing() {
        let model = Model::new(ModelNode::group("one").with_child(unit_box_at(0.0, 0.0)));
        assert!(intersect_model(&model, &down_negative_z(5.0)).is_empty());
    }

    #[test]
    fn test_empty_model_returns_nothing() {
        let model = Model::new(
            ModelNode::group("empty").with_child(ModelNode::mesh(Default::default(), None)),
        );
        assert!(intersect_model(&model, &down_negative_z(0.0)).is_empty());
    }

    #[test]
    fn test_out_of_range_indices_are_skipped() {
        let mut geometry = box_geometry(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
        geometry.triangles.insert(0, [0, 1, 99]);
        let model = Model::new(ModelNode::group("g").with_child(ModelNode::mesh(geometry, None)));

        let hits = intersect_model(&model, &down_negative_z(0.0));
        assert_eq!(hits.len(), 1);
        assert_ne!(hits[0].triangle, 0);
    }
}

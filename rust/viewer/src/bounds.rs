// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding extents
//!
//! Extents are derived on demand from the model; nothing here is cached.

use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingExtent {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
    /// Number of points folded into the box
    pub sample_count: usize,
}

impl BoundingExtent {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
            sample_count: 0,
        }
    }

    /// Build bounds from explicit corners
    pub fn from_corners(min: Point3<f32>, max: Point3<f32>) -> Self {
        let mut bounds = Self::new();
        bounds.expand(&min);
        bounds.expand(&max);
        bounds
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
        self.sample_count += 1;
    }

    /// Grow to cover another extent
    pub fn merge(&mut self, other: &BoundingExtent) {
        if !other.is_valid() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
        self.sample_count += other.sample_count;
    }

    /// Center of the box (origin when invalid)
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        if !self.is_valid() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Width, height and depth of the box (zero when invalid)
    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        if !self.is_valid() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Largest of the three side lengths
    #[inline]
    pub fn max_dimension(&self) -> f32 {
        self.size().max()
    }

    /// Side lengths rounded to whole model units
    pub fn dimensions(&self) -> Dimensions {
        let size = self.size();
        Dimensions {
            width: size.x.round() as i64,
            height: size.y.round() as i64,
            depth: size.z.round() as i64,
        }
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }
}

impl Default for BoundingExtent {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounded model dimensions reported after every click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: i64,
    pub height: i64,
    pub depth: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let bounds = BoundingExtent::new();
        assert!(!bounds.is_valid());
        assert_eq!(bounds.size(), Vector3::zeros());
        assert_eq!(bounds.center(), Point3::origin());
    }

    #[test]
    fn test_bounds_expand() {
        let mut bounds = BoundingExtent::new();
        bounds.expand(&Point3::new(1.0, 2.0, 3.0));
        bounds.expand(&Point3::new(5.0, 4.0, 9.0));

        assert!(bounds.is_valid());
        assert_eq!(bounds.min, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bounds.max, Point3::new(5.0, 4.0, 9.0));
        assert_eq!(bounds.center(), Point3::new(3.0, 3.0, 6.0));
        assert_eq!(bounds.size(), Vector3::new(4.0, 2.0, 6.0));
        assert_eq!(bounds.max_dimension(), 6.0);
    }

    #[test]
    fn test_merge_ignores_invalid() {
        let mut bounds = BoundingExtent::from_corners(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        bounds.merge(&BoundingExtent::new());
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));

        bounds.merge(&BoundingExtent::from_corners(
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ));
        assert_eq!(bounds.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn test_dimensions_are_rounded() {
        let bounds =
            BoundingExtent::from_corners(Point3::origin(), Point3::new(3.6, 2.4, 10.5));
        assert_eq!(
            bounds.dimensions(),
            Dimensions {
                width: 4,
                height: 2,
                depth: 11
            }
        );
    }
}

//! Negated-max bounding volume for hierarchy nodes
//!
//! Stores an axis-aligned box as `(min, -max)` so that every separation and
//! containment test reduces to component-wise minimum comparisons, which
//! vectorize well. The plain min/max [`AABB`] stays the exchange type at API
//! boundaries; this representation is for the culling hierarchy itself.

use crate::foundation::math::Vec3;
use crate::geometry::{Plane, AABB};

/// Result of classifying a box against a convex region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectResult {
    /// The box lies entirely outside the region
    Miss,
    /// The box crosses the region boundary
    Partial,
    /// The box lies entirely inside the region; descendants of a hierarchy
    /// node with this result need no further plane tests
    Full,
}

/// Convex region described by outward-facing half-space planes
///
/// The corner points of the region are optional; when supplied they refine
/// the overlap test to reject boxes that straddle no single plane yet sit
/// outside the region near a corner.
#[derive(Debug, Clone, Copy)]
pub struct ConvexHull<'a> {
    /// Outward-facing boundary planes
    pub planes: &'a [Plane],
    /// Corner points of the region, or empty when unknown
    pub points: &'a [Vec3],
}

impl<'a> ConvexHull<'a> {
    /// Create a hull from planes alone
    pub fn from_planes(planes: &'a [Plane]) -> Self {
        Self { planes, points: &[] }
    }
}

/// Line segment between two points
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    /// Start point
    pub from: Vec3,
    /// End point
    pub to: Vec3,
}

/// Axis-aligned box stored as `(min, -max)`
///
/// Invariant: for a non-empty volume, `min <= -neg_max` on every axis. The
/// maximally inverted volume returned by [`BoundingVolume::max_opposite_extents`]
/// is the identity element for [`BoundingVolume::merge`] and the only
/// well-defined empty representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingVolume {
    min: Vec3,
    neg_max: Vec3,
}

impl BoundingVolume {
    /// Create a volume from min and max corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { min, neg_max: -max }
    }

    /// Recover the min and max corners
    pub fn to_min_max(&self) -> (Vec3, Vec3) {
        (self.min, -self.neg_max)
    }

    /// Create a volume from a plain AABB
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self::from_min_max(aabb.min, aabb.max)
    }

    /// Convert back to a plain AABB
    pub fn to_aabb(&self) -> AABB {
        AABB::new(self.min, -self.neg_max)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        -self.neg_max
    }

    /// The maximally inverted volume: the merge identity
    ///
    /// Both stored vectors are `+INF`, so merging any volume into it yields
    /// that volume unchanged.
    pub fn max_opposite_extents() -> Self {
        let inf = Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        Self { min: inf, neg_max: inf }
    }

    /// Expand this volume to enclose another
    ///
    /// Component-wise minimum on both stored vectors; commutative and
    /// associative.
    pub fn merge(&mut self, other: &BoundingVolume) {
        self.min = Vec3::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.min.z.min(other.min.z),
        );
        self.neg_max = Vec3::new(
            self.neg_max.x.min(other.neg_max.x),
            self.neg_max.y.min(other.neg_max.y),
            self.neg_max.z.min(other.neg_max.z),
        );
    }

    /// Size of the box on each axis
    pub fn size(&self) -> Vec3 {
        -self.neg_max - self.min
    }

    /// Center point of the box
    pub fn center(&self) -> Vec3 {
        self.min + self.size() * 0.5
    }

    /// Surface area metric, `2 * (xy + yz + zx)`
    pub fn surface_area(&self) -> f32 {
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Manhattan distance between the center-extent sums of two volumes
    ///
    /// Pairing metric for hierarchy construction: smaller means the volumes
    /// are closer and of more similar size.
    pub fn proximity_to(&self, other: &BoundingVolume) -> f32 {
        let d = (self.min - self.neg_max) - (other.min - other.neg_max);
        d.x.abs() + d.y.abs() + d.z.abs()
    }

    /// Dilate the box outward by a per-axis amount
    pub fn grow(&mut self, by: Vec3) {
        self.min -= by;
        self.neg_max -= by;
    }

    /// Dilate the box outward uniformly
    pub fn expand(&mut self, by: f32) {
        self.grow(Vec3::new(by, by, by));
    }

    /// Check overlap with another volume (boundary-inclusive)
    pub fn intersects(&self, other: &BoundingVolume) -> bool {
        if any_greater(&other.min, &-self.neg_max) {
            return false;
        }
        if any_greater(&self.min, &-other.neg_max) {
            return false;
        }
        true
    }

    /// Check whether `other` lies entirely inside this volume (boundary-inclusive)
    pub fn contains(&self, other: &BoundingVolume) -> bool {
        if any_less(&other.neg_max, &self.neg_max) {
            return false;
        }
        if any_less(&other.min, &self.min) {
            return false;
        }
        true
    }

    /// Check whether a point lies inside the box (boundary-inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        if any_less(&-point, &self.neg_max) {
            return false;
        }
        if any_less(&point, &self.min) {
            return false;
        }
        true
    }

    /// Check whether the box straddles a plane
    ///
    /// True only when the box has corners on both sides; a box touching the
    /// plane from one side does not straddle it.
    pub fn intersects_plane(&self, plane: &Plane) -> bool {
        if !plane.is_point_over(self.support_outward(&plane.normal)) {
            return false;
        }
        if plane.is_point_over(self.support_inward(&plane.normal)) {
            return false;
        }
        true
    }

    /// Classify this box against a convex region
    ///
    /// `Full` lets hierarchy traversal skip plane tests for an entire
    /// subtree; `Miss` prunes it; `Partial` must recurse.
    pub fn intersects_convex(&self, hull: &ConvexHull<'_>) -> IntersectResult {
        if self.intersects_convex_partial(hull) {
            if self.is_within_convex(hull) {
                return IntersectResult::Full;
            }
            return IntersectResult::Partial;
        }
        IntersectResult::Miss
    }

    /// Check overlap with a convex region
    ///
    /// Tests the support corner of the box against every hull plane, then
    /// applies the corner-separation refinement when hull points are known.
    pub fn intersects_convex_partial(&self, hull: &ConvexHull<'_>) -> bool {
        for plane in hull.planes {
            if plane.is_point_over(self.support_inward(&plane.normal)) {
                return false;
            }
        }
        !self.separated_by_points(hull.points)
    }

    /// Check overlap against a subset of hull planes, by index
    ///
    /// Fast path for hierarchy traversal: descendants only re-test the
    /// planes that actually cross their ancestor's box.
    pub fn intersects_convex_optimized(&self, hull: &ConvexHull<'_>, plane_ids: &[usize]) -> bool {
        for &id in plane_ids {
            let plane = &hull.planes[id];
            if plane.is_point_over(self.support_inward(&plane.normal)) {
                return false;
            }
        }
        true
    }

    /// Check whether the box lies entirely inside a convex region
    pub fn is_within_convex(&self, hull: &ConvexHull<'_>) -> bool {
        for plane in hull.planes {
            if plane.is_point_over(self.support_outward(&plane.normal)) {
                return false;
            }
        }
        true
    }

    /// Collect the indices of hull planes that cross this box
    ///
    /// Clears `out` and fills it. Planes not listed cannot cull any box
    /// contained in this one, so descendants skip them.
    pub fn find_cutting_planes(&self, hull: &ConvexHull<'_>, out: &mut Vec<usize>) {
        out.clear();
        for (id, plane) in hull.planes.iter().enumerate() {
            if self.intersects_plane(plane) {
                out.push(id);
            }
        }
    }

    /// Check whether a segment passes through the box
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;
        let max = self.max();

        for axis in 0..3 {
            let seg_from = segment.from[axis];
            let seg_to = segment.to[axis];
            let box_begin = self.min[axis];
            let box_end = max[axis];
            let length = seg_to - seg_from;

            let (c_min, c_max) = if seg_from < seg_to {
                if seg_from > box_end || seg_to < box_begin {
                    return false;
                }
                (
                    if seg_from < box_begin { (box_begin - seg_from) / length } else { 0.0 },
                    if seg_to > box_end { (box_end - seg_from) / length } else { 1.0 },
                )
            } else {
                if seg_to > box_end || seg_from < box_begin {
                    return false;
                }
                (
                    if seg_from > box_end { (box_end - seg_from) / length } else { 0.0 },
                    if seg_to < box_begin { (box_begin - seg_from) / length } else { 1.0 },
                )
            };

            t_min = t_min.max(c_min);
            t_max = t_max.min(c_max);
            if t_max < t_min {
                return false;
            }
        }
        true
    }

    /// Corner of the box furthest along `normal`
    fn support_outward(&self, normal: &Vec3) -> Vec3 {
        let half = self.size() * 0.5;
        let center = self.min + half;
        center
            + Vec3::new(
                if normal.x < 0.0 { -half.x } else { half.x },
                if normal.y < 0.0 { -half.y } else { half.y },
                if normal.z < 0.0 { -half.z } else { half.z },
            )
    }

    /// Corner of the box least far along `normal`
    fn support_inward(&self, normal: &Vec3) -> Vec3 {
        let half = self.size() * 0.5;
        let center = self.min + half;
        center
            + Vec3::new(
                if normal.x > 0.0 { -half.x } else { half.x },
                if normal.y > 0.0 { -half.y } else { half.y },
                if normal.z > 0.0 { -half.z } else { half.z },
            )
    }

    /// True when every hull point is beyond the same face of the box
    fn separated_by_points(&self, points: &[Vec3]) -> bool {
        if points.is_empty() {
            return false;
        }
        let max = self.max();
        for axis in 0..3 {
            if points.iter().all(|p| p[axis] > max[axis]) {
                return true;
            }
            if points.iter().all(|p| p[axis] < self.min[axis]) {
                return true;
            }
        }
        false
    }
}

fn any_greater(a: &Vec3, b: &Vec3) -> bool {
    a.x > b.x || a.y > b.y || a.z > b.z
}

fn any_less(a: &Vec3, b: &Vec3) -> bool {
    a.x < b.x || a.y < b.y || a.z < b.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn volume(min: (f32, f32, f32), max: (f32, f32, f32)) -> BoundingVolume {
        BoundingVolume::from_min_max(
            Vec3::new(min.0, min.1, min.2),
            Vec3::new(max.0, max.1, max.2),
        )
    }

    /// Six outward planes bounding the box `min..max`
    fn region_planes(min: Vec3, max: Vec3) -> Vec<Plane> {
        vec![
            Plane::new(Vec3::new(1.0, 0.0, 0.0), -max.x),
            Plane::new(Vec3::new(-1.0, 0.0, 0.0), min.x),
            Plane::new(Vec3::new(0.0, 1.0, 0.0), -max.y),
            Plane::new(Vec3::new(0.0, -1.0, 0.0), min.y),
            Plane::new(Vec3::new(0.0, 0.0, 1.0), -max.z),
            Plane::new(Vec3::new(0.0, 0.0, -1.0), min.z),
        ]
    }

    #[test]
    fn test_round_trip_exact() {
        let min = Vec3::new(-1.5, 0.25, -3.0);
        let max = Vec3::new(2.5, 0.75, 4.0);
        let v = BoundingVolume::from_min_max(min, max);
        let (back_min, back_max) = v.to_min_max();

        assert_eq!(back_min, min);
        assert_eq!(back_max, max);
    }

    #[test]
    fn test_merge_identity() {
        let v = volume((-1.0, -2.0, -3.0), (4.0, 5.0, 6.0));

        let mut lhs = BoundingVolume::max_opposite_extents();
        lhs.merge(&v);
        assert_eq!(lhs, v);

        let mut rhs = v;
        rhs.merge(&BoundingVolume::max_opposite_extents());
        assert_eq!(rhs, v);
    }

    #[test]
    fn test_merge_contains_operands() {
        let a = volume((-2.0, 0.0, 1.0), (1.0, 3.0, 2.0));
        let b = volume((0.0, -4.0, 0.0), (5.0, 1.0, 1.5));

        let mut merged = a;
        merged.merge(&b);

        assert!(merged.contains(&a));
        assert!(merged.contains(&b));

        // Commutative
        let mut other_way = b;
        other_way.merge(&a);
        assert_eq!(merged, other_way);
    }

    #[test]
    fn test_containment_implies_intersection() {
        let outer = volume((-5.0, -5.0, -5.0), (5.0, 5.0, 5.0));
        let inner = volume((-1.0, -1.0, -1.0), (1.0, 1.0, 1.0));

        assert!(outer.contains(&inner));
        assert!(outer.intersects(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_intersects_boundary_touching() {
        let a = volume((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        let b = volume((1.0, 0.0, 0.0), (2.0, 1.0, 1.0));
        let c = volume((1.1, 0.0, 0.0), (2.0, 1.0, 1.0));

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_contains_point() {
        let v = volume((-1.0, -1.0, -1.0), (1.0, 1.0, 1.0));

        assert!(v.contains_point(Vec3::zeros()));
        assert!(v.contains_point(Vec3::new(1.0, -1.0, 1.0)));
        assert!(!v.contains_point(Vec3::new(0.0, 1.5, 0.0)));
    }

    #[test]
    fn test_size_center_area() {
        let v = volume((-1.0, -2.0, -3.0), (3.0, 2.0, 3.0));

        assert_eq!(v.size(), Vec3::new(4.0, 4.0, 6.0));
        assert_eq!(v.center(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.surface_area(), 2.0 * (16.0 + 24.0 + 24.0));
    }

    #[test]
    fn test_grow_expand() {
        let mut v = volume((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        v.expand(0.5);

        assert_eq!(v.min(), Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(v.max(), Vec3::new(1.5, 1.5, 1.5));
    }

    #[test]
    fn test_proximity_orders_by_distance() {
        let base = volume((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        let near = volume((1.0, 0.0, 0.0), (2.0, 1.0, 1.0));
        let far = volume((10.0, 0.0, 0.0), (11.0, 1.0, 1.0));

        assert!(base.proximity_to(&near) < base.proximity_to(&far));
    }

    #[test]
    fn test_convex_classification() {
        let planes = region_planes(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));
        let hull = ConvexHull::from_planes(&planes);

        // Strictly inside with margin
        let inside = volume((-1.0, -1.0, -1.0), (1.0, 1.0, 1.0));
        assert_eq!(inside.intersects_convex(&hull), IntersectResult::Full);

        // Straddling exactly one plane
        let straddling = volume((4.0, -1.0, -1.0), (6.0, 1.0, 1.0));
        assert_eq!(straddling.intersects_convex(&hull), IntersectResult::Partial);

        // Entirely beyond one plane
        let outside = volume((7.0, -1.0, -1.0), (9.0, 1.0, 1.0));
        assert_eq!(outside.intersects_convex(&hull), IntersectResult::Miss);
    }

    #[test]
    fn test_find_cutting_planes() {
        let planes = region_planes(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));
        let hull = ConvexHull::from_planes(&planes);

        // Crosses only the +x face
        let v = volume((4.0, -1.0, -1.0), (6.0, 1.0, 1.0));
        let mut cutting = Vec::new();
        v.find_cutting_planes(&hull, &mut cutting);
        assert_eq!(cutting, vec![0]);

        // Fully inside crosses nothing
        let inside = volume((-1.0, -1.0, -1.0), (1.0, 1.0, 1.0));
        inside.find_cutting_planes(&hull, &mut cutting);
        assert!(cutting.is_empty());
    }

    #[test]
    fn test_optimized_subset_matches_full_test() {
        let planes = region_planes(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));
        let hull = ConvexHull::from_planes(&planes);
        let all: Vec<usize> = (0..planes.len()).collect();

        let straddling = volume((4.0, -1.0, -1.0), (6.0, 1.0, 1.0));
        let outside = volume((7.0, -1.0, -1.0), (9.0, 1.0, 1.0));

        assert!(straddling.intersects_convex_optimized(&hull, &all));
        assert!(!outside.intersects_convex_optimized(&hull, &all));
    }

    #[test]
    fn test_point_refinement_rejects_corner_overlap() {
        // A diagonal half-space pair whose corner region excludes the box even
        // though no single plane does. One plane cutting off the corner at
        // x + y > 2, hull restricted to a small triangle near the origin.
        let planes = vec![
            Plane::new(Vec3::new(1.0, 1.0, 0.0), -2.0),
            Plane::new(Vec3::new(-1.0, 0.0, 0.0), 0.0),
            Plane::new(Vec3::new(0.0, -1.0, 0.0), 0.0),
        ];
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];

        // Box far along +z: passes every individual plane test (the hull is
        // unbounded in z by planes alone) but the hull points all lie below
        // its z range.
        let v = volume((0.2, 0.2, 5.0), (0.8, 0.8, 6.0));
        let without_points = ConvexHull::from_planes(&planes);
        let with_points = ConvexHull { planes: &planes, points: &points };

        assert!(v.intersects_convex_partial(&without_points));
        assert!(!v.intersects_convex_partial(&with_points));
    }

    #[test]
    fn test_intersects_plane_straddle_only() {
        let plane = Plane::new(Vec3::new(1.0, 0.0, 0.0), -5.0);

        let straddling = volume((4.0, 0.0, 0.0), (6.0, 1.0, 1.0));
        let under = volume((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        let over = volume((7.0, 0.0, 0.0), (8.0, 1.0, 1.0));

        assert!(straddling.intersects_plane(&plane));
        assert!(!under.intersects_plane(&plane));
        assert!(!over.intersects_plane(&plane));
    }

    #[test]
    fn test_intersects_segment() {
        let v = volume((-1.0, -1.0, -1.0), (1.0, 1.0, 1.0));

        let through = Segment {
            from: Vec3::new(-5.0, 0.0, 0.0),
            to: Vec3::new(5.0, 0.0, 0.0),
        };
        let miss = Segment {
            from: Vec3::new(-5.0, 3.0, 0.0),
            to: Vec3::new(5.0, 3.0, 0.0),
        };
        let short = Segment {
            from: Vec3::new(-5.0, 0.0, 0.0),
            to: Vec3::new(-2.0, 0.0, 0.0),
        };
        let inside = Segment {
            from: Vec3::new(-0.5, 0.0, 0.0),
            to: Vec3::new(0.5, 0.0, 0.0),
        };

        assert!(v.intersects_segment(&through));
        assert!(!v.intersects_segment(&miss));
        assert!(!v.intersects_segment(&short));
        assert!(v.intersects_segment(&inside));
    }

    #[test]
    fn test_zero_size_volume_is_valid() {
        let v = volume((1.0, 1.0, 1.0), (1.0, 1.0, 1.0));
        let planes = region_planes(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let hull = ConvexHull::from_planes(&planes);

        assert_eq!(v.size(), Vec3::zeros());
        assert!(v.contains_point(Vec3::new(1.0, 1.0, 1.0)));
        assert_eq!(v.intersects_convex(&hull), IntersectResult::Full);
    }
}

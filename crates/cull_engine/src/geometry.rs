//! Shared geometric primitives for spatial queries
//!
//! Provides the plain min/max bounding box used at API boundaries, the
//! half-space plane, and the camera frustum. Half-space planes face
//! *outward*: a point with positive signed distance is outside the region
//! they bound.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if this AABB contains a point (boundary-inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB (boundary-inclusive)
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Grow this AABB to enclose another
    pub fn merge(&mut self, other: &AABB) {
        self.min = Vec3::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.min.z.min(other.min.z),
        );
        self.max = Vec3::new(
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
            self.max.z.max(other.max.z),
        );
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Returns the distance to the entry point if the ray intersects, None otherwise.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let t1 = (self.min.x - ray_origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray_origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray_origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray_origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray_origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray_origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

/// Plane defined by a normal and a distance from the origin
///
/// The plane bounds the half-space `normal . p + distance <= 0`; its normal
/// points toward the excluded side. The normal does not need to be unit
/// length for the containment tests, which only depend on the sign of the
/// signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector, pointing out of the bounded region
    pub normal: Vec3,
    /// Distance term of the plane equation
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Check whether a point lies on the outside (normal-facing) side
    pub fn is_point_over(&self, point: Vec3) -> bool {
        self.distance_to_point(point) > 0.0
    }
}

/// Frustum for visibility culling
///
/// A convex region bounded by outward-facing planes. A camera supplies six,
/// but any plane count is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Outward-facing planes bounding the visible region
    pub planes: Vec<Plane>,
}

impl Frustum {
    /// Create a frustum from a set of outward-facing planes
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Uses the Gribb-Hartmann method: the six clip-space half-spaces are
    /// read off the rows of the combined matrix, then flipped to the outward
    /// convention and normalized. Rows with a degenerate normal (e.g. the far
    /// plane of an infinite projection) are skipped.
    pub fn from_view_projection(matrix: &Mat4) -> Self {
        let row = |i: usize| {
            Vec4::new(
                matrix[(i, 0)],
                matrix[(i, 1)],
                matrix[(i, 2)],
                matrix[(i, 3)],
            )
        };
        let r3 = row(3);

        let mut planes = Vec::with_capacity(6);
        for i in 0..3 {
            let r = row(i);
            for inward in [r3 + r, r3 - r] {
                let normal = Vec3::new(inward.x, inward.y, inward.z);
                let length = normal.magnitude();
                if length <= 1.0e-6 {
                    continue;
                }
                // Inward half-space n.p + w >= 0 becomes an outward plane by
                // negating both terms.
                planes.push(Plane::new(-normal / length, -inward.w / length));
            }
        }

        Self { planes }
    }

    /// Check whether a point lies inside the frustum (boundary-inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| !plane.is_point_over(point))
    }
}

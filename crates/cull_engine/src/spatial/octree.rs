//! Octree spatial partitioning structure
//!
//! Divides 3D space into hierarchical octants for fast convex-region
//! queries. Elements are axis-aligned boxes identified by stable
//! generational ids; each element lives at the deepest node whose bounds
//! fully contain it, so boxes straddling an octant boundary stay at the
//! parent. Nodes subdivide when element density exceeds a threshold.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::foundation::math::Vec3;
use crate::geometry::AABB;
use crate::spatial::bounds::{BoundingVolume, ConvexHull};

slotmap::new_key_type! {
    /// Stable identifier for an element stored in an [`Octree`]
    ///
    /// Valid from insertion until erased; erased ids never alias new
    /// elements thanks to the generation counter.
    pub struct OctreeElementId;
}

/// Configuration for octree behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// Maximum elements per node before subdivision
    pub max_elements_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node half-extent (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_elements_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ElementData<P> {
    payload: P,
    bounds: BoundingVolume,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
struct OctreeNode {
    /// World-space bounds of this node
    bounds: BoundingVolume,

    /// Elements stored at this node: contained in `bounds` but in no
    /// single child
    elements: Vec<OctreeElementId>,

    /// Child nodes (8 octants), None if this is a leaf
    children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    depth: u32,
}

impl OctreeNode {
    fn new(bounds: BoundingVolume, depth: u32) -> Self {
        Self {
            bounds,
            elements: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Subdivide into 8 children and push contained elements one level down
    fn subdivide<P>(&mut self, elements: &SlotMap<OctreeElementId, ElementData<P>>) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter = self.bounds.size() * 0.25;
        let depth = self.depth + 1;

        // Octant layout: bit 0 = +x, bit 1 = +y, bit 2 = +z
        let mut children = Box::new(std::array::from_fn::<OctreeNode, 8, _>(|octant| {
            let x_sign = if octant & 1 != 0 { 1.0 } else { -1.0 };
            let y_sign = if octant & 2 != 0 { 1.0 } else { -1.0 };
            let z_sign = if octant & 4 != 0 { 1.0 } else { -1.0 };

            let child_center = Vec3::new(
                center.x + quarter.x * x_sign,
                center.y + quarter.y * y_sign,
                center.z + quarter.z * z_sign,
            );
            let child_aabb = AABB::from_center_extents(child_center, quarter);
            OctreeNode::new(BoundingVolume::from_aabb(&child_aabb), depth)
        }));

        let ids = std::mem::take(&mut self.elements);
        for id in ids {
            let bounds = &elements[id].bounds;
            match children.iter_mut().find(|c| c.bounds.contains(bounds)) {
                Some(child) => child.elements.push(id),
                None => self.elements.push(id),
            }
        }

        self.children = Some(children);
    }
}

/// Pre-allocation hint for cull result buffers
///
/// A soft sizing hint, not a cap: buffers grow past it when a query
/// returns more elements.
pub const CULL_RESERVE: usize = 32_768;

/// Octree keyed by bounding volume, storing opaque payload handles
///
/// Elements whose bounds fall outside the root region are kept on a linear
/// fallback list so queries stay exact everywhere; keep the configured
/// world bounds generous enough that this list stays short.
#[derive(Debug, Clone)]
pub struct Octree<P> {
    root: OctreeNode,
    outliers: Vec<OctreeElementId>,
    elements: SlotMap<OctreeElementId, ElementData<P>>,
    config: OctreeConfig,
}

impl<P: Copy> Octree<P> {
    /// Create a new octree covering the given world bounds
    pub fn new(world_bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(BoundingVolume::from_aabb(&world_bounds), 0),
            outliers: Vec::new(),
            elements: SlotMap::with_key(),
            config,
        }
    }

    /// Insert a payload keyed by its bounding box
    ///
    /// The returned id stays valid until [`Octree::erase`].
    pub fn insert(&mut self, payload: P, aabb: &AABB) -> OctreeElementId {
        let bounds = BoundingVolume::from_aabb(aabb);
        let id = self.elements.insert(ElementData { payload, bounds });

        if self.root.bounds.contains(&bounds) {
            Self::node_insert(&mut self.root, id, &bounds, &self.config, &self.elements);
        } else {
            self.outliers.push(id);
        }
        id
    }

    /// Update an element's bounding box
    ///
    /// Cheap early-out when the box is unchanged. Returns false (and logs)
    /// for an unknown or stale id.
    pub fn move_element(&mut self, id: OctreeElementId, aabb: &AABB) -> bool {
        let new_bounds = BoundingVolume::from_aabb(aabb);
        let Some(data) = self.elements.get(id) else {
            log::error!("octree move on unknown element {id:?}");
            return false;
        };
        if data.bounds == new_bounds {
            return true;
        }

        let old_bounds = data.bounds;
        self.detach(id, &old_bounds);
        self.elements[id].bounds = new_bounds;

        if self.root.bounds.contains(&new_bounds) {
            Self::node_insert(&mut self.root, id, &new_bounds, &self.config, &self.elements);
        } else {
            self.outliers.push(id);
        }
        true
    }

    /// Remove an element, returning its payload
    ///
    /// Returns None (and logs) for an unknown or stale id.
    pub fn erase(&mut self, id: OctreeElementId) -> Option<P> {
        let Some(data) = self.elements.remove(id) else {
            log::error!("octree erase on unknown element {id:?}");
            return None;
        };
        self.detach(id, &data.bounds);
        Some(data.payload)
    }

    /// Collect every payload whose box overlaps the convex region
    pub fn cull_convex(&self, hull: &ConvexHull<'_>) -> Vec<P> {
        let mut results = Vec::new();
        self.cull_convex_into(hull, &mut results);
        results
    }

    /// Collect overlapping payloads into a caller-owned buffer
    ///
    /// Appends without clearing; result order is unspecified.
    pub fn cull_convex_into(&self, hull: &ConvexHull<'_>, results: &mut Vec<P>) {
        let all: Vec<usize> = (0..hull.planes.len()).collect();
        self.cull_node(&self.root, hull, &all, results);

        for &id in &self.outliers {
            let element = &self.elements[id];
            if element.bounds.intersects_convex_partial(hull) {
                results.push(element.payload);
            }
        }
    }

    /// Bounding box of a stored element
    pub fn element_bounds(&self, id: OctreeElementId) -> Option<AABB> {
        self.elements.get(id).map(|data| data.bounds.to_aabb())
    }

    /// Number of stored elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the octree stores no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Remove all elements, keeping the world bounds and configuration
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.outliers.clear();
        self.elements.clear();
    }

    /// Remove an element id from the node or fallback list holding it
    fn detach(&mut self, id: OctreeElementId, bounds: &BoundingVolume) {
        let removed = if self.root.bounds.contains(bounds) {
            Self::node_remove(&mut self.root, id, bounds)
        } else if let Some(pos) = self.outliers.iter().position(|&e| e == id) {
            self.outliers.swap_remove(pos);
            true
        } else {
            false
        };
        debug_assert!(removed, "element {id:?} not found at its recorded location");
    }

    fn node_insert(
        node: &mut OctreeNode,
        id: OctreeElementId,
        bounds: &BoundingVolume,
        config: &OctreeConfig,
        elements: &SlotMap<OctreeElementId, ElementData<P>>,
    ) {
        if node.children.is_none() {
            let should_subdivide = node.elements.len() >= config.max_elements_per_node
                && node.depth < config.max_depth
                && node.bounds.size().x * 0.5 > config.min_node_size;

            if !should_subdivide {
                node.elements.push(id);
                return;
            }
            node.subdivide(elements);
        }

        if let Some(children) = node.children.as_deref_mut() {
            for child in children.iter_mut() {
                if child.bounds.contains(bounds) {
                    Self::node_insert(child, id, bounds, config, elements);
                    return;
                }
            }
        }

        // No single child contains the box; it stays at this branch node
        node.elements.push(id);
    }

    /// Walk the same containment path as insertion and remove the id there
    fn node_remove(node: &mut OctreeNode, id: OctreeElementId, bounds: &BoundingVolume) -> bool {
        if let Some(children) = node.children.as_deref_mut() {
            for child in children.iter_mut() {
                if child.bounds.contains(bounds) {
                    return Self::node_remove(child, id, bounds);
                }
            }
        }

        if let Some(pos) = node.elements.iter().position(|&e| e == id) {
            node.elements.swap_remove(pos);
            return true;
        }
        false
    }

    fn cull_node(
        &self,
        node: &OctreeNode,
        hull: &ConvexHull<'_>,
        active: &[usize],
        results: &mut Vec<P>,
    ) {
        // Any active plane with the node box entirely beyond it prunes the
        // whole subtree.
        if !node.bounds.intersects_convex_optimized(hull, active) {
            return;
        }

        // Planes the node box does not straddle cannot cull anything inside
        // it; descendants only re-test the crossing subset.
        let mut cutting = Vec::with_capacity(active.len());
        for &id in active {
            if node.bounds.intersects_plane(&hull.planes[id]) {
                cutting.push(id);
            }
        }

        if cutting.is_empty() {
            // Fully inside the region: take the subtree without plane tests
            self.collect_subtree(node, results);
            return;
        }

        for &id in &node.elements {
            let element = &self.elements[id];
            let hit = if hull.points.is_empty() {
                element.bounds.intersects_convex_optimized(hull, &cutting)
            } else {
                element.bounds.intersects_convex_partial(hull)
            };
            if hit {
                results.push(element.payload);
            }
        }

        if let Some(children) = node.children.as_deref() {
            for child in children.iter() {
                self.cull_node(child, hull, &cutting, results);
            }
        }
    }

    fn collect_subtree(&self, node: &OctreeNode, results: &mut Vec<P>) {
        for &id in &node.elements {
            results.push(self.elements[id].payload);
        }
        if let Some(children) = node.children.as_deref() {
            for child in children.iter() {
                self.collect_subtree(child, results);
            }
        }
    }
}

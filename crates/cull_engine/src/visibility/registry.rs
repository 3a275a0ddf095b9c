//! Incremental multi-camera visibility tracking
//!
//! The registry owns an octree of registered volumes and a record per
//! camera of what that camera currently sees. Each [`VisibilityRegistry::update`]
//! call re-culls the octree once per camera and diffs the result against
//! the camera's record, emitting enter/exit transition events instead of
//! rebuilding visibility from scratch.

use std::collections::HashMap;

use slotmap::SlotMap;
use thiserror::Error;

use crate::geometry::{Frustum, AABB};
use crate::spatial::{ConvexHull, Octree, OctreeElementId, CULL_RESERVE};

slotmap::new_key_type! {
    /// Stable identifier for a registered visibility volume
    pub struct VolumeId;
}

slotmap::new_key_type! {
    /// Stable identifier for a registered camera
    pub struct CameraId;
}

/// Visibility transition emitted during an update or a removal
///
/// Drained by the caller via [`VisibilityRegistry::drain_events`]; the
/// registry never calls back into caller-owned objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityEvent {
    /// A volume became visible to a camera
    Entered {
        /// The observing camera
        camera: CameraId,
        /// The volume that entered its frustum
        volume: VolumeId,
    },
    /// A volume stopped being visible to a camera
    Exited {
        /// The observing camera
        camera: CameraId,
        /// The volume that left its frustum
        volume: VolumeId,
    },
}

/// Errors for operations on unknown or stale handles
///
/// These indicate caller bugs, not recoverable conditions; they are logged
/// and returned, never silently absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VisibilityError {
    /// The volume id was never registered or has been removed
    #[error("unknown or stale volume id {0:?}")]
    UnknownVolume(VolumeId),

    /// The camera id was never registered or has been removed
    #[error("unknown or stale camera id {0:?}")]
    UnknownCamera(CameraId),
}

#[derive(Debug)]
struct VolumeData {
    aabb: AABB,
    element: OctreeElementId,
}

#[derive(Debug)]
struct CameraData {
    frustum: Frustum,
    /// Volumes currently visible to this camera, tagged with the pass that
    /// last confirmed them
    visible: HashMap<VolumeId, u64>,
}

/// Registry of visibility volumes and cameras with frame-coherent culling
///
/// Single-threaded by design: all mutation and [`VisibilityRegistry::update`]
/// must be serialized by the host (typically confined to one commit phase
/// per simulated frame).
#[derive(Debug)]
pub struct VisibilityRegistry {
    octree: Octree<VolumeId>,
    volumes: SlotMap<VolumeId, VolumeData>,
    cameras: SlotMap<CameraId, CameraData>,

    /// Reused cull result buffer
    cull_buffer: Vec<VolumeId>,

    /// Pending transition events, drained by the caller
    events: Vec<VisibilityEvent>,

    /// Set by any registration, removal or movement; updates are skipped
    /// while clear
    changed: bool,

    /// Global pass counter, incremented once per camera per update
    pass: u64,

    /// Frame id of the most recent update; makes update idempotent within
    /// a frame. Frame ids are expected to start at 1.
    last_frame: u64,
}

impl VisibilityRegistry {
    /// Create a registry over the given octree
    pub fn new(octree: Octree<VolumeId>) -> Self {
        Self {
            octree,
            volumes: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            cull_buffer: Vec::with_capacity(CULL_RESERVE),
            events: Vec::new(),
            changed: false,
            pass: 0,
            last_frame: 0,
        }
    }

    /// Register a visibility volume with its world-space bounding box
    pub fn register_volume(&mut self, aabb: AABB) -> VolumeId {
        let octree = &mut self.octree;
        let id = self.volumes.insert_with_key(|id| VolumeData {
            aabb,
            element: octree.insert(id, &aabb),
        });
        self.changed = true;
        log::debug!("registered volume {id:?}");
        id
    }

    /// Update a volume's bounding box after its object moved
    ///
    /// No-op when the box is unchanged, so callers can forward every
    /// transform change without tracking deltas themselves.
    pub fn update_volume(&mut self, id: VolumeId, aabb: AABB) -> Result<(), VisibilityError> {
        let Some(data) = self.volumes.get_mut(id) else {
            log::error!("update_volume on unknown volume {id:?}");
            return Err(VisibilityError::UnknownVolume(id));
        };
        if data.aabb == aabb {
            return Ok(());
        }

        data.aabb = aabb;
        let element = data.element;
        let moved = self.octree.move_element(element, &aabb);
        debug_assert!(moved, "volume {id:?} lost its octree element");
        self.changed = true;
        Ok(())
    }

    /// Unregister a volume
    ///
    /// Queues an [`VisibilityEvent::Exited`] for every camera currently
    /// seeing it; a removed volume is never reported visible again.
    pub fn remove_volume(&mut self, id: VolumeId) -> Result<(), VisibilityError> {
        let Some(data) = self.volumes.remove(id) else {
            log::error!("remove_volume on unknown volume {id:?}");
            return Err(VisibilityError::UnknownVolume(id));
        };
        self.octree.erase(data.element);

        for (camera, record) in &mut self.cameras {
            if record.visible.remove(&id).is_some() {
                self.events.push(VisibilityEvent::Exited { camera, volume: id });
            }
        }

        self.changed = true;
        log::debug!("removed volume {id:?}");
        Ok(())
    }

    /// Register a camera with its current frustum
    pub fn register_camera(&mut self, frustum: Frustum) -> CameraId {
        let id = self.cameras.insert(CameraData {
            frustum,
            visible: HashMap::new(),
        });
        self.changed = true;
        log::debug!("registered camera {id:?}");
        id
    }

    /// Replace a camera's frustum after it moved or reprojected
    pub fn update_camera(&mut self, id: CameraId, frustum: Frustum) -> Result<(), VisibilityError> {
        let Some(record) = self.cameras.get_mut(id) else {
            log::error!("update_camera on unknown camera {id:?}");
            return Err(VisibilityError::UnknownCamera(id));
        };
        record.frustum = frustum;
        self.changed = true;
        Ok(())
    }

    /// Unregister a camera
    ///
    /// A removed camera observes nothing, so an [`VisibilityEvent::Exited`]
    /// is queued for every volume it still recorded as visible.
    pub fn remove_camera(&mut self, id: CameraId) -> Result<(), VisibilityError> {
        let Some(record) = self.cameras.remove(id) else {
            log::error!("remove_camera on unknown camera {id:?}");
            return Err(VisibilityError::UnknownCamera(id));
        };
        for (&volume, _) in &record.visible {
            self.events.push(VisibilityEvent::Exited { camera: id, volume });
        }
        log::debug!("removed camera {id:?}");
        Ok(())
    }

    /// Recompute visibility for every camera and queue transition events
    ///
    /// Idempotent per frame: a second call with the same `frame` returns
    /// immediately. When nothing was registered, removed or moved since the
    /// previous update, the whole pass is skipped because the results could
    /// not differ.
    pub fn update(&mut self, frame: u64) {
        if frame == self.last_frame {
            return;
        }
        self.last_frame = frame;

        if !self.changed {
            return;
        }

        let octree = &self.octree;
        let cull_buffer = &mut self.cull_buffer;
        let events = &mut self.events;
        let pass_counter = &mut self.pass;

        let mut entered: Vec<VolumeId> = Vec::new();
        for (camera, record) in &mut self.cameras {
            *pass_counter += 1;
            let pass = *pass_counter;

            cull_buffer.clear();
            let hull = ConvexHull::from_planes(&record.frustum.planes);
            octree.cull_convex_into(&hull, cull_buffer);

            entered.clear();
            for &volume in cull_buffer.iter() {
                match record.visible.entry(volume) {
                    std::collections::hash_map::Entry::Occupied(mut seen) => {
                        // Still visible; confirm for this pass without
                        // re-announcing
                        *seen.get_mut() = pass;
                    }
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(pass);
                        entered.push(volume);
                    }
                }
            }

            for &volume in &entered {
                events.push(VisibilityEvent::Entered { camera, volume });
            }

            // Anything not confirmed this pass fell out of the frustum
            record.visible.retain(|&volume, seen| {
                if *seen == pass {
                    true
                } else {
                    events.push(VisibilityEvent::Exited { camera, volume });
                    false
                }
            });

            log::trace!(
                "camera {camera:?}: pass {pass}, {} culled, {} entered",
                cull_buffer.len(),
                entered.len()
            );
        }

        self.changed = false;
    }

    /// Drain all pending transition events
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, VisibilityEvent> {
        self.events.drain(..)
    }

    /// Whether a volume is currently recorded visible to a camera
    pub fn is_visible(&self, camera: CameraId, volume: VolumeId) -> bool {
        self.cameras
            .get(camera)
            .is_some_and(|record| record.visible.contains_key(&volume))
    }

    /// Ids of all registered cameras
    pub fn camera_list(&self) -> Vec<CameraId> {
        self.cameras.keys().collect()
    }

    /// Current bounding box of a registered volume
    pub fn volume_aabb(&self, id: VolumeId) -> Option<AABB> {
        self.volumes.get(id).map(|data| data.aabb)
    }

    /// Number of registered volumes
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    /// Number of registered cameras
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }
}

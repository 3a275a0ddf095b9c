//! World: visibility registry plus scene-scoped server resources
//!
//! A world owns one visibility registry (absent when 3-D culling is
//! disabled in the settings, in which case every registry call is a no-op)
//! and two opaque resources created by the embedding servers: a physics
//! space and a rendering scenario. Both are injected at construction and
//! released when the world drops.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::Vec3;
use crate::geometry::{Frustum, AABB};
use crate::spatial::{Octree, OctreeConfig};
use crate::visibility::{CameraId, VisibilityError, VisibilityEvent, VisibilityRegistry, VolumeId};

/// Opaque physics-space resource owned by a [`World`]
///
/// Implemented by the embedding physics server; dropping the handle
/// releases the space.
pub trait SpaceHandle: std::fmt::Debug {}

/// Opaque rendering-scenario resource owned by a [`World`]
///
/// Implemented by the embedding render server; dropping the handle
/// releases the scenario.
pub trait ScenarioHandle: std::fmt::Debug {}

/// Settings for constructing a [`World`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Whether 3-D visibility culling is enabled; when false the world
    /// carries no registry and all culling calls are no-ops
    pub enable_3d_culling: bool,

    /// Region covered by the spatial index
    pub world_bounds: AABB,

    /// Octree subdivision behavior
    pub octree: OctreeConfig,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            enable_3d_culling: true,
            world_bounds: AABB::new(
                Vec3::new(-1000.0, -1000.0, -1000.0),
                Vec3::new(1000.0, 1000.0, 1000.0),
            ),
            octree: OctreeConfig::default(),
        }
    }
}

impl Config for WorldSettings {}

/// Container for one scene's spatial state
pub struct World {
    space: Box<dyn SpaceHandle>,
    scenario: Box<dyn ScenarioHandle>,
    indexer: Option<VisibilityRegistry>,
}

impl World {
    /// Create a world around freshly created server resources
    pub fn new(
        settings: &WorldSettings,
        space: Box<dyn SpaceHandle>,
        scenario: Box<dyn ScenarioHandle>,
    ) -> Self {
        let indexer = settings.enable_3d_culling.then(|| {
            VisibilityRegistry::new(Octree::new(settings.world_bounds, settings.octree.clone()))
        });
        log::info!(
            "created world (3d culling {})",
            if indexer.is_some() { "enabled" } else { "disabled" }
        );
        Self {
            space,
            scenario,
            indexer,
        }
    }

    /// The physics-space resource associated with this world
    pub fn space(&self) -> &dyn SpaceHandle {
        self.space.as_ref()
    }

    /// The rendering-scenario resource associated with this world
    pub fn scenario(&self) -> &dyn ScenarioHandle {
        self.scenario.as_ref()
    }

    /// Access the visibility registry, if culling is enabled
    pub fn indexer(&self) -> Option<&VisibilityRegistry> {
        self.indexer.as_ref()
    }

    /// Register a camera; returns the null id when culling is disabled
    pub fn register_camera(&mut self, frustum: Frustum) -> CameraId {
        self.indexer
            .as_mut()
            .map_or_else(CameraId::default, |indexer| indexer.register_camera(frustum))
    }

    /// Replace a camera's frustum
    pub fn update_camera(&mut self, id: CameraId, frustum: Frustum) -> Result<(), VisibilityError> {
        match &mut self.indexer {
            Some(indexer) => indexer.update_camera(id, frustum),
            None => Ok(()),
        }
    }

    /// Unregister a camera
    pub fn remove_camera(&mut self, id: CameraId) -> Result<(), VisibilityError> {
        match &mut self.indexer {
            Some(indexer) => indexer.remove_camera(id),
            None => Ok(()),
        }
    }

    /// Register a visibility volume; returns the null id when culling is
    /// disabled
    pub fn register_volume(&mut self, aabb: AABB) -> VolumeId {
        self.indexer
            .as_mut()
            .map_or_else(VolumeId::default, |indexer| indexer.register_volume(aabb))
    }

    /// Update a volume's bounding box
    pub fn update_volume(&mut self, id: VolumeId, aabb: AABB) -> Result<(), VisibilityError> {
        match &mut self.indexer {
            Some(indexer) => indexer.update_volume(id, aabb),
            None => Ok(()),
        }
    }

    /// Unregister a visibility volume
    pub fn remove_volume(&mut self, id: VolumeId) -> Result<(), VisibilityError> {
        match &mut self.indexer {
            Some(indexer) => indexer.remove_volume(id),
            None => Ok(()),
        }
    }

    /// Run the per-frame visibility pass
    pub fn update(&mut self, frame: u64) {
        if let Some(indexer) = &mut self.indexer {
            indexer.update(frame);
        }
    }

    /// Drain pending visibility transition events
    pub fn drain_events(&mut self) -> Vec<VisibilityEvent> {
        self.indexer
            .as_mut()
            .map(|indexer| indexer.drain_events().collect())
            .unwrap_or_default()
    }

    /// Ids of all registered cameras
    pub fn camera_list(&self) -> Vec<CameraId> {
        self.indexer
            .as_ref()
            .map(VisibilityRegistry::camera_list)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("space", &self.space)
            .field("scenario", &self.scenario)
            .field("culling_enabled", &self.indexer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct TrackedResource {
        released: Rc<Cell<bool>>,
    }

    impl Drop for TrackedResource {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    impl SpaceHandle for TrackedResource {}
    impl ScenarioHandle for TrackedResource {}

    fn tracked() -> (Box<TrackedResource>, Rc<Cell<bool>>) {
        let released = Rc::new(Cell::new(false));
        (
            Box::new(TrackedResource {
                released: Rc::clone(&released),
            }),
            released,
        )
    }

    fn box_frustum(half: f32) -> Frustum {
        Frustum::new(vec![
            Plane::new(Vec3::new(1.0, 0.0, 0.0), -half),
            Plane::new(Vec3::new(-1.0, 0.0, 0.0), -half),
            Plane::new(Vec3::new(0.0, 1.0, 0.0), -half),
            Plane::new(Vec3::new(0.0, -1.0, 0.0), -half),
            Plane::new(Vec3::new(0.0, 0.0, 1.0), -half),
            Plane::new(Vec3::new(0.0, 0.0, -1.0), -half),
        ])
    }

    #[test]
    fn test_world_end_to_end_visibility() {
        let (space, _) = tracked();
        let (scenario, _) = tracked();
        let mut world = World::new(&WorldSettings::default(), space, scenario);

        let volume = world.register_volume(AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        let camera = world.register_camera(box_frustum(5.0));

        world.update(1);
        let events = world.drain_events();

        assert_eq!(events, vec![VisibilityEvent::Entered { camera, volume }]);
        assert_eq!(world.camera_list(), vec![camera]);
    }

    #[test]
    fn test_world_with_culling_disabled_is_inert() {
        let (space, _) = tracked();
        let (scenario, _) = tracked();
        let settings = WorldSettings {
            enable_3d_culling: false,
            ..WorldSettings::default()
        };
        let mut world = World::new(&settings, space, scenario);

        let volume = world.register_volume(AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        let camera = world.register_camera(box_frustum(5.0));

        assert_eq!(volume, VolumeId::default());
        assert_eq!(camera, CameraId::default());
        assert!(world.update_volume(volume, AABB::new(Vec3::zeros(), Vec3::zeros())).is_ok());
        assert!(world.remove_camera(camera).is_ok());

        world.update(1);
        assert!(world.drain_events().is_empty());
        assert!(world.camera_list().is_empty());
        assert!(world.indexer().is_none());
    }

    #[test]
    fn test_world_releases_resources_on_drop() {
        let (space, space_released) = tracked();
        let (scenario, scenario_released) = tracked();
        let world = World::new(&WorldSettings::default(), space, scenario);

        assert!(!space_released.get());
        assert!(!scenario_released.get());

        drop(world);
        assert!(space_released.get());
        assert!(scenario_released.get());
    }
}

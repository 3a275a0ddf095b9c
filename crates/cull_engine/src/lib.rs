//! # Cull Engine
//!
//! Spatial partitioning and incremental visibility culling for real-time
//! 3D scenes.
//!
//! ## Features
//!
//! - **Negated-max bounding volumes**: axis-aligned boxes stored as
//!   `(min, -max)` so separation tests reduce to component-wise minimum
//!   comparisons
//! - **Octree spatial index**: convex-region queries over thousands of
//!   dynamic boxes with full-containment shortcuts and cutting-plane
//!   pruning
//! - **Frame-coherent visibility**: per-camera enter/exit transition
//!   events instead of from-scratch visibility sets, deduplicated by a
//!   global pass counter
//! - **Arena handles**: generational ids for volumes and cameras; the
//!   engine never dereferences caller-owned memory
//!
//! ## Quick Start
//!
//! ```
//! use cull_engine::prelude::*;
//!
//! let settings = WorldSettings::default();
//! let mut registry =
//!     VisibilityRegistry::new(Octree::new(settings.world_bounds, settings.octree.clone()));
//!
//! let _volume = registry.register_volume(AABB::new(
//!     Vec3::new(-1.0, -1.0, -1.0),
//!     Vec3::new(1.0, 1.0, 1.0),
//! ));
//! let _camera = registry.register_camera(Frustum::new(vec![
//!     Plane::new(Vec3::new(0.0, 0.0, 1.0), -10.0),
//!     Plane::new(Vec3::new(0.0, 0.0, -1.0), -10.0),
//! ]));
//!
//! registry.update(1);
//! for event in registry.drain_events() {
//!     match event {
//!         VisibilityEvent::Entered { camera, volume } => {
//!             println!("{volume:?} entered {camera:?}");
//!         }
//!         VisibilityEvent::Exited { camera, volume } => {
//!             println!("{volume:?} exited {camera:?}");
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod geometry;
pub mod scene;
pub mod spatial;
pub mod visibility;

pub use scene::{ScenarioHandle, SpaceHandle, World, WorldSettings};
pub use visibility::{CameraId, VisibilityError, VisibilityEvent, VisibilityRegistry, VolumeId};

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::foundation::math::{Mat4, Vec3, Vec4};
    pub use crate::geometry::{Frustum, Plane, AABB};
    pub use crate::scene::{ScenarioHandle, SpaceHandle, World, WorldSettings};
    pub use crate::spatial::{
        BoundingVolume, ConvexHull, IntersectResult, Octree, OctreeConfig, OctreeElementId,
        Segment, CULL_RESERVE,
    };
    pub use crate::visibility::{
        CameraId, VisibilityError, VisibilityEvent, VisibilityRegistry, VolumeId,
    };
}

//! Scene-level composition
//!
//! The [`World`] ties the visibility registry to the opaque resources the
//! surrounding engine associates with a scene.

mod world;

pub use world::{ScenarioHandle, SpaceHandle, World, WorldSettings};

//! Frame-coherent visibility tracking
//!
//! Tracks which registered volumes are inside which camera frustums,
//! incrementally, frame over frame, and reports only the transitions.

mod registry;

pub use registry::{CameraId, VisibilityError, VisibilityEvent, VisibilityRegistry, VolumeId};

//! Foundation utilities shared across the engine
//!
//! Math type aliases and logging setup. Kept deliberately small; everything
//! here is re-exported where it is consumed.

pub mod logging;
pub mod math;

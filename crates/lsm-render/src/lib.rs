//! LSM Render - Drives the light engine for a validated frame stream
//!
//! This crate implements:
//! - The engine capability interface and the owned engine handle
//! - Engine lifecycle (open / restart / close)
//! - Personalization state (lightness and zone immersion)
//! - The render transform (capacity query and per-frame processing)
//! - The render element: all of the above behind one exclusive lock

pub mod element;
pub mod engine;
pub mod lifecycle;
pub mod personalization;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

pub use element::*;
pub use engine::*;
pub use lifecycle::*;
pub use personalization::*;
pub use transform::*;

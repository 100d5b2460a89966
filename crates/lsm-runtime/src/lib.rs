//! LSM Runtime - Parse and render pipeline
//!
//! This crate implements:
//! - The two-stage pipeline (framer → frame queue → render element → sink)
//! - Light sinks and preroll handling
//! - JSON pipeline configuration
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod sink;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use pipeline::*;
pub use sink::*;

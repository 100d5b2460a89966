//! LSM Test Harness - Mock engine and end-to-end scenarios
//!
//! This crate provides:
//! - A deterministic mock light engine with scripted failures
//! - Seeded frame stream generation with expected framer decisions
//! - A scenario harness running generated streams through a full pipeline

pub mod mock;
pub mod scenario;
pub mod stream;

pub use mock::*;
pub use scenario::*;
pub use stream::*;

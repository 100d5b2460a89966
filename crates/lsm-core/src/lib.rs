//! LSM Core - Fundamental types shared by the light-stream crates
//!
//! This crate defines:
//! - Stream init metadata and the accepted stream description
//! - Renderer configuration handed to the light engine
//! - Personalization and output constants
//! - The error taxonomy used throughout the workspace

pub mod config;
pub mod error;
pub mod metadata;

pub use config::*;
pub use error::*;
pub use metadata::*;

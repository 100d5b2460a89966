//! LSM Wire Format - Binary light-stream layout
//!
//! This crate implements the byte-level side of an LSM stream:
//! - Init descriptor (19 bytes, big-endian fields after a 12-byte reserved prefix)
//! - Frame classification against the stream metadata
//! - The framer state machine (awaiting metadata / ready)
//! - The light output layout produced by the engine

pub mod cursor;
pub mod frame;
pub mod framer;
pub mod init;
pub mod output;

pub use cursor::*;
pub use frame::*;
pub use framer::*;
pub use init::*;
pub use output::*;

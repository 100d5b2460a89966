//! Error types for LSM light streams

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Core LSM errors
#[derive(Error, Debug)]
pub enum LsmError {
    // Stream errors
    #[error("Init descriptor truncated: expected {expected} bytes, got {actual}")]
    TruncatedDescriptor { expected: usize, actual: usize },

    #[error("Stream metadata not yet available")]
    MetadataNotYetAvailable,

    #[error("Unsupported stream: {0}")]
    UnsupportedStream(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Invalid output format: {0}")]
    InvalidOutputFormat(String),

    // Engine errors
    #[error("Engine configuration path is not set")]
    ConfigMissing,

    #[error("Engine configuration {path:?} could not be read")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Engine construction failed")]
    EngineConstructionFailed,

    #[error("Engine is already open")]
    EngineAlreadyOpen,

    #[error("Engine is not open")]
    EngineNotOpen,

    #[error("Output buffer too small: required {required}, got {actual}")]
    OutputBufferTooSmall { required: usize, actual: usize },

    // Configuration errors
    #[error("Too many personalization zones: {requested} given, capacity {capacity}")]
    ZoneCapacityExceeded { requested: usize, capacity: usize },

    #[error("Invalid property value: {0}")]
    InvalidProperty(String),
}

impl LsmError {
    /// Whether the error leaves the stream instance unusable until corrected externally
    pub fn is_fatal_to_instance(&self) -> bool {
        matches!(
            self,
            LsmError::TruncatedDescriptor { .. }
                | LsmError::MetadataNotYetAvailable
                | LsmError::UnsupportedStream(_)
                | LsmError::ConfigMissing
                | LsmError::ConfigUnreadable { .. }
                | LsmError::EngineConstructionFailed
                | LsmError::EngineNotOpen
        )
    }
}

/// Result type for LSM operations
pub type LsmResult<T> = Result<T, LsmError>;

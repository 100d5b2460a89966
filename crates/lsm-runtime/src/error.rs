//! Runtime error types

use std::io;
use std::path::PathBuf;

use lsm_core::LsmError;
use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Lsm(#[from] LsmError),

    #[error("Pipeline configuration {path:?} could not be read")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Pipeline configuration is malformed: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Frame queue full ({capacity} frames)")]
    QueueFull { capacity: usize },
}

impl PipelineError {
    /// Whether the pipeline must be reconfigured before it can render again
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Lsm(e) => e.is_fatal_to_instance(),
            PipelineError::ConfigIo { .. } | PipelineError::ConfigParse(_) => true,
            PipelineError::QueueFull { .. } => false,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

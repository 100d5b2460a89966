//! Stream-level init metadata
//!
//! Parsed exactly once per stream from the out-of-band init descriptor and
//! immutable afterwards. A different descriptor means a new stream instance.

use std::time::Duration;

use crate::{LsmError, LsmResult};

/// Accepted LSM stream description
pub struct StreamCaps;

impl StreamCaps {
    /// Media type of a parsed LSM stream
    pub const MEDIA_TYPE: &'static str = "application/x-lsm";
    /// Supported format versions
    pub const VERSIONS: &'static [u8] = &[0];
    /// Supported frame periods in microseconds
    pub const FRAME_PERIODS_US: &'static [u64] = &[40_000];
    /// Smallest declared object bound
    pub const MIN_OBJECTS: u8 = 1;
    /// Supported color spaces
    pub const COLOR_SPACES: &'static [u8] = &[0, 1];
}

/// Stream init metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamInitMetadata {
    /// LSM format version
    pub format_version: u8,
    /// Frame period as carried in the descriptor (milliseconds)
    pub frame_period_ms: u32,
    /// Frame period in microseconds (`frame_period_ms * 1000`)
    pub frame_period_us: u64,
    /// Maximum number of objects any frame may carry
    pub max_objects: u8,
    /// Color space identifier
    pub color_space: u8,
}

impl StreamInitMetadata {
    pub fn new(format_version: u8, frame_period_ms: u32, max_objects: u8, color_space: u8) -> Self {
        StreamInitMetadata {
            format_version,
            frame_period_ms,
            frame_period_us: u64::from(frame_period_ms) * 1000,
            max_objects,
            color_space,
        }
    }

    /// Frame rate as a `(numerator, denominator)` fraction in frames per second
    pub fn frame_rate(&self) -> (u32, u32) {
        (1000, self.frame_period_ms)
    }

    /// Duration of one frame period
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(self.frame_period_us)
    }

    /// Check the metadata against the accepted stream description
    pub fn check_supported(&self) -> LsmResult<()> {
        if !StreamCaps::VERSIONS.contains(&self.format_version) {
            return Err(LsmError::UnsupportedStream(format!(
                "format version {}",
                self.format_version
            )));
        }
        if !StreamCaps::FRAME_PERIODS_US.contains(&self.frame_period_us) {
            return Err(LsmError::UnsupportedStream(format!(
                "frame period {} us",
                self.frame_period_us
            )));
        }
        if self.max_objects < StreamCaps::MIN_OBJECTS {
            return Err(LsmError::UnsupportedStream(format!(
                "max objects {}",
                self.max_objects
            )));
        }
        if !StreamCaps::COLOR_SPACES.contains(&self.color_space) {
            return Err(LsmError::UnsupportedStream(format!(
                "color space {}",
                self.color_space
            )));
        }
        Ok(())
    }
}

//! LSM framer - validates a frame stream against its init metadata
//!
//! State machine:
//! - `AwaitingMetadata`: every classification request fails
//! - `Ready`: frames are classified against the fixed metadata
//!
//! The framer never revises metadata within a stream instance; a changed
//! descriptor starts a new instance.

use bytes::Bytes;
use lsm_core::{LsmError, LsmResult, StreamInitMetadata};
use tracing::{error, info, trace, warn};

use crate::{classify_frame, parse_init_metadata, DropReason, FrameDecision};

/// Framer state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FramerState {
    AwaitingMetadata,
    Ready {
        metadata: StreamInitMetadata,
        descriptor: Bytes,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FramerStats {
    pub frames_emitted: u64,
    pub skip_frames: u64,
    pub frames_dropped: u64,
    pub object_count_drops: u64,
    pub rejected_before_metadata: u64,
}

/// Stream framer
#[derive(Debug)]
pub struct LsmFramer {
    state: FramerState,
    stats: FramerStats,
}

impl LsmFramer {
    pub fn new() -> Self {
        LsmFramer {
            state: FramerState::AwaitingMetadata,
            stats: FramerStats::default(),
        }
    }

    /// Reset for a new stream
    pub fn start(&mut self) {
        trace!("framer start");
        self.state = FramerState::AwaitingMetadata;
        self.stats = FramerStats::default();
    }

    pub fn stop(&mut self) {
        trace!("framer stop");
        self.state = FramerState::AwaitingMetadata;
    }

    pub fn state(&self) -> &FramerState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, FramerState::Ready { .. })
    }

    pub fn metadata(&self) -> Option<&StreamInitMetadata> {
        match &self.state {
            FramerState::Ready { metadata, .. } => Some(metadata),
            FramerState::AwaitingMetadata => None,
        }
    }

    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Supply the out-of-band descriptor
    ///
    /// Re-sending the current descriptor is a no-op. A different descriptor
    /// is parsed as a new stream instance; if it is malformed the framer
    /// falls back to `AwaitingMetadata`.
    pub fn set_descriptor(&mut self, descriptor: &[u8]) -> LsmResult<StreamInitMetadata> {
        if let FramerState::Ready {
            metadata,
            descriptor: current,
        } = &self.state
        {
            if current.as_ref() == descriptor {
                return Ok(*metadata);
            }
            info!("init descriptor changed, starting new stream instance");
        }

        match parse_init_metadata(descriptor) {
            Ok(metadata) => {
                info!(
                    max_objects = metadata.max_objects,
                    frame_period_us = metadata.frame_period_us,
                    "LSM stream metadata ready"
                );
                self.state = FramerState::Ready {
                    metadata,
                    descriptor: Bytes::copy_from_slice(descriptor),
                };
                Ok(metadata)
            }
            Err(e) => {
                error!(error = %e, "init descriptor is not big enough for LSM");
                self.state = FramerState::AwaitingMetadata;
                Err(e)
            }
        }
    }

    /// Classify one frame buffer
    pub fn classify(&mut self, buf: Bytes) -> LsmResult<FrameDecision> {
        let Some(metadata) = self.metadata().copied() else {
            self.stats.rejected_before_metadata += 1;
            error!("no valid metadata found to initialise LSM stream");
            return Err(LsmError::MetadataNotYetAvailable);
        };

        let len = buf.len();
        let decision = classify_frame(&metadata, buf);

        match &decision {
            FrameDecision::Emit(frame) if frame.is_skip => {
                self.stats.frames_emitted += 1;
                self.stats.skip_frames += 1;
                trace!(len, "found LSM skip frame");
            }
            FrameDecision::Emit(frame) => {
                self.stats.frames_emitted += 1;
                trace!(len, num_objects = ?frame.num_objects, "found LSM frame");
            }
            FrameDecision::Drop(reason) => {
                self.stats.frames_dropped += 1;
                if matches!(reason, DropReason::ObjectCountExceeded { .. }) {
                    self.stats.object_count_drops += 1;
                }
                warn!(len, %reason, "dropping LSM frame");
            }
        }

        Ok(decision)
    }
}

impl Default for LsmFramer {
    fn default() -> Self {
        LsmFramer::new()
    }
}

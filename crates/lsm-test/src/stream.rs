//! Seeded LSM frame stream generation
//!
//! Produces frame buffers together with the decision the framer is expected
//! to reach for each one. The mix of skip, oversized, empty and truncated
//! frames is set by a [`StreamProfile`].

use bytes::Bytes;
use lsm_core::StreamInitMetadata;
use lsm_wire::{DropReason, Frame, FrameBuilder, FrameDecision};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mix of frame kinds in a generated stream
#[derive(Clone, Debug)]
pub struct StreamProfile {
    /// Probability of a skip frame
    pub skip_prob: f64,
    /// Probability of an object count above the stream bound
    pub oversize_prob: f64,
    /// Probability of an empty buffer
    pub empty_prob: f64,
    /// Probability of a non-skip buffer cut before its object count
    pub truncated_prob: f64,
    /// Largest object payload in bytes
    pub max_payload: usize,
}

impl Default for StreamProfile {
    fn default() -> Self {
        StreamProfile {
            skip_prob: 0.1,
            oversize_prob: 0.05,
            empty_prob: 0.0,
            truncated_prob: 0.0,
            max_payload: 64,
        }
    }
}

impl StreamProfile {
    /// Only valid frames
    pub fn clean() -> Self {
        StreamProfile {
            skip_prob: 0.0,
            oversize_prob: 0.0,
            ..StreamProfile::default()
        }
    }

    pub fn noisy() -> Self {
        StreamProfile {
            skip_prob: 0.2,
            oversize_prob: 0.2,
            empty_prob: 0.02,
            truncated_prob: 0.02,
            max_payload: 128,
        }
    }

    /// Mostly malformed input
    pub fn hostile() -> Self {
        StreamProfile {
            skip_prob: 0.15,
            oversize_prob: 0.4,
            empty_prob: 0.1,
            truncated_prob: 0.1,
            max_payload: 512,
        }
    }
}

/// A frame buffer and the expected framer decision
#[derive(Clone, Debug)]
pub struct GeneratedFrame {
    pub bytes: Bytes,
    pub expected: FrameDecision,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    pub generated: u64,
    pub valid: u64,
    pub skip: u64,
    pub oversized: u64,
    pub empty: u64,
    pub truncated: u64,
}

impl GeneratorStats {
    /// Frames expected to be emitted
    pub fn expected_emits(&self) -> u64 {
        self.valid + self.skip
    }

    pub fn expected_drops(&self) -> u64 {
        self.oversized + self.empty + self.truncated
    }
}

/// Seeded frame stream generator
pub struct StreamGenerator {
    metadata: StreamInitMetadata,
    profile: StreamProfile,
    rng: StdRng,
    stats: GeneratorStats,
}

impl StreamGenerator {
    pub fn new(metadata: StreamInitMetadata, profile: StreamProfile, seed: u64) -> Self {
        StreamGenerator {
            metadata,
            profile,
            rng: StdRng::seed_from_u64(seed),
            stats: GeneratorStats::default(),
        }
    }

    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    pub fn next_frame(&mut self) -> GeneratedFrame {
        self.stats.generated += 1;
        let profile = &self.profile;
        let roll: f64 = self.rng.gen();

        let mut threshold = profile.empty_prob;
        if roll < threshold {
            self.stats.empty += 1;
            return GeneratedFrame {
                bytes: Bytes::new(),
                expected: FrameDecision::Drop(DropReason::EmptyFrame),
            };
        }

        threshold += profile.truncated_prob;
        if roll < threshold {
            self.stats.truncated += 1;
            return GeneratedFrame {
                bytes: Bytes::from_static(&[0x00]),
                expected: FrameDecision::Drop(DropReason::Truncated { len: 1 }),
            };
        }

        threshold += profile.skip_prob;
        if roll < threshold {
            self.stats.skip += 1;
            // Anything after the skip flag is ignored
            let tail_len = self.rng.gen_range(0..4);
            let mut bytes = FrameBuilder::new().skip().build().to_vec();
            bytes.extend((0..tail_len).map(|_| self.rng.gen::<u8>()));
            return GeneratedFrame {
                bytes: Bytes::from(bytes),
                expected: FrameDecision::Emit(Frame::skip()),
            };
        }

        let max = self.metadata.max_objects;
        threshold += profile.oversize_prob;
        if roll < threshold && max < u8::MAX {
            self.stats.oversized += 1;
            let found = self.rng.gen_range(max + 1..=u8::MAX);
            return GeneratedFrame {
                bytes: self.object_frame(found),
                expected: FrameDecision::Drop(DropReason::ObjectCountExceeded { found, max }),
            };
        }

        self.stats.valid += 1;
        let num_objects = self.rng.gen_range(0..=max);
        let bytes = self.object_frame(num_objects);
        GeneratedFrame {
            expected: FrameDecision::Emit(Frame::objects(num_objects, bytes.clone())),
            bytes,
        }
    }

    /// Generate `count` frames
    pub fn take(&mut self, count: usize) -> Vec<GeneratedFrame> {
        (0..count).map(|_| self.next_frame()).collect()
    }

    fn object_frame(&mut self, num_objects: u8) -> Bytes {
        let len = self.rng.gen_range(0..=self.profile.max_payload);
        let payload: Vec<u8> = (0..len).map(|_| self.rng.gen()).collect();
        FrameBuilder::new()
            .num_objects(num_objects)
            .payload(payload)
            .build()
    }
}

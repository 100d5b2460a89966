//! LSM frame classification
//!
//! Frame = Skip flag (1 byte) + [Object count (1 byte) if not skip] + Payload
//!
//! Object records inside the payload are opaque here; only the object count
//! is validated against the stream metadata.

use bytes::{BufMut, Bytes, BytesMut};
use lsm_core::StreamInitMetadata;
use thiserror::Error;

use crate::FrameCursor;

/// A validated frame ready for rendering
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// No light update for this period
    pub is_skip: bool,
    /// Declared object count (absent on skip frames)
    pub num_objects: Option<u8>,
    /// Bytes handed to the engine; empty for skip frames
    pub payload: Bytes,
}

impl Frame {
    pub fn skip() -> Self {
        Frame {
            is_skip: true,
            num_objects: None,
            payload: Bytes::new(),
        }
    }

    pub fn objects(num_objects: u8, payload: Bytes) -> Self {
        Frame {
            is_skip: false,
            num_objects: Some(num_objects),
            payload,
        }
    }

    /// Whether rendering this frame produces no output
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Why a frame was dropped
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    #[error("frame contains {found} objects, header indicated max {max} objects")]
    ObjectCountExceeded { found: u8, max: u8 },

    #[error("empty frame buffer")]
    EmptyFrame,

    #[error("frame truncated before object count ({len} bytes)")]
    Truncated { len: usize },
}

/// Outcome of classifying one buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameDecision {
    Emit(Frame),
    Drop(DropReason),
}

impl FrameDecision {
    pub fn is_emit(&self) -> bool {
        matches!(self, FrameDecision::Emit(_))
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            FrameDecision::Emit(frame) => Some(frame),
            FrameDecision::Drop(_) => None,
        }
    }
}

/// Classify a frame buffer against the stream metadata
///
/// Stateless: the decision depends only on `metadata` and `buf`.
pub fn classify_frame(metadata: &StreamInitMetadata, buf: Bytes) -> FrameDecision {
    let mut cursor = FrameCursor::new(&buf);

    let Ok(skip_flag) = cursor.read_u8() else {
        return FrameDecision::Drop(DropReason::EmptyFrame);
    };

    if skip_flag != 0 {
        return FrameDecision::Emit(Frame::skip());
    }

    let Ok(num_objects) = cursor.read_u8() else {
        return FrameDecision::Drop(DropReason::Truncated { len: buf.len() });
    };

    if num_objects > metadata.max_objects {
        return FrameDecision::Drop(DropReason::ObjectCountExceeded {
            found: num_objects,
            max: metadata.max_objects,
        });
    }

    FrameDecision::Emit(Frame::objects(num_objects, buf))
}

/// Builder for encoded frame buffers
#[derive(Clone, Debug, Default)]
pub struct FrameBuilder {
    skip: bool,
    num_objects: u8,
    payload: Vec<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        FrameBuilder::default()
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn num_objects(mut self, num_objects: u8) -> Self {
        self.num_objects = num_objects;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + self.payload.len());
        if self.skip {
            buf.put_u8(1);
        } else {
            buf.put_u8(0);
            buf.put_u8(self.num_objects);
        }
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

//! Init descriptor (URI init box) for LSM streams
//!
//! The descriptor is 19 bytes:
//! - Bytes 0-11: Reserved
//! - Byte 12: Format version
//! - Bytes 13-16: Frame period in milliseconds (BE)
//! - Byte 17: Max objects per frame
//! - Byte 18: Color space

use lsm_core::{LsmError, LsmResult, StreamInitMetadata};
use tracing::debug;

use crate::FrameCursor;

/// Reserved prefix ahead of the descriptor fields
pub const INIT_BOX_RESERVED: usize = 12;

/// Minimum descriptor size in bytes
pub const INIT_BOX_SIZE: usize = INIT_BOX_RESERVED + 7;

/// Raw init descriptor fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitBox {
    pub version: u8,
    pub frame_period_ms: u32,
    pub max_objects: u8,
    pub color_space: u8,
}

impl InitBox {
    /// Parse the descriptor; trailing bytes past the last field are ignored
    pub fn parse(buf: &[u8]) -> LsmResult<Self> {
        let truncated = |_| LsmError::TruncatedDescriptor {
            expected: INIT_BOX_SIZE,
            actual: buf.len(),
        };

        let mut cursor = FrameCursor::new(buf);
        cursor.skip(INIT_BOX_RESERVED).map_err(truncated)?;

        let version = cursor.read_u8().map_err(truncated)?;
        let frame_period_ms = cursor.read_u32_be().map_err(truncated)?;
        let max_objects = cursor.read_u8().map_err(truncated)?;
        let color_space = cursor.read_u8().map_err(truncated)?;

        Ok(InitBox {
            version,
            frame_period_ms,
            max_objects,
            color_space,
        })
    }

    /// Serialize into `buf` with a zeroed reserved prefix
    pub fn serialize(&self, buf: &mut [u8]) -> LsmResult<()> {
        if buf.len() < INIT_BOX_SIZE {
            return Err(LsmError::BufferTooShort {
                expected: INIT_BOX_SIZE,
                actual: buf.len(),
            });
        }

        buf[..INIT_BOX_SIZE].copy_from_slice(&self.to_bytes());
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; INIT_BOX_SIZE] {
        let mut buf = [0u8; INIT_BOX_SIZE];
        buf[12] = self.version;
        buf[13..17].copy_from_slice(&self.frame_period_ms.to_be_bytes());
        buf[17] = self.max_objects;
        buf[18] = self.color_space;
        buf
    }

    pub fn into_metadata(self) -> StreamInitMetadata {
        StreamInitMetadata::new(
            self.version,
            self.frame_period_ms,
            self.max_objects,
            self.color_space,
        )
    }
}

impl From<&StreamInitMetadata> for InitBox {
    fn from(meta: &StreamInitMetadata) -> Self {
        InitBox {
            version: meta.format_version,
            frame_period_ms: meta.frame_period_ms,
            max_objects: meta.max_objects,
            color_space: meta.color_space,
        }
    }
}

/// Parse stream init metadata from an out-of-band descriptor
pub fn parse_init_metadata(descriptor: &[u8]) -> LsmResult<StreamInitMetadata> {
    let init = InitBox::parse(descriptor)?;
    let meta = init.into_metadata();

    debug!(
        version = meta.format_version,
        max_objects = meta.max_objects,
        color_space = meta.color_space,
        frame_period_ms = meta.frame_period_ms,
        frame_period_us = meta.frame_period_us,
        "parsed LSM init descriptor"
    );

    Ok(meta)
}

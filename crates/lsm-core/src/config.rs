//! Renderer configuration and engine-facing constants

use bytes::Bytes;

use crate::{LsmError, LsmResult, StreamInitMetadata};

/// Number of personalization zones the engine accepts
pub const MAX_NUM_PERSONALIZATION_ZONES: usize = 16;

/// Metadata frames rendered per processing call (fixed)
pub const MAX_NUM_MD: usize = 1;

/// Media type of rendered light output
pub const OUTPUT_MEDIA_TYPE: &str = "application/x-lights";

/// Output layout produced by the engine
pub const OUTPUT_FORMAT: &str = "DLB";

/// Configuration used to construct a light engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Serialized engine configuration (whole file contents)
    pub config_blob: Bytes,
    /// Stream color space
    pub color_space: u8,
    /// Maximum objects per frame
    pub max_num_objs: u8,
    /// Metadata frames per call, always [`MAX_NUM_MD`]
    pub max_num_md: usize,
    /// Frame period in microseconds
    pub frame_period_us: u32,
}

impl RendererConfig {
    /// Combine a configuration blob with negotiated stream metadata
    pub fn new(config_blob: Bytes, metadata: &StreamInitMetadata) -> LsmResult<Self> {
        let frame_period_us = u32::try_from(metadata.frame_period_us).map_err(|_| {
            LsmError::UnsupportedStream(format!(
                "frame period {} us does not fit the engine",
                metadata.frame_period_us
            ))
        })?;

        Ok(RendererConfig {
            config_blob,
            color_space: metadata.color_space,
            max_num_objs: metadata.max_objects,
            max_num_md: MAX_NUM_MD,
            frame_period_us,
        })
    }

    pub fn blob_len(&self) -> usize {
        self.config_blob.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_metadata() {
        let meta = StreamInitMetadata::new(0, 40, 4, 1);
        let config = RendererConfig::new(Bytes::from_static(b"conf"), &meta).unwrap();

        assert_eq!(config.frame_period_us, 40_000);
        assert_eq!(config.max_num_objs, 4);
        assert_eq!(config.color_space, 1);
        assert_eq!(config.max_num_md, 1);
        assert_eq!(config.blob_len(), 4);
    }

    #[test]
    fn test_config_rejects_huge_period() {
        let meta = StreamInitMetadata::new(0, u32::MAX, 4, 0);
        let result = RendererConfig::new(Bytes::from_static(b"conf"), &meta);
        assert!(matches!(result, Err(LsmError::UnsupportedStream(_))));
    }
}

//! Pipeline configuration
//!
//! Loaded from a JSON file. Every field is optional; missing fields take the
//! element defaults.

use std::path::{Path, PathBuf};

use lsm_core::LsmResult;
use lsm_render::{Property, RenderElement, DEFAULT_LIGHTNESS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{LogFormat, PipelineError, PipelineResult};

/// Default bound of the frame queue between framer and element
pub const DEFAULT_MAX_QUEUED_FRAMES: usize = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path of the serialized engine configuration
    pub engine_config: Option<PathBuf>,
    pub lightness: f32,
    /// Zone immersion levels in percent
    pub zone_immersion_levels: Vec<i32>,
    /// Zone low immersion flags (0 or 1)
    pub zone_low_immersion: Vec<i32>,
    /// Hand the first rendered frame to the sink during preroll
    pub show_preroll_frame: bool,
    pub max_queued_frames: usize,
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            engine_config: None,
            lightness: DEFAULT_LIGHTNESS,
            zone_immersion_levels: Vec::new(),
            zone_low_immersion: Vec::new(),
            show_preroll_frame: true,
            max_queued_frames: DEFAULT_MAX_QUEUED_FRAMES,
            log_format: LogFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), "pipeline configuration loaded");
        Ok(config)
    }

    pub fn from_json(text: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Element property writes described by this configuration
    pub fn properties(&self) -> Vec<Property> {
        let mut properties = Vec::with_capacity(4);
        if let Some(path) = &self.engine_config {
            properties.push(Property::Config(path.clone()));
        }
        properties.push(Property::Lightness(self.lightness));
        if !self.zone_immersion_levels.is_empty() {
            properties.push(Property::ZoneImmersionLevels(
                self.zone_immersion_levels.clone(),
            ));
        }
        if !self.zone_low_immersion.is_empty() {
            properties.push(Property::ZoneLowImmersion(self.zone_low_immersion.clone()));
        }
        properties
    }

    /// Write every property to `element`, stopping at the first rejection
    pub fn apply(&self, element: &RenderElement) -> LsmResult<()> {
        for property in self.properties() {
            element.set_property(property)?;
        }
        Ok(())
    }
}

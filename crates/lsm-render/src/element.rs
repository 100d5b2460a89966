//! Render element - engine lifecycle and personalization behind one lock
//!
//! Every property write, stream negotiation and frame render takes the same
//! exclusive lock for its full duration. A frame is never processed against
//! a half-replaced engine and a property write is never observed mid-frame.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use lsm_core::{LsmError, LsmResult, RendererConfig, StreamInitMetadata};
use lsm_wire::Frame;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    load_config_blob, transform, EngineLifecycle, PersonalizationState, ProcessOutcome,
    RendererFactory,
};

/// Configurable element properties
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Config,
    Lightness,
    ZoneImmersionLevels,
    ZoneLowImmersion,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 4] = [
        PropertyKind::Config,
        PropertyKind::Lightness,
        PropertyKind::ZoneImmersionLevels,
        PropertyKind::ZoneLowImmersion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PropertyKind::Config => "config",
            PropertyKind::Lightness => "lightness",
            PropertyKind::ZoneImmersionLevels => "zone-immersion-levels",
            PropertyKind::ZoneLowImmersion => "zone-low-immersions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        PropertyKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A property write
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    /// Path of the serialized engine configuration
    Config(PathBuf),
    /// Global lightness in [0, 1]
    Lightness(f32),
    /// Zone immersion levels in percent (0-100)
    ZoneImmersionLevels(Vec<i32>),
    /// Zone low immersion flags (0 = high, 1 = low)
    ZoneLowImmersion(Vec<i32>),
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::Config(_) => PropertyKind::Config,
            Property::Lightness(_) => PropertyKind::Lightness,
            Property::ZoneImmersionLevels(_) => PropertyKind::ZoneImmersionLevels,
            Property::ZoneLowImmersion(_) => PropertyKind::ZoneLowImmersion,
        }
    }
}

/// A property read
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Config(Option<PathBuf>),
    Lightness(f32),
    ZoneImmersionLevels(Vec<i32>),
    ZoneLowImmersion(Vec<i32>),
}

/// What a successful property write requires of the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyEffect {
    Applied,
    /// The engine was restarted; output capacity must be re-queried downstream
    Renegotiate,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementStats {
    pub frames_rendered: u64,
    pub no_output_frames: u64,
    pub bytes_produced: u64,
    pub restarts: u64,
    pub failed_opens: u64,
}

struct ElementState {
    lifecycle: EngineLifecycle,
    personalization: PersonalizationState,
    config_path: Option<PathBuf>,
    stream: Option<StreamInitMetadata>,
    stats: ElementStats,
}

impl ElementState {
    fn build_config(&self) -> LsmResult<RendererConfig> {
        let Some(path) = self.config_path.as_deref() else {
            error!("config property cannot be empty");
            return Err(LsmError::ConfigMissing);
        };
        let stream = self.stream.ok_or(LsmError::MetadataNotYetAvailable)?;
        let blob = load_config_blob(path)?;
        RendererConfig::new(blob, &stream)
    }

    fn open_engine(&mut self) -> LsmResult<()> {
        let result = self
            .build_config()
            .and_then(|config| self.lifecycle.open(config).map(|_| ()));
        if result.is_err() {
            self.stats.failed_opens += 1;
            self.lifecycle.close();
        }
        result
    }

    fn restart_engine(&mut self) -> LsmResult<()> {
        let result = match self.build_config() {
            Ok(config) => self.lifecycle.restart(config).map(|_| ()),
            Err(e) => {
                self.lifecycle.close();
                Err(e)
            }
        };
        match &result {
            Ok(()) => self.stats.restarts += 1,
            Err(e) => {
                self.stats.failed_opens += 1;
                error!(error = %e, "engine restart failed, element closed");
            }
        }
        result
    }
}

/// Lock-guarded light renderer element
pub struct RenderElement {
    state: Mutex<ElementState>,
}

impl RenderElement {
    pub fn new(factory: Arc<dyn RendererFactory>) -> Self {
        RenderElement {
            state: Mutex::new(ElementState {
                lifecycle: EngineLifecycle::new(factory),
                personalization: PersonalizationState::new(),
                config_path: None,
                stream: None,
                stats: ElementStats::default(),
            }),
        }
    }

    /// Apply a property write
    ///
    /// Changing the configuration path while the engine is open restarts the
    /// engine under the lock. If that restart fails the element is closed.
    pub fn set_property(&self, property: Property) -> LsmResult<PropertyEffect> {
        debug!(property = property.kind().name(), "set_property");
        let mut state = self.state.lock();

        match property {
            Property::Config(path) => {
                state.config_path = Some(path);
                if state.lifecycle.is_open() {
                    state.restart_engine()?;
                    return Ok(PropertyEffect::Renegotiate);
                }
            }
            Property::Lightness(lightness) => state.personalization.set_lightness(lightness)?,
            Property::ZoneImmersionLevels(levels) => {
                state.personalization.set_zone_immersion_levels(&levels)?
            }
            Property::ZoneLowImmersion(flags) => {
                state.personalization.set_zone_low_immersion(&flags)?
            }
        }

        Ok(PropertyEffect::Applied)
    }

    pub fn get_property(&self, kind: PropertyKind) -> PropertyValue {
        let state = self.state.lock();
        match kind {
            PropertyKind::Config => PropertyValue::Config(state.config_path.clone()),
            PropertyKind::Lightness => PropertyValue::Lightness(state.personalization.lightness()),
            PropertyKind::ZoneImmersionLevels => {
                PropertyValue::ZoneImmersionLevels(state.personalization.zone_immersion_levels())
            }
            PropertyKind::ZoneLowImmersion => {
                PropertyValue::ZoneLowImmersion(state.personalization.zone_low_immersion_flags())
            }
        }
    }

    /// Negotiate the input stream and open the engine
    ///
    /// With the engine already open, a different stream restarts it; the
    /// same stream is a no-op.
    pub fn set_stream(&self, metadata: StreamInitMetadata) -> LsmResult<()> {
        if let Err(e) = metadata.check_supported() {
            error!(error = %e, "input stream does not match the supported description");
            return Err(e);
        }

        let mut state = self.state.lock();
        let changed = state.stream != Some(metadata);
        state.stream = Some(metadata);

        if !state.lifecycle.is_open() {
            return state.open_engine();
        }
        if changed {
            info!("input stream changed while open");
            return state.restart_engine();
        }
        Ok(())
    }

    pub fn stream(&self) -> Option<StreamInitMetadata> {
        self.state.lock().stream
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().lifecycle.is_open()
    }

    /// Output buffer capacity required per frame
    pub fn transform_size(&self) -> LsmResult<usize> {
        let state = self.state.lock();
        let handle = state.lifecycle.handle().ok_or(LsmError::EngineNotOpen)?;
        Ok(transform::required_output_capacity(handle))
    }

    /// Render a frame into a caller-provided buffer
    pub fn process(&self, frame: &Frame, out: &mut [u8]) -> LsmResult<ProcessOutcome> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(handle) = state.lifecycle.handle_mut() else {
            error!("frame received with no open engine");
            return Err(LsmError::EngineNotOpen);
        };
        let outcome = transform::process(handle, frame, &state.personalization, out)?;

        match outcome {
            ProcessOutcome::Output(n) => {
                state.stats.frames_rendered += 1;
                state.stats.bytes_produced += n as u64;
            }
            ProcessOutcome::NoOutput => state.stats.no_output_frames += 1,
        }
        Ok(outcome)
    }

    /// Render a frame into a buffer sized for the current engine
    ///
    /// Returns `None` when the frame produces no output.
    pub fn render(&self, frame: &Frame) -> LsmResult<Option<Bytes>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(handle) = state.lifecycle.handle_mut() else {
            error!("frame received with no open engine");
            return Err(LsmError::EngineNotOpen);
        };

        let mut out = BytesMut::zeroed(transform::required_output_capacity(handle));
        match transform::process(handle, frame, &state.personalization, &mut out)? {
            ProcessOutcome::Output(n) => {
                state.stats.frames_rendered += 1;
                state.stats.bytes_produced += n as u64;
                out.truncate(n);
                Ok(Some(out.freeze()))
            }
            ProcessOutcome::NoOutput => {
                state.stats.no_output_frames += 1;
                Ok(None)
            }
        }
    }

    /// Discard inter-frame engine state after a discontinuity
    pub fn flush(&self) {
        let mut state = self.state.lock();
        if state.lifecycle.is_open() {
            debug!("flushing light engine");
            state.lifecycle.reset();
        } else {
            warn!("flush with no open engine");
        }
    }

    pub fn start(&self) {
        debug!("start");
    }

    /// Close the engine and forget the negotiated stream
    pub fn stop(&self) {
        debug!("stop");
        let mut state = self.state.lock();
        state.lifecycle.close();
        state.stream = None;
    }

    pub fn stats(&self) -> ElementStats {
        self.state.lock().stats.clone()
    }

    /// Snapshot of the personalization parameters
    pub fn personalization(&self) -> PersonalizationState {
        self.state.lock().personalization.clone()
    }
}

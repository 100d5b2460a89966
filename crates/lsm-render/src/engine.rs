//! Light engine capability interface
//!
//! The engine is an opaque, stateful and non-reentrant renderer. The crate
//! reaches it only through [`RendererFactory`] (construct) and
//! [`LightRenderer`] (process, reset, max output size). Destruction is the
//! drop of the boxed renderer.

use std::fmt;

use lsm_core::{LsmError, LsmResult, RendererConfig, MAX_NUM_PERSONALIZATION_ZONES};
use tracing::{debug, error};

/// Personalization inputs for one processing call
#[derive(Clone, Copy, Debug)]
pub struct RenderParams<'a> {
    pub zone_immersion: &'a [f32; MAX_NUM_PERSONALIZATION_ZONES],
    pub zone_low_immersion: &'a [bool; MAX_NUM_PERSONALIZATION_ZONES],
    pub lightness: f32,
}

/// A constructed engine instance
pub trait LightRenderer: Send {
    /// Render `input` into `output`, returning the number of bytes written
    fn process(&mut self, input: &[u8], output: &mut [u8], params: &RenderParams<'_>) -> usize;

    /// Largest output a single call can produce
    fn max_output_size(&self) -> usize;

    /// Drop any inter-frame state
    fn reset(&mut self);
}

/// Engine constructor
pub trait RendererFactory: Send + Sync {
    /// Build an engine, or `None` if the engine rejects the configuration
    fn construct(&self, config: &RendererConfig) -> Option<Box<dyn LightRenderer>>;
}

/// Owned engine instance with its cached maximum output size
pub struct EngineHandle {
    renderer: Box<dyn LightRenderer>,
    max_output_size: usize,
}

impl EngineHandle {
    /// Construct an engine and cache its maximum output size
    pub fn construct(factory: &dyn RendererFactory, config: &RendererConfig) -> LsmResult<Self> {
        let renderer = factory.construct(config).ok_or_else(|| {
            error!("light engine could not be created");
            LsmError::EngineConstructionFailed
        })?;
        let max_output_size = renderer.max_output_size();
        debug!(max_output_size, "light engine constructed");

        Ok(EngineHandle {
            renderer,
            max_output_size,
        })
    }

    #[inline]
    pub fn max_output_size(&self) -> usize {
        self.max_output_size
    }

    /// Run the engine once; the result never exceeds `output.len()`
    pub fn process(&mut self, input: &[u8], output: &mut [u8], params: &RenderParams<'_>) -> usize {
        let written = self.renderer.process(input, output, params);
        if written > output.len() {
            error!(
                written,
                capacity = output.len(),
                "engine reported more output than capacity, clamping"
            );
            return output.len();
        }
        written
    }

    pub fn reset(&mut self) {
        self.renderer.reset();
    }

    /// Destroy the engine instance
    pub fn destroy(self) {
        debug!("destroying light engine");
        drop(self);
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("max_output_size", &self.max_output_size)
            .finish_non_exhaustive()
    }
}

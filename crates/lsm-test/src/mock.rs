//! Mock light engine
//!
//! Deterministic stand-in for the vendor engine. Each object in a frame is
//! rendered as one RGB strip in the light output layout:
//! - red   = lightness
//! - green = immersion level of the zone the strip falls in
//! - blue  = 255 for low immersion zones, 0 otherwise
//!
//! The maximum output size follows from the configured object bound, so a
//! restart with a different stream changes the negotiated capacity.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use lsm_core::{RendererConfig, MAX_NUM_PERSONALIZATION_ZONES};
use lsm_render::{LightRenderer, RenderParams, RendererFactory};
use lsm_wire::{LightArray, LightOutput, Rgb};
use parking_lot::Mutex;

/// Lights per rendered strip unless configured otherwise
pub const DEFAULT_LIGHTS_PER_STRIP: u16 = 4;

/// Parameters seen by the most recent `process` call
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedParams {
    pub lightness: f32,
    pub zone_immersion: [f32; MAX_NUM_PERSONALIZATION_ZONES],
    pub zone_low_immersion: [bool; MAX_NUM_PERSONALIZATION_ZONES],
}

#[derive(Default)]
struct MockState {
    constructed: AtomicUsize,
    destroyed: AtomicUsize,
    processed: AtomicUsize,
    resets: AtomicUsize,
    /// Constructions still scripted to fail
    fail_next: AtomicUsize,
    fail_blobs: Mutex<Vec<Bytes>>,
    configs: Mutex<Vec<RendererConfig>>,
    last_params: Mutex<Option<ObservedParams>>,
}

/// Factory for [`MockEngine`]s
///
/// Clones share counters and scripted failures.
#[derive(Clone)]
pub struct MockEngineFactory {
    lights_per_strip: u16,
    fixed_output_size: Option<usize>,
    state: Arc<MockState>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        MockEngineFactory {
            lights_per_strip: DEFAULT_LIGHTS_PER_STRIP,
            fixed_output_size: None,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn with_lights_per_strip(mut self, lights: u16) -> Self {
        self.lights_per_strip = lights;
        self
    }

    /// Report a fixed maximum output size regardless of configuration
    pub fn with_max_output_size(mut self, size: usize) -> Self {
        self.fixed_output_size = Some(size);
        self
    }

    /// Fail the next `count` constructions
    pub fn fail_next(&self, count: usize) {
        self.state.fail_next.store(count, Ordering::SeqCst);
    }

    /// Fail every construction with this configuration blob
    pub fn fail_on_blob(&self, blob: &[u8]) {
        self.state
            .fail_blobs
            .lock()
            .push(Bytes::copy_from_slice(blob));
    }

    pub fn clear_failures(&self) {
        self.state.fail_next.store(0, Ordering::SeqCst);
        self.state.fail_blobs.lock().clear();
    }

    pub fn constructed(&self) -> usize {
        self.state.constructed.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.state.destroyed.load(Ordering::SeqCst)
    }

    /// Engines currently alive
    pub fn live(&self) -> usize {
        self.constructed() - self.destroyed()
    }

    pub fn processed(&self) -> usize {
        self.state.processed.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.state.resets.load(Ordering::SeqCst)
    }

    /// Every configuration offered to `construct`, in order
    pub fn configs(&self) -> Vec<RendererConfig> {
        self.state.configs.lock().clone()
    }

    pub fn last_params(&self) -> Option<ObservedParams> {
        self.state.last_params.lock().clone()
    }

    /// Maximum output size an engine built from `config` reports
    pub fn output_size_for(&self, config: &RendererConfig) -> usize {
        self.fixed_output_size
            .unwrap_or_else(|| max_output_size(config.max_num_objs, self.lights_per_strip))
    }

    fn should_fail(&self, config: &RendererConfig) -> bool {
        let scripted = self
            .state
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        scripted
            || self
                .state
                .fail_blobs
                .lock()
                .iter()
                .any(|blob| blob == &config.config_blob)
    }
}

impl Default for MockEngineFactory {
    fn default() -> Self {
        MockEngineFactory::new()
    }
}

impl RendererFactory for MockEngineFactory {
    fn construct(&self, config: &RendererConfig) -> Option<Box<dyn LightRenderer>> {
        self.state.configs.lock().push(config.clone());
        if self.should_fail(config) {
            return None;
        }

        self.state.constructed.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MockEngine {
            lights_per_strip: self.lights_per_strip,
            max_output_size: self.output_size_for(config),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Output size for `max_objects` strips of `lights_per_strip` RGB lights
pub fn max_output_size(max_objects: u8, lights_per_strip: u16) -> usize {
    2 + usize::from(max_objects) * (4 + 3 * usize::from(lights_per_strip))
}

/// Light output the mock engine produces for a frame with `num_objects`
pub fn mock_render(num_objects: u8, lights_per_strip: u16, params: &RenderParams<'_>) -> LightOutput {
    let arrays = (0..num_objects)
        .map(|strip| {
            let zone = usize::from(strip) % MAX_NUM_PERSONALIZATION_ZONES;
            let light = Rgb::new(
                to_channel(params.lightness),
                to_channel(params.zone_immersion[zone]),
                if params.zone_low_immersion[zone] { 255 } else { 0 },
            );
            LightArray::rgb(strip, vec![light; usize::from(lights_per_strip)])
        })
        .collect();
    LightOutput::new(arrays)
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Deterministic engine created by [`MockEngineFactory`]
pub struct MockEngine {
    lights_per_strip: u16,
    max_output_size: usize,
    state: Arc<MockState>,
}

impl LightRenderer for MockEngine {
    fn process(&mut self, input: &[u8], output: &mut [u8], params: &RenderParams<'_>) -> usize {
        self.state.processed.fetch_add(1, Ordering::SeqCst);
        *self.state.last_params.lock() = Some(ObservedParams {
            lightness: params.lightness,
            zone_immersion: *params.zone_immersion,
            zone_low_immersion: *params.zone_low_immersion,
        });

        // Input is a full non-skip frame: skip flag, object count, objects
        let num_objects = input.get(1).copied().unwrap_or(0);
        let limit = output.len().min(self.max_output_size);
        mock_render(num_objects, self.lights_per_strip, params)
            .write_to(&mut output[..limit])
            .unwrap_or(0)
    }

    fn max_output_size(&self) -> usize {
        self.max_output_size
    }

    fn reset(&mut self) {
        self.state.resets.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.state.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

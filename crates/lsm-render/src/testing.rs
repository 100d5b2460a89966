//! In-crate engine double for unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use lsm_core::{RendererConfig, StreamInitMetadata, MAX_NUM_PERSONALIZATION_ZONES};
use parking_lot::Mutex;

use crate::{LightRenderer, RenderParams, RendererFactory};

#[derive(Default)]
struct FakeState {
    constructed: AtomicUsize,
    destroyed: AtomicUsize,
    processed: AtomicUsize,
    resets: AtomicUsize,
    always_fail: AtomicBool,
    overreport: AtomicBool,
    fail_blob: Mutex<Option<Bytes>>,
    last_config: Mutex<Option<RendererConfig>>,
}

/// Factory handing out [`FakeRenderer`]s; clones share counters
#[derive(Clone)]
pub struct FakeFactory {
    max_output_size: usize,
    state: Arc<FakeState>,
}

impl FakeFactory {
    pub fn new(max_output_size: usize) -> Self {
        FakeFactory {
            max_output_size,
            state: Arc::new(FakeState::default()),
        }
    }

    pub fn failing() -> Self {
        let factory = FakeFactory::new(16);
        factory.set_failing(true);
        factory
    }

    pub fn overreporting(self) -> Self {
        self.state.overreport.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Reject any configuration whose blob equals `blob`
    pub fn fail_on_blob(&self, blob: &[u8]) {
        *self.state.fail_blob.lock() = Some(Bytes::copy_from_slice(blob));
    }

    pub fn constructed(&self) -> usize {
        self.state.constructed.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.state.destroyed.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> usize {
        self.state.processed.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.state.resets.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<RendererConfig> {
        self.state.last_config.lock().clone()
    }

    pub fn live(&self) -> usize {
        self.constructed() - self.destroyed()
    }
}

impl RendererFactory for FakeFactory {
    fn construct(&self, config: &RendererConfig) -> Option<Box<dyn LightRenderer>> {
        *self.state.last_config.lock() = Some(config.clone());
        if self.state.always_fail.load(Ordering::SeqCst) {
            return None;
        }
        if self.state.fail_blob.lock().as_ref() == Some(&config.config_blob) {
            return None;
        }
        self.state.constructed.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(FakeRenderer {
            max_output_size: self.max_output_size,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Writes `[lightness%, zone0%, low0, input...]` truncated to capacity
pub struct FakeRenderer {
    max_output_size: usize,
    state: Arc<FakeState>,
}

impl LightRenderer for FakeRenderer {
    fn process(&mut self, input: &[u8], output: &mut [u8], params: &RenderParams<'_>) -> usize {
        self.state.processed.fetch_add(1, Ordering::SeqCst);

        let mut encoded = vec![
            (params.lightness * 100.0).round() as u8,
            (params.zone_immersion[0] * 100.0).round() as u8,
            params.zone_low_immersion[0] as u8,
        ];
        encoded.extend_from_slice(input);

        let n = encoded.len().min(output.len());
        output[..n].copy_from_slice(&encoded[..n]);

        if self.state.overreport.load(Ordering::SeqCst) {
            output.len() + 8
        } else {
            n
        }
    }

    fn max_output_size(&self) -> usize {
        self.max_output_size
    }

    fn reset(&mut self) {
        self.state.resets.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        self.state.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn metadata() -> StreamInitMetadata {
    StreamInitMetadata::new(0, 40, 4, 0)
}

pub fn config() -> RendererConfig {
    config_with_blob(b"fake-config")
}

pub fn config_with_blob(blob: &[u8]) -> RendererConfig {
    RendererConfig::new(Bytes::copy_from_slice(blob), &metadata())
        .unwrap_or_else(|e| panic!("fixture config: {e}"))
}

pub fn params_fixture() -> (
    [f32; MAX_NUM_PERSONALIZATION_ZONES],
    [bool; MAX_NUM_PERSONALIZATION_ZONES],
) {
    (
        [1.0; MAX_NUM_PERSONALIZATION_ZONES],
        [false; MAX_NUM_PERSONALIZATION_ZONES],
    )
}

//! End-to-end scenario harness
//!
//! Runs a generated stream through a full [`Pipeline`] backed by the mock
//! engine and checks every framer decision and every rendered output.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use lsm_core::StreamInitMetadata;
use lsm_runtime::{CollectingSink, Pipeline, PipelineConfig, PipelineError};
use lsm_wire::{FrameDecision, InitBox, LightOutput};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{GeneratedFrame, MockEngineFactory, StreamGenerator, StreamProfile};

/// Engine configuration contents written for every scenario
pub const SCENARIO_ENGINE_CONFIG: &[u8] = b"lsm-test engine configuration";

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("scenario setup failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

// ============================================================================
// REFERENCE STREAM
// ============================================================================

/// Descriptor with version 0, 40 ms frames, at most 4 objects, color space 0
pub fn reference_descriptor() -> [u8; 19] {
    InitBox {
        version: 0,
        frame_period_ms: 40,
        max_objects: 4,
        color_space: 0,
    }
    .to_bytes()
}

/// Three-object frame, five-object frame, skip frame
pub fn reference_frames() -> Vec<Bytes> {
    vec![
        Bytes::from_static(&[0x00, 0x03, 0x10, 0x11, 0x12]),
        Bytes::from_static(&[0x00, 0x05, 0x20, 0x21, 0x22, 0x23, 0x24]),
        Bytes::from_static(&[0x01]),
    ]
}

// ============================================================================
// SCENARIO HARNESS
// ============================================================================

#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub metadata: StreamInitMetadata,
    pub profile: StreamProfile,
    pub frames: usize,
    pub seed: u64,
    pub pipeline: PipelineConfig,
    pub lights_per_strip: u16,
}

impl ScenarioConfig {
    pub fn minimal() -> Self {
        ScenarioConfig {
            metadata: StreamInitMetadata::new(0, 40, 4, 0),
            profile: StreamProfile::clean(),
            frames: 10,
            seed: 1,
            pipeline: PipelineConfig::default(),
            lights_per_strip: 2,
        }
    }

    pub fn standard() -> Self {
        ScenarioConfig {
            profile: StreamProfile::noisy(),
            frames: 200,
            seed: 0x15D,
            ..ScenarioConfig::minimal()
        }
    }

    pub fn stress() -> Self {
        ScenarioConfig {
            metadata: StreamInitMetadata::new(0, 40, 32, 1),
            profile: StreamProfile::hostile(),
            frames: 2000,
            seed: 0xBAD,
            lights_per_strip: 8,
            ..ScenarioConfig::minimal()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScenarioResult {
    pub frames_sent: u64,
    pub frames_emitted: u64,
    pub frames_dropped: u64,
    pub frames_shown: u64,
    /// Framer decisions that differed from the generated expectation
    pub decision_mismatches: u64,
    /// Outputs larger than the negotiated capacity
    pub oversized_outputs: u64,
    /// Outputs the light output decoder rejected
    pub undecodable_outputs: u64,
    pub engines_constructed: usize,
    pub engines_live: usize,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.decision_mismatches == 0
            && self.oversized_outputs == 0
            && self.undecodable_outputs == 0
            && self.engines_live <= 1
    }
}

/// Pipeline, mock engine and sink wired for one scenario
pub struct ScenarioHarness {
    config: ScenarioConfig,
    pipeline: Pipeline,
    factory: MockEngineFactory,
    sink: CollectingSink,
    /// Kept alive for the pipeline's configuration path
    engine_config: NamedTempFile,
}

impl ScenarioHarness {
    pub fn new(config: ScenarioConfig) -> HarnessResult<Self> {
        Self::with_factory(
            config.clone(),
            MockEngineFactory::new().with_lights_per_strip(config.lights_per_strip),
        )
    }

    pub fn with_factory(config: ScenarioConfig, factory: MockEngineFactory) -> HarnessResult<Self> {
        let mut engine_config = NamedTempFile::new()?;
        engine_config.write_all(SCENARIO_ENGINE_CONFIG)?;

        let pipeline_config = PipelineConfig {
            engine_config: Some(engine_config.path().to_path_buf()),
            ..config.pipeline.clone()
        };
        let sink = CollectingSink::new();
        let pipeline = Pipeline::new(
            &pipeline_config,
            Arc::new(factory.clone()),
            Box::new(sink.clone()),
        )?;

        Ok(ScenarioHarness {
            config,
            pipeline,
            factory,
            sink,
            engine_config,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn factory(&self) -> &MockEngineFactory {
        &self.factory
    }

    pub fn sink(&self) -> &CollectingSink {
        &self.sink
    }

    pub fn engine_config_path(&self) -> &Path {
        self.engine_config.path()
    }

    /// Start the pipeline and negotiate the scenario's stream
    pub fn open(&mut self) -> HarnessResult<()> {
        let descriptor = InitBox::from(&self.config.metadata).to_bytes();
        self.pipeline.start();
        self.pipeline.set_descriptor(&descriptor)?;
        Ok(())
    }

    /// Generate and run the configured stream
    pub fn run(&mut self) -> HarnessResult<ScenarioResult> {
        self.open()?;
        let mut generator = StreamGenerator::new(
            self.config.metadata,
            self.config.profile.clone(),
            self.config.seed,
        );
        let frames = generator.take(self.config.frames);
        self.run_frames(&frames)
    }

    /// Push pre-generated frames through the open pipeline
    pub fn run_frames(&mut self, frames: &[GeneratedFrame]) -> HarnessResult<ScenarioResult> {
        let mut result = ScenarioResult::default();
        let capacity = self.pipeline.output_capacity().unwrap_or(0);
        let shown_before = self.sink.len();

        for frame in frames {
            result.frames_sent += 1;
            let decision = self.pipeline.push_buffer(frame.bytes.clone())?;
            if decision != frame.expected {
                result.decision_mismatches += 1;
            }
            match decision {
                FrameDecision::Emit(_) => result.frames_emitted += 1,
                FrameDecision::Drop(_) => result.frames_dropped += 1,
            }
            result.frames_shown += self.pipeline.drain()? as u64;
        }

        for output in self.sink.frames().iter().skip(shown_before) {
            if output.len() > capacity {
                result.oversized_outputs += 1;
            }
            if LightOutput::parse(output).is_err() {
                result.undecodable_outputs += 1;
            }
        }

        result.engines_constructed = self.factory.constructed();
        result.engines_live = self.factory.live();
        Ok(result)
    }
}

/// Run one scenario from scratch
pub fn run_scenario(config: ScenarioConfig) -> HarnessResult<ScenarioResult> {
    ScenarioHarness::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsm_core::{LsmError, MAX_NUM_PERSONALIZATION_ZONES};
    use lsm_render::{Property, PropertyEffect, PropertyKind, PropertyValue};
    use lsm_wire::{parse_init_metadata, DropReason, Frame, LsmFramer, Rgb};
    use proptest::prelude::*;

    fn open_harness(config: ScenarioConfig) -> ScenarioHarness {
        let mut harness = ScenarioHarness::new(config).unwrap();
        harness.open().unwrap();
        harness
    }

    #[test]
    fn test_reference_stream() {
        let mut framer = LsmFramer::new();
        let metadata = framer.set_descriptor(&reference_descriptor()).unwrap();
        assert_eq!(metadata.frame_period_us, 40_000);
        assert_eq!(metadata.max_objects, 4);
        assert_eq!(metadata.color_space, 0);

        let frames = reference_frames();
        let first = framer.classify(frames[0].clone()).unwrap();
        assert_eq!(first.frame().and_then(|f| f.num_objects), Some(3));
        assert_eq!(
            framer.classify(frames[1].clone()).unwrap(),
            FrameDecision::Drop(DropReason::ObjectCountExceeded { found: 5, max: 4 })
        );
        assert_eq!(
            framer.classify(frames[2].clone()).unwrap(),
            FrameDecision::Emit(Frame::skip())
        );
    }

    #[test]
    fn test_reference_stream_through_pipeline() {
        let mut harness = open_harness(ScenarioConfig::minimal());
        for frame in reference_frames() {
            harness.pipeline_mut().process_buffer(frame).unwrap();
        }

        let outputs = harness.sink().decoded().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].arrays.len(), 3);
        assert_eq!(outputs[0].arrays[0].lights(), &[Rgb::new(255, 255, 0); 2]);
        assert_eq!(harness.factory().processed(), 1);
    }

    #[test]
    fn test_minimal_scenario() {
        let result = run_scenario(ScenarioConfig::minimal()).unwrap();
        assert!(result.passed());
        assert_eq!(result.frames_dropped, 0);
        assert_eq!(result.frames_shown, 10);
        assert_eq!(result.engines_constructed, 1);
    }

    #[test]
    fn test_standard_scenario() {
        let result = run_scenario(ScenarioConfig::standard()).unwrap();
        assert!(result.passed());
        assert!(result.frames_dropped > 0);
        assert_eq!(result.frames_sent, result.frames_emitted + result.frames_dropped);
    }

    #[test]
    fn test_stress_scenario() {
        let result = run_scenario(ScenarioConfig::stress()).unwrap();
        assert!(result.passed());
        assert_eq!(result.engines_live, 1);
    }

    #[test]
    fn test_drops_do_not_affect_following_frames() {
        let mut harness = open_harness(ScenarioConfig::minimal());
        let pipeline = harness.pipeline_mut();

        for _ in 0..3 {
            let decision = pipeline
                .push_buffer(Bytes::from_static(&[0x00, 0xFF]))
                .unwrap();
            assert!(!decision.is_emit());
        }
        let decision = pipeline
            .push_buffer(Bytes::from_static(&[0x00, 0x04, 0x01]))
            .unwrap();
        assert_eq!(decision.frame().and_then(|f| f.num_objects), Some(4));
    }

    #[test]
    fn test_engine_failure_then_recovery() {
        let factory = MockEngineFactory::new();
        factory.fail_next(1);
        let mut harness =
            ScenarioHarness::with_factory(ScenarioConfig::minimal(), factory.clone()).unwrap();

        assert!(matches!(
            harness.open(),
            Err(HarnessError::Pipeline(PipelineError::Lsm(
                LsmError::EngineConstructionFailed
            )))
        ));
        assert!(!harness.pipeline().element().is_open());

        harness.open().unwrap();
        assert!(harness.pipeline().element().is_open());
        assert_eq!(factory.live(), 1);
    }

    #[test]
    fn test_restart_under_load() {
        let mut harness = open_harness(ScenarioConfig::minimal());
        let path = harness.engine_config_path().to_path_buf();

        for round in 0..5u8 {
            let effect = harness
                .pipeline_mut()
                .set_property(Property::Config(path.clone()))
                .unwrap();
            assert_eq!(effect, PropertyEffect::Renegotiate);
            harness
                .pipeline_mut()
                .process_buffer(Bytes::from(vec![0x00, round % 5]))
                .unwrap();
        }

        assert_eq!(harness.factory().constructed(), 6);
        assert_eq!(harness.factory().live(), 1);
        assert_eq!(harness.pipeline().element_stats().restarts, 5);
    }

    #[test]
    fn test_failed_restart_leaves_closed_until_renegotiated() {
        let mut harness = open_harness(ScenarioConfig::minimal());
        harness.factory().fail_next(1);
        let path = harness.engine_config_path().to_path_buf();

        assert!(harness
            .pipeline_mut()
            .set_property(Property::Config(path))
            .is_err());
        assert!(!harness.pipeline().element().is_open());
        assert_eq!(harness.factory().live(), 0);

        harness.open().unwrap();
        let shown = harness
            .pipeline_mut()
            .process_buffer(Bytes::from_static(&[0x00, 0x01]))
            .unwrap();
        assert_eq!(shown, 1);
    }

    #[test]
    fn test_personalization_reaches_engine() {
        let mut harness = open_harness(ScenarioConfig::minimal());
        let pipeline = harness.pipeline_mut();
        pipeline.set_property(Property::Lightness(0.0)).unwrap();
        pipeline
            .set_property(Property::ZoneImmersionLevels(vec![100, 0]))
            .unwrap();
        pipeline
            .set_property(Property::ZoneLowImmersion(vec![0, 1]))
            .unwrap();
        pipeline
            .process_buffer(Bytes::from_static(&[0x00, 0x02]))
            .unwrap();

        let output = &harness.sink().decoded().unwrap()[0];
        assert_eq!(output.arrays[0].lights()[0], Rgb::new(0, 255, 0));
        assert_eq!(output.arrays[1].lights()[0], Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_zone_overflow_keeps_values() {
        let mut harness = open_harness(ScenarioConfig::minimal());
        let levels = vec![25; MAX_NUM_PERSONALIZATION_ZONES];
        let pipeline = harness.pipeline_mut();
        pipeline
            .set_property(Property::ZoneImmersionLevels(levels.clone()))
            .unwrap();

        let overflow = vec![75; MAX_NUM_PERSONALIZATION_ZONES + 1];
        assert!(matches!(
            pipeline.set_property(Property::ZoneImmersionLevels(overflow)),
            Err(PipelineError::Lsm(LsmError::ZoneCapacityExceeded { .. }))
        ));
        assert_eq!(
            pipeline
                .element()
                .get_property(PropertyKind::ZoneImmersionLevels),
            PropertyValue::ZoneImmersionLevels(levels)
        );

        pipeline
            .process_buffer(Bytes::from_static(&[0x00, 0x01]))
            .unwrap();
        let observed = harness.factory().last_params().unwrap();
        assert!(observed.zone_immersion.iter().all(|&z| z == 0.25));
    }

    #[test]
    fn test_max_output_capacity_is_engine_size() {
        let factory = MockEngineFactory::new().with_max_output_size(77);
        let mut harness =
            ScenarioHarness::with_factory(ScenarioConfig::minimal(), factory).unwrap();
        harness.open().unwrap();
        assert_eq!(harness.pipeline().output_capacity(), Some(77));
    }

    proptest! {
        #[test]
        fn prop_descriptor_period_scaled(
            period_ms in any::<u32>(),
            max_objects in any::<u8>(),
            color_space in any::<u8>(),
            trailing in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            let mut descriptor = InitBox {
                version: 0,
                frame_period_ms: period_ms,
                max_objects,
                color_space,
            }
            .to_bytes()
            .to_vec();
            descriptor.extend(trailing);

            let metadata = parse_init_metadata(&descriptor).unwrap();
            prop_assert_eq!(metadata.frame_period_us, u64::from(period_ms) * 1000);
            prop_assert_eq!(metadata.max_objects, max_objects);
        }

        #[test]
        fn prop_generated_streams_pass(seed in any::<u64>()) {
            let config = ScenarioConfig::standard().with_seed(seed);
            let config = ScenarioConfig { frames: 40, ..config };
            let result = run_scenario(config).unwrap();
            prop_assert!(result.passed());
        }
    }
}

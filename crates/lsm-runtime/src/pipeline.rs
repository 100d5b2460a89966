//! LSM pipeline - framer, render element and sink
//!
//! Buffers flow framer → frame queue → element → sink gate. The output
//! buffer size is negotiated from the element when the stream is set and
//! re-queried whenever a property write restarts the engine.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use lsm_core::{LsmError, StreamInitMetadata};
use lsm_render::{
    ElementStats, ProcessOutcome, Property, PropertyEffect, RenderElement, RendererFactory,
};
use lsm_wire::{Frame, FrameDecision, FramerStats, LsmFramer};
use tracing::{debug, info, trace, warn};

use crate::{LightSink, PipelineConfig, PipelineError, PipelineResult, SinkGate};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub buffers_pushed: u64,
    pub frames_queued: u64,
    pub queue_overflows: u64,
    pub frames_shown: u64,
    pub preroll_suppressed: u64,
    pub no_output_frames: u64,
    pub renegotiations: u64,
}

/// Two-stage LSM pipeline
pub struct Pipeline {
    framer: LsmFramer,
    element: RenderElement,
    gate: SinkGate,
    queue: VecDeque<Frame>,
    max_queued_frames: usize,
    /// Negotiated output buffer size
    output_capacity: Option<usize>,
    stats: PipelineStats,
}

impl Pipeline {
    /// Build a pipeline and apply the configured element properties
    pub fn new(
        config: &PipelineConfig,
        factory: Arc<dyn RendererFactory>,
        sink: Box<dyn LightSink>,
    ) -> PipelineResult<Self> {
        let element = RenderElement::new(factory);
        config.apply(&element)?;

        Ok(Pipeline {
            framer: LsmFramer::new(),
            element,
            gate: SinkGate::new(sink, config.show_preroll_frame),
            queue: VecDeque::with_capacity(config.max_queued_frames),
            max_queued_frames: config.max_queued_frames,
            output_capacity: None,
            stats: PipelineStats::default(),
        })
    }

    pub fn element(&self) -> &RenderElement {
        &self.element
    }

    pub fn metadata(&self) -> Option<&StreamInitMetadata> {
        self.framer.metadata()
    }

    pub fn output_capacity(&self) -> Option<usize> {
        self.output_capacity
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn start(&mut self) {
        info!("starting LSM pipeline");
        self.framer.start();
        self.element.start();
        self.gate.reset();
        self.queue.clear();
    }

    pub fn stop(&mut self) {
        info!("stopping LSM pipeline");
        self.queue.clear();
        self.framer.stop();
        self.element.stop();
        self.output_capacity = None;
    }

    /// Parse the init descriptor and negotiate the element
    pub fn set_descriptor(&mut self, descriptor: &[u8]) -> PipelineResult<StreamInitMetadata> {
        let metadata = self.framer.set_descriptor(descriptor)?;
        if let Err(e) = self.element.set_stream(metadata) {
            self.output_capacity = None;
            return Err(e.into());
        }
        self.negotiate()?;
        Ok(metadata)
    }

    /// Classify one buffer and queue it if it is a valid frame
    pub fn push_buffer(&mut self, buf: Bytes) -> PipelineResult<FrameDecision> {
        if self.queue.len() >= self.max_queued_frames {
            self.stats.queue_overflows += 1;
            warn!(capacity = self.max_queued_frames, "frame queue full");
            return Err(PipelineError::QueueFull {
                capacity: self.max_queued_frames,
            });
        }

        self.stats.buffers_pushed += 1;
        let decision = self.framer.classify(buf)?;
        if let FrameDecision::Emit(frame) = &decision {
            self.queue.push_back(frame.clone());
            self.stats.frames_queued += 1;
        }
        Ok(decision)
    }

    /// Render every queued frame and hand the outputs to the sink
    ///
    /// Returns the number of frames shown. On error the failing frame is
    /// dropped and later frames stay queued.
    pub fn drain(&mut self) -> PipelineResult<usize> {
        let mut shown = 0;

        while let Some(frame) = self.queue.pop_front() {
            let capacity = self.output_capacity.ok_or(LsmError::EngineNotOpen)?;
            let mut out = BytesMut::zeroed(capacity);

            let n = match self.element.process(&frame, &mut out)? {
                ProcessOutcome::Output(n) => n,
                ProcessOutcome::NoOutput => {
                    self.stats.no_output_frames += 1;
                    trace!("no output for frame");
                    continue;
                }
            };
            out.truncate(n);

            if self.gate.push(&out.freeze())? {
                self.stats.frames_shown += 1;
                shown += 1;
            } else {
                self.stats.preroll_suppressed += 1;
            }
        }

        Ok(shown)
    }

    /// Push one buffer and drain the queue
    pub fn process_buffer(&mut self, buf: Bytes) -> PipelineResult<usize> {
        self.push_buffer(buf)?;
        self.drain()
    }

    /// Forward a property write to the element
    pub fn set_property(&mut self, property: Property) -> PipelineResult<PropertyEffect> {
        match self.element.set_property(property) {
            Ok(PropertyEffect::Renegotiate) => {
                self.stats.renegotiations += 1;
                self.negotiate()?;
                Ok(PropertyEffect::Renegotiate)
            }
            Ok(effect) => Ok(effect),
            Err(e) => {
                if !self.element.is_open() {
                    self.output_capacity = None;
                }
                Err(e.into())
            }
        }
    }

    pub fn set_show_preroll_frame(&mut self, show: bool) {
        self.gate.set_show_preroll_frame(show);
    }

    /// Drop queued frames and engine history after a discontinuity
    pub fn flush(&mut self) {
        debug!(dropped = self.queue.len(), "flushing pipeline");
        self.queue.clear();
        self.element.flush();
        self.gate.reset();
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn framer_stats(&self) -> &FramerStats {
        self.framer.stats()
    }

    pub fn element_stats(&self) -> ElementStats {
        self.element.stats()
    }

    fn negotiate(&mut self) -> PipelineResult<()> {
        let capacity = self.element.transform_size()?;
        debug!(capacity, "output buffer size negotiated");
        self.output_capacity = Some(capacity);
        Ok(())
    }
}

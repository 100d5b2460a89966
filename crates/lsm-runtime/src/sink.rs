//! Light sinks
//!
//! A sink consumes rendered output buffers in the light output layout. The
//! [`SinkGate`] sits in front of a sink and decides whether the preroll
//! frame is shown.

use std::sync::Arc;

use bytes::Bytes;
use lsm_core::LsmResult;
use lsm_wire::{LightData, LightOutput};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Consumer of rendered light frames
pub trait LightSink: Send {
    fn show_frame(&mut self, frame: &Bytes) -> LsmResult<()>;
}

/// Writes every light array to the log at `info`
#[derive(Debug, Default)]
pub struct TextSink {
    frames_shown: u64,
}

impl TextSink {
    pub fn new() -> Self {
        TextSink::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl LightSink for TextSink {
    fn show_frame(&mut self, frame: &Bytes) -> LsmResult<()> {
        let output = LightOutput::parse(frame)?;
        self.frames_shown += 1;

        info!(arrays = output.declared_arrays, "[LSM] light frame");
        for array in &output.arrays {
            info!(
                strip = array.strip_id,
                lights = array.num_lights,
                format = array.format.to_byte(),
                "[LSM] strip"
            );
            match &array.data {
                LightData::Rgb(lights) => {
                    for light in lights {
                        info!("[LSM]     {:3} {:3} {:3}", light.r, light.g, light.b);
                    }
                }
                LightData::Raw(_) => info!("[LSM]     UNKNOWN OUTPUT FORMAT"),
            }
        }
        Ok(())
    }
}

/// Keeps every frame it is shown; clones share the frame list
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    frames: Arc<Mutex<Vec<Bytes>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        CollectingSink::default()
    }

    pub fn frames(&self) -> Vec<Bytes> {
        self.frames.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Decode every collected frame
    pub fn decoded(&self) -> LsmResult<Vec<LightOutput>> {
        self.frames
            .lock()
            .iter()
            .map(|frame| LightOutput::parse(frame))
            .collect()
    }
}

impl LightSink for CollectingSink {
    fn show_frame(&mut self, frame: &Bytes) -> LsmResult<()> {
        self.frames.lock().push(frame.clone());
        Ok(())
    }
}

/// Preroll handling in front of a sink
///
/// The first frame after `start` (or a flush) is the preroll frame. It is
/// shown only when `show_preroll_frame` is set; later frames always are.
pub struct SinkGate {
    sink: Box<dyn LightSink>,
    show_preroll_frame: bool,
    prerolled: bool,
}

impl SinkGate {
    pub fn new(sink: Box<dyn LightSink>, show_preroll_frame: bool) -> Self {
        SinkGate {
            sink,
            show_preroll_frame,
            prerolled: false,
        }
    }

    pub fn show_preroll_frame(&self) -> bool {
        self.show_preroll_frame
    }

    pub fn set_show_preroll_frame(&mut self, show: bool) {
        self.show_preroll_frame = show;
    }

    pub fn is_prerolled(&self) -> bool {
        self.prerolled
    }

    /// Expect a new preroll frame
    pub fn reset(&mut self) {
        self.prerolled = false;
    }

    /// Hand one rendered frame on; returns whether the sink was shown it
    pub fn push(&mut self, frame: &Bytes) -> LsmResult<bool> {
        if !self.prerolled {
            self.prerolled = true;
            if !self.show_preroll_frame {
                debug!(len = frame.len(), "preroll frame, preroll rendering disabled");
                return Ok(false);
            }
        }
        self.sink.show_frame(frame)?;
        Ok(true)
    }
}

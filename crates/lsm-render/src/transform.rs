//! Render transform - one validated frame in, one output buffer out

use lsm_core::{LsmError, LsmResult, MAX_NUM_MD};
use lsm_wire::Frame;
use tracing::{debug, trace};

use crate::{EngineHandle, PersonalizationState};

/// Result of processing one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Bytes written to the output buffer
    Output(usize),
    /// Nothing to forward for this period
    NoOutput,
}

/// Output capacity callers must provide to [`process`]
pub fn required_output_capacity(engine: &EngineHandle) -> usize {
    engine.max_output_size() * MAX_NUM_MD
}

/// Render one frame into `out`
///
/// Empty payloads (including skip frames) never reach the engine. The caller
/// truncates `out` to the returned size before forwarding it.
pub fn process(
    engine: &mut EngineHandle,
    frame: &Frame,
    state: &PersonalizationState,
    out: &mut [u8],
) -> LsmResult<ProcessOutcome> {
    if frame.is_empty() {
        trace!(skip = frame.is_skip, "input frame empty, producing no output");
        return Ok(ProcessOutcome::NoOutput);
    }

    let required = required_output_capacity(engine);
    if out.len() < required {
        return Err(LsmError::OutputBufferTooSmall {
            required,
            actual: out.len(),
        });
    }

    debug!(input_size = frame.payload.len(), "rendering frame");
    let written = engine.process(&frame.payload, out, &state.params());
    debug!(output_size = written, "frame rendered");

    Ok(ProcessOutcome::Output(written))
}

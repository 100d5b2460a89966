#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use lsm_wire::{FrameDecision, InitBox, LsmFramer};

#[derive(Arbitrary, Debug)]
struct Input {
    max_objects: u8,
    frames: Vec<Vec<u8>>,
}

fuzz_target!(|input: Input| {
    let descriptor = InitBox {
        version: 0,
        frame_period_ms: 40,
        max_objects: input.max_objects,
        color_space: 0,
    }
    .to_bytes();

    let mut framer = LsmFramer::new();
    if framer.set_descriptor(&descriptor).is_err() {
        return;
    }

    let pushed = input.frames.len() as u64;
    for frame in input.frames {
        let len = frame.len();
        let Ok(decision) = framer.classify(Bytes::from(frame)) else {
            panic!("framer lost its metadata");
        };
        if let FrameDecision::Emit(frame) = decision {
            if frame.is_skip {
                assert!(frame.payload.is_empty());
            } else {
                assert_eq!(frame.payload.len(), len);
                assert!(frame.num_objects.unwrap_or(0) <= input.max_objects);
            }
        }
    }

    let stats = framer.stats();
    assert_eq!(stats.frames_emitted + stats.frames_dropped, pushed);
    assert!(stats.object_count_drops <= stats.frames_dropped);
});

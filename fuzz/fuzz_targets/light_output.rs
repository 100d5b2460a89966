#![no_main]

use libfuzzer_sys::fuzz_target;
use lsm_wire::{LightData, LightOutput};

fuzz_target!(|data: &[u8]| {
    let Ok(output) = LightOutput::parse(data) else {
        return;
    };

    assert!(output.arrays.len() <= usize::from(output.declared_arrays));
    if output.complete {
        assert_eq!(output.arrays.len(), usize::from(output.declared_arrays));
        assert!(output.encoded_len() <= data.len());
    }
    for array in &output.arrays {
        if let LightData::Rgb(lights) = &array.data {
            assert_eq!(lights.len(), usize::from(array.num_lights));
        }
    }
});

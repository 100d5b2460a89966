#![no_main]

use libfuzzer_sys::fuzz_target;
use lsm_core::LsmError;
use lsm_wire::{parse_init_metadata, InitBox, INIT_BOX_SIZE};

fuzz_target!(|data: &[u8]| {
    match parse_init_metadata(data) {
        Ok(metadata) => {
            assert!(data.len() >= INIT_BOX_SIZE);
            assert_eq!(
                metadata.frame_period_us,
                u64::from(metadata.frame_period_ms) * 1000
            );
            let encoded = InitBox::from(&metadata).to_bytes();
            assert_eq!(encoded[12..], data[12..INIT_BOX_SIZE]);
        }
        Err(LsmError::TruncatedDescriptor { .. }) => assert!(data.len() < INIT_BOX_SIZE),
        Err(e) => panic!("unexpected descriptor error: {e}"),
    }
});

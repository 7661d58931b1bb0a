#![no_main]

use hg_codec::{decode_container, DecodeOpts};
use hg_format::Limits;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Small limits keep allocations bounded for hostile size fields
    let opts = DecodeOpts {
        limits: Limits {
            max_block_uncompressed_len: 1 << 20,
            max_total_uncompressed_len: 8 << 20,
        },
        strict: false,
    };

    if let Ok(decoded) = decode_container(data, &opts) {
        assert!(!decoded.text.contains('\0'));
        assert!(decoded.header_len <= data.len());
        if let Some(last) = decoded.text.chars().last() {
            assert!(last == '}' || last == ']');
        }
    }
});

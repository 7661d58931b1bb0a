#![no_main]

use hg_codec::{decode, encode_container, EncodeOpts};
use hg_format::BlockHeader;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return;
    };
    if !(value.is_object() || value.is_array()) {
        return;
    }
    let canonical = value.to_string();

    let original = BlockHeader::sentinel().encode();
    let opts = EncodeOpts { block_size: 4096 };
    let encoded = encode_container(&original, &canonical, &opts).expect("encode");
    let decoded = decode(&encoded.bytes).expect("decode");
    assert_eq!(decoded, canonical);
});

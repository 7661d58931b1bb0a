//! Negative tests covering the `SaveError` variants reachable from documents and sessions

use hg_format::constants::BLOCK_HEADER_LEN;
use hg_format::{BlockHeader, BlockIter, ErrorKind, Limits, SaveError};
use hg_io::{
    decode_document, encode_document, DecodeOpts, EditSession, EncodeOpts, MappingSource,
    MappingTable, NodePath, OpenSave,
};
use serde_json::json;
use std::fs;

fn headerless() -> Vec<u8> {
    BlockHeader::sentinel().encode().to_vec()
}

fn big_document_bytes() -> Vec<u8> {
    let items: Vec<_> = (0..20_000).map(|i| json!({"k": i})).collect();
    encode_document(&headerless(), &json!(items), &EncodeOpts::default()).unwrap()
}

#[test]
fn encode_without_magic_is_invalid_container() {
    let err = encode_document(b"plain bytes", &json!({}), &EncodeOpts::default()).unwrap_err();
    assert!(matches!(err, SaveError::InvalidContainer));
    assert_eq!(err.kind(), ErrorKind::InvalidContainer);
}

#[test]
fn corrupt_payload_is_decode_error() {
    let mut bytes = BlockHeader::new(8, 65_536).encode().to_vec();
    bytes.extend_from_slice(&[0xF0; 8]);
    bytes.extend_from_slice(&headerless());

    let err = decode_document(&bytes, &DecodeOpts::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn declared_size_larger_than_payload_is_size_mismatch() {
    let plain = b"{\"a\":1}";
    let compressed = lz4_flex::block::compress(plain);
    let mut bytes = BlockHeader::new(compressed.len() as u32, 4096).encode().to_vec();
    bytes.extend_from_slice(&compressed);

    let err = decode_document(&bytes, &DecodeOpts::default()).unwrap_err();
    assert!(matches!(err, SaveError::SizeMismatch { expected: 4096, .. }), "{err}");
}

#[test]
fn truncated_stream_strict_and_lenient() {
    let bytes = big_document_bytes();
    let first = BlockIter::new(&bytes).next().expect("first block");
    // Inside the payload of the second block
    let cut = &bytes[..BLOCK_HEADER_LEN + first.payload.len() + BLOCK_HEADER_LEN + 4];

    let strict = DecodeOpts {
        strict: true,
        ..DecodeOpts::default()
    };
    let err = decode_document(cut, &strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedStream);

    // Lenient decoding keeps the prefix, which is not a complete document here
    match decode_document(cut, &DecodeOpts::default()) {
        Ok(decoded) => assert!(decoded.truncation().is_some()),
        Err(e) => assert_eq!(e.kind(), ErrorKind::Json),
    }
}

#[test]
fn block_limit_is_enforced() {
    let opts = DecodeOpts {
        limits: Limits {
            max_block_uncompressed_len: 1024,
            ..Limits::default()
        },
        strict: false,
    };
    let bytes = encode_document(&headerless(), &json!({"a": 1}), &EncodeOpts::default()).unwrap();
    let err = decode_document(&bytes, &opts).unwrap_err();
    assert!(matches!(err, SaveError::LimitExceeded(_)));
}

#[test]
fn empty_container_is_empty_payload() {
    let err = decode_document(&headerless(), &DecodeOpts::default()).unwrap_err();
    assert!(matches!(err, SaveError::EmptyPayload));
}

#[test]
fn mapping_errors_and_fallback() {
    let err = MappingTable::from_json_str("{\"a\": [1]}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MappingLoad);

    let err = MappingTable::from_path("/nonexistent/mapping.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MappingLoad);

    let table = MappingTable::load_or_identity(&MappingSource::Json("oops".into()));
    assert!(!table.is_loaded());
    assert_eq!(table.lookup_readable("F2P"), "F2P");
}

#[test]
fn path_errors() {
    let err = NodePath::parse("no/leading/slash").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path);
    let err = NodePath::parse("/bad~escape").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path);
}

#[test]
fn session_errors() {
    let mut session = EditSession::build(json!({"list": [1, 2, 3]}));
    let third = session.find(&NodePath::parse("/list/2").unwrap()).unwrap();
    let list = session.find(&NodePath::parse("/list").unwrap()).unwrap();

    session.set_value(list, json!([1])).unwrap();
    let err = session.set_value(third, json!(0)).unwrap_err();
    assert!(matches!(err, SaveError::NodeDetached(_)));
    assert_eq!(err.kind(), ErrorKind::Session);
}

#[test]
fn open_missing_file_is_io_error() {
    let table = MappingTable::identity();
    let err = OpenSave::open("/nonexistent/save.hg", &table, &DecodeOpts::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn open_non_json_payload_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.hg");
    let bytes = hg_codec::encode(&headerless(), "{\"unterminated\": [1, 2}").unwrap();
    fs::write(&path, bytes).unwrap();

    let table = MappingTable::identity();
    let err = OpenSave::open(&path, &table, &DecodeOpts::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Json);
}

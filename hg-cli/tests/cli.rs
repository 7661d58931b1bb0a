use assert_cmd::Command;
use hg_format::BlockHeader;
use hg_io::{decode_document, encode_document, DecodeOpts, EncodeOpts};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &[u8] = b"HGSAVE\x01\x00";

struct SampleSave {
    dir: TempDir,
    save_path: PathBuf,
    mapping_path: PathBuf,
}

fn short_document() -> Value {
    json!({
        "F2P": 4135,
        "6f=": {";l5": [{"b2n": "^FUEL1", "1o9": 50}], "Pk4": "Explorer"},
        "zzz": "unmapped"
    })
}

fn build_sample_save() -> Result<SampleSave, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let save_path = dir.path().join("save2.hg");
    let mapping_path = dir.path().join("mapping.json");

    let mut original = HEADER.to_vec();
    original.extend_from_slice(&BlockHeader::sentinel().encode());
    fs::write(
        &save_path,
        encode_document(&original, &short_document(), &EncodeOpts::default())?,
    )?;
    fs::write(
        &mapping_path,
        r#"{"F2P":"Units","6f=":"PlayerStateData",";l5":"Inventory","b2n":"Id","1o9":"Amount","Pk4":"Name"}"#,
    )?;

    Ok(SampleSave {
        dir,
        save_path,
        mapping_path,
    })
}

fn hgsave() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("hgsave")?;
    cmd.env_remove("HGSAVE_MAPPING").env_remove("HGSAVE_LOG");
    Ok(cmd)
}

fn read_save(path: &PathBuf) -> Result<Value, Box<dyn Error>> {
    Ok(decode_document(&fs::read(path)?, &DecodeOpts::default())?.document)
}

#[test]
fn unpack_translates_keys() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let out = sample.dir.path().join("save.json");

    hgsave()?
        .args(["unpack", sample.save_path.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .args(["--mapping", sample.mapping_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Unpacked to"));

    let value: Value = serde_json::from_slice(&fs::read(&out)?)?;
    assert_eq!(value["Units"], json!(4135));
    assert_eq!(value["PlayerStateData"]["Inventory"][0]["Id"], json!("^FUEL1"));
    assert_eq!(value["zzz"], json!("unmapped"));
    Ok(())
}

#[test]
fn unpack_raw_keys_and_pretty() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let out = sample.dir.path().join("raw.json");

    hgsave()?
        .args(["unpack", sample.save_path.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .args(["--raw-keys", "--pretty"])
        .assert()
        .success();

    let text = fs::read_to_string(&out)?;
    assert!(text.contains('\n'));
    let value: Value = serde_json::from_str(&text)?;
    assert_eq!(value, short_document());
    Ok(())
}

#[test]
fn unpack_without_mapping_keeps_short_keys() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let out = sample.dir.path().join("plain.json");

    hgsave()?
        .args(["unpack", sample.save_path.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("keys: raw"));

    let value: Value = serde_json::from_slice(&fs::read(&out)?)?;
    assert_eq!(value, short_document());
    Ok(())
}

#[test]
fn pack_round_trips_edited_json() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let json_path = sample.dir.path().join("save.json");
    let mapping = sample.mapping_path.to_str().unwrap();

    hgsave()?
        .args(["unpack", sample.save_path.to_str().unwrap(), "-o", json_path.to_str().unwrap()])
        .args(["--mapping", mapping])
        .assert()
        .success();

    let mut edited: Value = serde_json::from_slice(&fs::read(&json_path)?)?;
    edited["Units"] = json!(999_999);
    fs::write(&json_path, serde_json::to_vec(&edited)?)?;

    let previous = fs::read(&sample.save_path)?;
    hgsave()?
        .args(["pack", json_path.to_str().unwrap()])
        .args(["--target", sample.save_path.to_str().unwrap(), "--mapping", mapping])
        .assert()
        .success()
        .stderr(predicate::str::contains("Previous contents saved to"));

    let written = fs::read(&sample.save_path)?;
    assert_eq!(&written[..HEADER.len()], HEADER);
    assert_eq!(fs::read(sample.dir.path().join("save2.hg.bak"))?, previous);

    let mut expected = short_document();
    expected["F2P"] = json!(999_999);
    assert_eq!(read_save(&sample.save_path)?, expected);
    Ok(())
}

#[test]
fn pack_to_separate_output() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let json_path = sample.dir.path().join("short.json");
    let out = sample.dir.path().join("save3.hg");
    fs::write(&json_path, r#"{"F2P":1}"#)?;

    hgsave()?
        .args(["pack", json_path.to_str().unwrap(), "--short-keys"])
        .args(["--target", sample.save_path.to_str().unwrap()])
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(read_save(&out)?, json!({"F2P": 1}));
    assert_eq!(read_save(&sample.save_path)?, short_document());
    assert!(!sample.dir.path().join("save3.hg.bak").exists());
    Ok(())
}

#[test]
fn pack_rejects_target_without_blocks() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let json_path = dir.path().join("in.json");
    let target = dir.path().join("not_a_save.hg");
    fs::write(&json_path, "{}")?;
    fs::write(&target, "hello")?;

    hgsave()?
        .args(["pack", json_path.to_str().unwrap(), "--target", target.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    assert_eq!(fs::read(&target)?, b"hello");
    Ok(())
}

#[test]
fn ls_table_lists_blocks() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    hgsave()?
        .args(["ls", sample.save_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Header: {} bytes", HEADER.len())))
        .stdout(predicate::str::contains("65536"))
        .stdout(predicate::str::contains("Stop: sentinel"));
    Ok(())
}

#[test]
fn ls_json_output_parses() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let output = hgsave()?
        .args(["ls", sample.save_path.to_str().unwrap(), "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output)?;
    assert_eq!(value["header_len"], json!(HEADER.len()));
    assert_eq!(value["blocks"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["blocks"][0]["uncompressed_size"], json!(65_536));
    Ok(())
}

#[test]
fn get_reads_readable_and_raw_paths() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    hgsave()?
        .args(["get", sample.save_path.to_str().unwrap(), "/PlayerStateData/Inventory/0/Amount"])
        .args(["--mapping", sample.mapping_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("50\n");

    hgsave()?
        .args(["get", sample.save_path.to_str().unwrap(), "/6f=/Pk4", "--raw-keys"])
        .assert()
        .success()
        .stdout("\"Explorer\"\n");

    hgsave()?
        .args(["get", sample.save_path.to_str().unwrap(), "/Missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no value at '/Missing'"));
    Ok(())
}

#[test]
fn set_writes_backup_and_value() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let previous = fs::read(&sample.save_path)?;

    hgsave()?
        .args(["set", sample.save_path.to_str().unwrap(), "/Units", "100"])
        .args(["--mapping", sample.mapping_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Updated /Units"));

    assert_eq!(read_save(&sample.save_path)?["F2P"], json!(100));
    assert_eq!(fs::read(sample.dir.path().join("save2.hg.bak"))?, previous);
    Ok(())
}

#[test]
fn set_same_value_writes_nothing() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let before = fs::read(&sample.save_path)?;

    hgsave()?
        .args(["set", sample.save_path.to_str().unwrap(), "/F2P", "4135"])
        .assert()
        .success()
        .stderr(predicate::str::contains("unchanged"));

    assert_eq!(fs::read(&sample.save_path)?, before);
    assert!(!sample.dir.path().join("save2.hg.bak").exists());
    Ok(())
}

#[test]
fn set_respects_no_backup_and_config() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let config = sample.dir.path().join("hgsave.toml");
    fs::write(&config, "mapping = \"mapping.json\"\nbackup = false\n")?;

    hgsave()?
        .args(["set", sample.save_path.to_str().unwrap(), "/PlayerStateData/Name", "\"Traveller\""])
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(read_save(&sample.save_path)?["6f="]["Pk4"], json!("Traveller"));
    assert!(!sample.dir.path().join("save2.hg.bak").exists());

    hgsave()?
        .args(["set", sample.save_path.to_str().unwrap(), "/F2P", "1", "--no-backup"])
        .assert()
        .success();
    assert!(!sample.dir.path().join("save2.hg.bak").exists());
    Ok(())
}

#[test]
fn set_rejects_invalid_json_value() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    hgsave()?
        .args(["set", sample.save_path.to_str().unwrap(), "/F2P", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("value must be JSON"));
    Ok(())
}

#[test]
fn latest_picks_newest_slot() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    hgsave()?
        .args(["latest", sample.dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("save2.hg"));

    let empty = tempfile::tempdir()?;
    hgsave()?
        .args(["latest", empty.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no save<N>.hg files"));
    Ok(())
}

#[test]
fn strict_flag_rejects_truncated_save() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_save()?;
    let bytes = fs::read(&sample.save_path)?;
    let truncated = sample.dir.path().join("save9.hg");
    fs::write(&truncated, &bytes[..HEADER.len() + 20])?;
    let out = sample.dir.path().join("out.json");

    hgsave()?
        .args(["unpack", truncated.to_str().unwrap(), "-o", out.to_str().unwrap(), "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Truncated"));
    Ok(())
}

//! Torrent record fixtures shaped like `torrents/info` output.

use qbt_client::TorrentRecord;
use serde_json::{json, Value};

fn record(value: Value) -> TorrentRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be a JSON object, got {}", other),
    }
}

/// A torrent halfway through downloading
pub fn downloading_torrent() -> TorrentRecord {
    record(json!({
        "hash": "8c212779b4abde7c6bc608063a0d008b7e40ce32",
        "name": "debian-12.5.0-amd64-netinst.iso",
        "size": 659554304u64,
        "progress": 0.5,
        "dlspeed": 2097152,
        "upspeed": 0,
        "num_seeds": 42,
        "num_leechs": 3,
        "state": "downloading",
        "eta": 315,
        "category": "linux",
        "tags": "iso",
        "added_on": 1700000000,
        "completion_on": -1
    }))
}

/// A finished torrent that is seeding
pub fn seeding_torrent() -> TorrentRecord {
    record(json!({
        "hash": "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c",
        "name": "Big Buck Bunny",
        "size": 276445467u64,
        "progress": 1.0,
        "dlspeed": 0,
        "upspeed": 524288,
        "num_seeds": 0,
        "num_leechs": 12,
        "state": "uploading",
        "eta": 8640000,
        "category": "",
        "tags": "",
        "added_on": 1690000000,
        "completion_on": 1690003600
    }))
}

/// A paused torrent with nothing downloaded
pub fn paused_torrent() -> TorrentRecord {
    record(json!({
        "hash": "08ada5a7a6183aae1e09d831df6748d566095a10",
        "name": "Sintel",
        "size": 0,
        "progress": 0.0,
        "state": "pausedDL",
        "eta": 8640000
    }))
}

pub fn all_torrents() -> Vec<TorrentRecord> {
    vec![downloading_torrent(), seeding_torrent(), paused_torrent()]
}

pub fn as_json(records: &[TorrentRecord]) -> Value {
    Value::Array(records.iter().cloned().map(Value::Object).collect())
}

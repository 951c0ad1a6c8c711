//! Read-only view over a raw torrent field mapping.

use crate::api::{QbitClient, TorrentRecord};
use crate::error::QbtResult;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// qBittorrent reports this ETA (100 days) when it has no estimate.
pub const ETA_UNKNOWN: i64 = 8_640_000;

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

const DOWNLOADING_STATES: [&str; 4] = ["downloading", "stalledDL", "metaDL", "forcedDL"];
const UPLOADING_STATES: [&str; 3] = ["uploading", "stalledUP", "forcedUP"];
// qBittorrent 5 renamed paused* to stopped*.
const PAUSED_STATES: [&str; 4] = ["pausedDL", "pausedUP", "stoppedDL", "stoppedUP"];

/// A torrent as returned by `torrents/info`, with derived accessors.
///
/// Missing or mistyped fields read as empty/zero; the raw mapping is kept
/// untouched and available through [`Torrent::raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct Torrent {
    record: TorrentRecord,
}

impl From<TorrentRecord> for Torrent {
    fn from(record: TorrentRecord) -> Self {
        Self::new(record)
    }
}

impl Torrent {
    pub fn new(record: TorrentRecord) -> Self {
        Self { record }
    }

    pub fn raw(&self) -> &TorrentRecord {
        &self.record
    }

    fn str_field(&self, key: &str) -> &str {
        self.record.get(key).and_then(Value::as_str).unwrap_or("")
    }

    fn u64_field(&self, key: &str) -> u64 {
        self.record.get(key).and_then(Value::as_u64).unwrap_or(0)
    }

    fn i64_field(&self, key: &str) -> i64 {
        self.record.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    fn time_field(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.i64_field(key) {
            secs if secs > 0 => DateTime::from_timestamp(secs, 0),
            _ => None,
        }
    }

    pub fn hash(&self) -> &str {
        self.str_field("hash")
    }

    pub fn name(&self) -> &str {
        self.str_field("name")
    }

    pub fn state(&self) -> &str {
        self.str_field("state")
    }

    pub fn category(&self) -> &str {
        self.str_field("category")
    }

    pub fn tags(&self) -> &str {
        self.str_field("tags")
    }

    /// Total selected size in bytes
    pub fn size(&self) -> u64 {
        self.u64_field("size")
    }

    /// Progress as a fraction in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        self.record
            .get("progress")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Download rate in bytes per second
    pub fn dlspeed(&self) -> u64 {
        self.u64_field("dlspeed")
    }

    /// Upload rate in bytes per second
    pub fn upspeed(&self) -> u64 {
        self.u64_field("upspeed")
    }

    pub fn num_seeds(&self) -> u64 {
        self.u64_field("num_seeds")
    }

    pub fn num_leechs(&self) -> u64 {
        self.u64_field("num_leechs")
    }

    /// Seconds remaining, as reported by the server
    pub fn eta(&self) -> i64 {
        self.i64_field("eta")
    }

    pub fn added_on(&self) -> Option<DateTime<Utc>> {
        self.time_field("added_on")
    }

    /// `None` until the torrent has completed.
    pub fn completion_on(&self) -> Option<DateTime<Utc>> {
        self.time_field("completion_on")
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress() * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 0.999
    }

    pub fn is_downloading(&self) -> bool {
        DOWNLOADING_STATES.contains(&self.state())
    }

    pub fn is_uploading(&self) -> bool {
        UPLOADING_STATES.contains(&self.state())
    }

    pub fn is_paused(&self) -> bool {
        PAUSED_STATES.contains(&self.state())
    }

    pub fn size_formatted(&self) -> String {
        format_size(self.size())
    }

    pub fn download_speed_formatted(&self) -> String {
        format_speed(self.dlspeed())
    }

    pub fn upload_speed_formatted(&self) -> String {
        format_speed(self.upspeed())
    }

    pub fn eta_formatted(&self) -> String {
        format_eta(self.eta())
    }

    /// Rename the torrent on the server, then locally.
    pub async fn rename(&mut self, client: &QbitClient, new_name: &str) -> QbtResult<()> {
        client.rename_torrent(self.hash(), new_name).await?;
        self.record
            .insert("name".to_string(), Value::String(new_name.to_string()));
        Ok(())
    }
}

impl std::fmt::Display for Torrent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {:.1}% - {} - DL: {} - UL: {} - State: {}",
            self.name(),
            self.progress_percent(),
            self.size_formatted(),
            self.download_speed_formatted(),
            self.upload_speed_formatted(),
            self.state()
        )
    }
}

/// Human-readable byte count using 1024-based units, e.g. `1.00 MB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, SIZE_UNITS[unit])
}

/// Human-readable rate, e.g. `512.00 KB/s`.
pub fn format_speed(bytes_per_sec: u64) -> String {
    if bytes_per_sec == 0 {
        return "0 B/s".to_string();
    }
    format!("{}/s", format_size(bytes_per_sec))
}

/// Human-readable ETA: `2d 03h`, `1h 05m` or `4m 09s`; `∞` when unknown.
pub fn format_eta(eta: i64) -> String {
    if eta <= 0 || eta >= ETA_UNKNOWN {
        return "∞".to_string();
    }

    let (minutes, seconds) = (eta / 60, eta % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);

    if days > 0 {
        format!("{}d {:02}h", days, hours)
    } else if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}

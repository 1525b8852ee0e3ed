//! Domain models shared by the discovery, speed test and ranking stages

use serde::{Deserialize, Serialize};

/// A discovered channel: normalized name and absolute stream URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub name: String,
    pub stream_url: String,
}

impl ChannelRecord {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, stream_url: U) -> Self {
        Self {
            name: name.into(),
            stream_url: stream_url.into(),
        }
    }
}

/// Outcome of one accepted speed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResult {
    pub name: String,
    pub stream_url: String,
    /// Throughput in KB/s, rounded to two decimals
    pub speed_kbps: f64,
    /// Pixel height of the first video stream, 0 when unknown
    pub resolution_px: u32,
}

impl SpeedResult {
    pub fn new(record: ChannelRecord, speed_kbps: f64, resolution_px: u32) -> Self {
        Self {
            name: record.name,
            stream_url: record.stream_url,
            speed_kbps,
            resolution_px,
        }
    }
}

/// The surviving speed result for a channel name after reduction
pub type RankedEntry = SpeedResult;

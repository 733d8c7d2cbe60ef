//! Shared data structures for the gallery
//!
//! These structs represent the data model that flows between
//! the transport layer, the collection state and the UI layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque identifier of a media record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolution class derived from the main video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    SD,
    HD,
    FHD,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::SD,
        Quality::HD,
        Quality::FHD,
        Quality::TwoK,
        Quality::FourK,
    ];

    /// Classify by exact pixel count, anything unrecognised is SD
    pub fn from_pixels(pixels: u64) -> Self {
        match pixels {
            921_600 => Quality::HD,
            2_073_600 => Quality::FHD,
            3_686_400 => Quality::TwoK,
            6_998_400 => Quality::FourK,
            _ => Quality::SD,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quality::SD => "SD",
            Quality::HD => "HD",
            Quality::FHD => "FHD",
            Quality::TwoK => "2K",
            Quality::FourK => "4K",
        };
        f.write_str(label)
    }
}

/// Aspect class derived from the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Landscape,
        Orientation::Portrait,
        Orientation::Square,
        Orientation::Unknown,
    ];
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Orientation::Landscape => "16:9",
            Orientation::Portrait => "9:16",
            Orientation::Square => "1:1",
            Orientation::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Duration as delivered by the server: raw seconds or a pre-formatted "m:ss"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDuration {
    Seconds(u64),
    Formatted(String),
}

impl RecordDuration {
    /// Total seconds, used for ordering. Unparsable strings count as zero.
    pub fn total_seconds(&self) -> u64 {
        match self {
            RecordDuration::Seconds(secs) => *secs,
            RecordDuration::Formatted(text) => parse_clock(text).unwrap_or(0),
        }
    }
}

impl Default for RecordDuration {
    fn default() -> Self {
        RecordDuration::Seconds(0)
    }
}

impl fmt::Display for RecordDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDuration::Formatted(text) => f.write_str(text),
            RecordDuration::Seconds(secs) => write!(f, "{}:{:02}", secs / 60, secs % 60),
        }
    }
}

/// Parse "m:ss" or "h:mm:ss" into seconds
fn parse_clock(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.split(':').try_fold(0u64, |acc, part| {
        let value: u64 = part.trim().parse().ok()?;
        acc.checked_mul(60)?.checked_add(value)
    })
}

/// One stream entry from the server's probe data
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
}

impl StreamInfo {
    fn is_main(&self) -> bool {
        self.profile.as_deref() == Some("Main")
    }
}

/// Quality of the "Main" profile stream, or of the first stream
pub fn determine_quality(streams: &[StreamInfo]) -> Quality {
    let Some(stream) = streams.iter().find(|s| s.is_main()).or(streams.first()) else {
        return Quality::SD;
    };
    Quality::from_pixels(u64::from(stream.width) * u64::from(stream.height))
}

/// Orientation of the first video stream (cover-art mjpeg streams are ignored)
pub fn determine_orientation(streams: &[StreamInfo]) -> Orientation {
    const TOLERANCE: f64 = 0.02;

    if streams.is_empty() {
        return Orientation::Unknown;
    }

    let ratio = match streams
        .iter()
        .find(|s| s.is_main() || s.codec_name.as_deref() != Some("mjpeg"))
    {
        Some(stream) if stream.height == 0 => return Orientation::Unknown,
        Some(stream) => f64::from(stream.width) / f64::from(stream.height),
        None => 1.0,
    };

    let close = |target: f64| (ratio - target).abs() < TOLERANCE;
    if close(16.0 / 9.0) {
        Orientation::Landscape
    } else if close(9.0 / 16.0) {
        Orientation::Portrait
    } else {
        Orientation::Square
    }
}

/// Represents a single media item in the gallery
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRecord {
    /// Unique server-side ID
    pub id: RecordId,
    pub title: String,
    pub size_bytes: u64,
    /// Unix seconds of the file's last modification
    pub modified_at: i64,
    pub duration: RecordDuration,
    pub quality: Quality,
    pub orientation: Orientation,
    /// Resolved against the preference store, not sent by the server
    pub favorite: bool,
    /// True when excluded by the current filter configuration
    pub skip: bool,
}

impl MediaRecord {
    /// Build a record and derive quality/orientation from its streams
    pub fn new(
        id: RecordId,
        title: String,
        size_bytes: u64,
        modified_at: i64,
        duration: RecordDuration,
        streams: &[StreamInfo],
    ) -> Self {
        Self {
            id,
            title,
            size_bytes,
            modified_at,
            duration,
            quality: determine_quality(streams),
            orientation: determine_orientation(streams),
            favorite: false,
            skip: false,
        }
    }
}

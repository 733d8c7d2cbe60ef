//! Server JSON shapes and their conversion into [`MediaRecord`]s

use serde::Deserialize;

use crate::state::data::{MediaRecord, RecordDuration, RecordId, StreamInfo};

/// Body of `GET /api/videos`
#[derive(Debug, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub videos: Vec<WireRecord>,
}

/// Ids arrive as strings, older servers send integers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for RecordId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(text) => RecordId::from(text),
            WireId::Number(number) => RecordId::from(number.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireDuration {
    Seconds(f64),
    Formatted(String),
}

impl From<WireDuration> for RecordDuration {
    fn from(duration: WireDuration) -> Self {
        match duration {
            WireDuration::Seconds(secs) if secs.is_finite() && secs > 0.0 => {
                RecordDuration::Seconds(secs.round() as u64)
            }
            WireDuration::Seconds(_) => RecordDuration::Seconds(0),
            WireDuration::Formatted(text) => RecordDuration::Formatted(text),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireExtras {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRecord {
    pub id: WireId,
    #[serde(default)]
    pub title: String,
    pub duration: Option<WireDuration>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub modified_time: Option<f64>,
    #[serde(default)]
    pub extras: Option<WireExtras>,
}

impl From<WireRecord> for MediaRecord {
    fn from(wire: WireRecord) -> Self {
        let streams = wire.extras.map(|extras| extras.streams).unwrap_or_default();
        let size_bytes = wire
            .filesize
            .filter(|size| size.is_finite() && *size > 0.0)
            .map(|size| size as u64)
            .unwrap_or(0);
        let modified_at = wire
            .modified_time
            .filter(|ts| ts.is_finite())
            .map(|ts| ts.floor() as i64)
            .unwrap_or(0);

        MediaRecord::new(
            wire.id.into(),
            wire.title,
            size_bytes,
            modified_at,
            wire.duration.map(Into::into).unwrap_or_default(),
            &streams,
        )
    }
}

impl VideoList {
    pub fn into_records(self) -> Vec<MediaRecord> {
        self.videos.into_iter().map(MediaRecord::from).collect()
    }
}

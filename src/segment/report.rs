//! Segment completion reports emitted by the encoder

use crate::time::MediaTime;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Kind of a completed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// One-time container header
    Initialization,
    /// Independently decodable media chunk
    Separable,
    /// Any other notification code from the encoder
    Unrecognized(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
        }
    }
}

/// Timing of one track inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackReport {
    pub track_id: u32,
    pub media_type: MediaType,
    pub earliest_pts: MediaTime,
    pub duration: MediaTime,
}

/// One completed segment.
#[derive(Debug, Clone)]
pub struct SegmentReport {
    pub kind: SegmentKind,
    pub payload: Bytes,
    /// Encoder-side index, informational only
    pub sequence: Option<u64>,
    pub tracks: Vec<TrackReport>,
}

impl SegmentReport {
    pub fn initialization(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: SegmentKind::Initialization,
            payload: payload.into(),
            sequence: None,
            tracks: Vec::new(),
        }
    }

    pub fn separable(payload: impl Into<Bytes>, sequence: u64, tracks: Vec<TrackReport>) -> Self {
        Self {
            kind: SegmentKind::Separable,
            payload: payload.into(),
            sequence: Some(sequence),
            tracks,
        }
    }

    /// Track whose timing drives the playlist entry: the first track of
    /// `media_type`, falling back to the first track.
    pub fn timing_track(&self, media_type: MediaType) -> Option<&TrackReport> {
        self.tracks
            .iter()
            .find(|t| t.media_type == media_type)
            .or_else(|| self.tracks.first())
    }
}

//! Playlist generation module
//!
//! This module renders the recorded asset's HLS documents:
//! - Per-stream index playlists (`<prefix>.m3u8`), final VOD or in-progress EVENT
//! - The master playlist binding the video and audio renditions

pub mod index;
pub mod master;

pub use index::{render_empty_index, render_event_index, render_index, target_duration};
pub use master::{render_master, VariantAttributes};

use crate::time::MediaTime;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One separable segment as listed in an index playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistEntry {
    pub filename: String,
    pub duration: MediaTime,
    /// Wall-clock time of the segment's first frame (video only)
    pub program_date_time: Option<DateTime<Utc>>,
}

impl PlaylistEntry {
    pub fn new(filename: impl Into<String>, duration: MediaTime) -> Self {
        Self {
            filename: filename.into(),
            duration,
            program_date_time: None,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.seconds()
    }
}

/// File names of every document written for one recorded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetManifest {
    /// Master playlist, `<asset>.m3u8`
    pub master: String,
    pub video_index: String,
    pub app_audio_index: String,
    pub mic_audio_index: Option<String>,
    /// Separable segments per stream, in the same order as above
    pub segment_counts: Vec<usize>,
}

//! Encoder boundary
//!
//! The recorder never encodes media itself. Audio windows and video frames
//! are handed to a `MediaEncoder`, which reports completed segments on a
//! bounded channel drained by the stream's `SegmentMuxer`.

pub mod passthrough;

pub use passthrough::{PassthroughConfig, PassthroughEncoder, PassthroughFactory};

use crate::error::Result;
use crate::segment::{MediaType, SegmentReport};
use crate::time::MediaTime;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Sending half of an encoder's segment report channel
pub type SegmentSender = mpsc::Sender<SegmentReport>;
/// Receiving half, owned by the stream's drain thread
pub type SegmentReceiver = mpsc::Receiver<SegmentReport>;

/// Bounded report channel between an encoder and its muxer.
pub fn segment_channel(capacity: usize) -> (SegmentSender, SegmentReceiver) {
    mpsc::channel(capacity.max(1))
}

/// The three elementary streams of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    AppAudio,
    MicAudio,
}

impl StreamKind {
    pub fn media_type(self) -> MediaType {
        match self {
            StreamKind::Video => MediaType::Video,
            StreamKind::AppAudio | StreamKind::MicAudio => MediaType::Audio,
        }
    }

    /// Suffix appended to the asset prefix, `<asset>-<suffix>`.
    pub fn suffix(self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::AppAudio => "app",
            StreamKind::MicAudio => "mic",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One encoded unit with its timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    pub pts: MediaTime,
    pub duration: MediaTime,
    pub keyframe: bool,
    pub data: Bytes,
}

/// A raw captured video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pts: MediaTime,
    pub duration: MediaTime,
    pub data: Bytes,
}

/// Encoder and fragmented-container writer for one stream.
pub trait MediaEncoder: Send {
    /// `false` while the encoder's input queue is full.
    fn is_ready_for_more_media_data(&self) -> bool;

    /// Encode `num_samples` interleaved stereo frames from `pcm`.
    fn push_audio(
        &mut self,
        pcm: &[f32],
        num_samples: usize,
        pts: MediaTime,
    ) -> Result<Vec<EncodedPacket>>;

    fn push_video(&mut self, frame: VideoFrame) -> Result<()>;

    /// Drain pending input and emit the final segment. No report is sent
    /// after this returns.
    fn finish(&mut self) -> Result<()>;
}

/// Opens one encoder session per stream.
pub trait EncoderFactory: Send + Sync {
    fn create(&self, stream: StreamKind, reports: SegmentSender) -> Result<Box<dyn MediaEncoder>>;
}

//! Recording writers
//!
//! Ties capture input, resampling, encoder sessions and muxers together:
//! - `TrackWriter` for one encoder/muxer pair
//! - `VideoTrackWriter` and `AudioTrackWriter` for capture-side shaping
//! - `RecordSession` for the three-stream asset and its master playlist

pub mod session;
pub mod track;

pub use crate::encoder::StreamKind;
pub use session::{RecordSession, SessionOptions};
pub use track::{AudioTrackWriter, TrackWriter, VideoTrackWriter};

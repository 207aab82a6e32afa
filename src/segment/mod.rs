//! Segment handling module
//!
//! This module turns encoder segment reports into stored fMP4 files and
//! per-stream playlist entries.

pub mod muxer;
pub mod report;
pub mod store;

pub use muxer::{DurationStrategy, MuxerOptions, MuxerState, SegmentMuxer, WallClockAnchor};
pub use report::{MediaType, SegmentKind, SegmentReport, TrackReport};
pub use store::{DirectoryStore, MemoryStore, SegmentStore};

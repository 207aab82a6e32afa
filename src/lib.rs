//! HLS recording writer
//!
//! Turns real-time capture input (one video stream, app audio and an
//! optional microphone) into a fragmented-MP4 HLS asset: ring-buffer audio
//! resampling to the encoder rate, per-stream segment muxing with index
//! playlists, and a master playlist tying the renditions together.

pub mod config;
pub mod config_file;
pub mod encoder;
pub mod error;
pub mod http;
pub mod playlist;
pub mod resample;
pub mod segment;
pub mod synthetic;
pub mod time;
pub mod writer;


pub use error::{Result, WriterError};

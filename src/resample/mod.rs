//! Real-time audio sample-rate conversion
//!
//! This module turns PCM16 capture chunks into the fixed-rate stereo float
//! stream the encoder consumes:
//! - Rate-pair selection (`ResampleMode`)
//! - In-place conversion kernels (copy, x2, x6, 44.1 kHz -> 48 kHz)
//! - A fixed-capacity ring with a look-back head region
//! - `RingResampler`, which re-exposes a short back-off window on every append

pub mod convert;
pub mod mode;
pub mod resampler;
pub mod ring;

pub use mode::ResampleMode;
pub use resampler::{
    ByteOrder, CaptureFrame, ChannelLayout, ResampledFrame, RingResampler, BACK_OFF_FRAMES,
    HEAD_FRAMES,
};
pub use ring::SampleRingBuffer;

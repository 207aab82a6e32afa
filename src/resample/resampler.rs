//! Ring-buffered PCM16 -> float32 stereo resampler
//!
//! Each `append` converts one capture chunk into the ring body. The frame
//! handed to the encoder starts `BACK_OFF_FRAMES` before that body, so the
//! tail of the previous append is delivered again together with the new
//! samples and its timestamp is moved back by the same amount.

use super::convert::{self, PcmSource};
use super::mode::ResampleMode;
use super::ring::SampleRingBuffer;
use crate::error::{Result, WriterError};
use crate::time::MediaTime;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Look-back frames kept in front of every body
pub const HEAD_FRAMES: usize = 1024;
/// Frames re-exposed before the body on each `current_frame`
pub const BACK_OFF_FRAMES: usize = 8;
/// Default ring size in stereo frames
pub const DEFAULT_CAPACITY_FRAMES: usize = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Byte order of the int16 samples relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Native,
    Swapped,
}

/// One borrowed chunk of interleaved PCM16 capture audio.
#[derive(Debug, Clone, Copy)]
pub struct CaptureFrame<'a> {
    pub samples: &'a [i16],
    pub layout: ChannelLayout,
    pub byte_order: ByteOrder,
    pub sample_rate: u32,
    pub pts: MediaTime,
}

impl<'a> CaptureFrame<'a> {
    pub fn new(
        samples: &'a [i16],
        layout: ChannelLayout,
        byte_order: ByteOrder,
        sample_rate: u32,
        pts: MediaTime,
    ) -> Self {
        Self {
            samples,
            layout,
            byte_order,
            sample_rate,
            pts,
        }
    }

    /// Frames in the chunk (samples per channel).
    pub fn num_samples(&self) -> usize {
        self.samples.len() / self.layout.channels()
    }
}

/// Zero-copy view of the latest output, valid until the next `append`.
#[derive(Debug, Clone, Copy)]
pub struct ResampledFrame<'a> {
    /// Stereo frames in `data`
    pub num_samples: usize,
    /// Presentation time of the first frame in `data`
    pub pts: MediaTime,
    /// Interleaved left/right float32 samples
    pub data: &'a [f32],
}

impl ResampledFrame<'_> {
    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }
}

/// Fixed-output-rate resampler over a `SampleRingBuffer`.
///
/// Not shareable: callers keep one instance per audio stream and serialize
/// calls to it.
#[derive(Debug)]
pub struct RingResampler {
    ring: SampleRingBuffer,
    output_rate: u32,
    back_off: MediaTime,
    num_samples: usize,
    pts: MediaTime,
}

impl RingResampler {
    /// Create a resampler producing `output_rate` Hz stereo.
    pub fn new(output_rate: u32) -> Result<Self> {
        Self::with_capacity(output_rate, DEFAULT_CAPACITY_FRAMES)
    }

    pub fn with_capacity(output_rate: u32, capacity_frames: usize) -> Result<Self> {
        let mut resampler = Self {
            ring: SampleRingBuffer::new(capacity_frames, HEAD_FRAMES),
            output_rate: 0,
            back_off: MediaTime::zero(),
            num_samples: 0,
            pts: MediaTime::zero(),
        };
        resampler.configure(output_rate)?;
        Ok(resampler)
    }

    /// Fix the output rate and derive the back-off duration from it.
    pub fn configure(&mut self, output_rate: u32) -> Result<()> {
        if output_rate == 0 {
            return Err(WriterError::Config(
                "Resampler output rate must be non-zero".to_string(),
            ));
        }
        self.output_rate = output_rate;
        self.back_off = MediaTime::from_samples(BACK_OFF_FRAMES, output_rate);
        Ok(())
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Duration of the back-off window at the output rate.
    pub fn back_off(&self) -> MediaTime {
        self.back_off
    }

    /// Convert one capture chunk into the ring.
    ///
    /// Only an unsupported rate pair fails; the ring and current state are
    /// left as they were in that case. Empty chunks only update the pts.
    pub fn append(&mut self, frame: &CaptureFrame<'_>) -> Result<()> {
        let mode = ResampleMode::select(frame.sample_rate, self.output_rate)?;
        let input_frames = frame.num_samples();

        if input_frames == 0 {
            self.num_samples = 0;
            self.pts = frame.pts;
            return Ok(());
        }

        let source = PcmSource::new(frame.samples, frame.layout, frame.byte_order);
        let output_frames = mode.output_len(input_frames);

        self.ring
            .shift_then_write(output_frames, |buf, body| match mode {
                ResampleMode::Copy => convert::copy(buf, body, &source),
                ResampleMode::UpsampleBy2 => convert::upsample(buf, body, &source, 2),
                ResampleMode::UpsampleBy6 => convert::upsample(buf, body, &source, 6),
                ResampleMode::Linear44100To48000 => {
                    convert::linear_44100_to_48000(buf, body, &source);
                }
            });

        trace!(
            "Resampled {} frames at {} Hz into {} frames ({:?})",
            input_frames,
            frame.sample_rate,
            output_frames,
            mode
        );

        self.num_samples = output_frames;
        self.pts = frame.pts;
        Ok(())
    }

    /// The latest output, starting `BACK_OFF_FRAMES` before the new body.
    pub fn current_frame(&self) -> ResampledFrame<'_> {
        ResampledFrame {
            num_samples: self.num_samples,
            pts: self.pts - self.back_off,
            data: self.ring.window(BACK_OFF_FRAMES, self.num_samples),
        }
    }
}

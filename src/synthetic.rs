//! Synthetic capture sources
//!
//! Deterministic stand-ins for a screen/audio capture device, used by the
//! `demo` command and the integration tests.

use crate::encoder::VideoFrame;
use crate::resample::{ByteOrder, ChannelLayout};
use crate::time::MediaTime;
use bytes::Bytes;

/// Host clock timescale used for synthetic video timestamps
pub const HOST_CLOCK_TIMESCALE: u32 = 1_000_000_000;

/// Sine tone delivered as PCM16 chunks.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    sample_rate: u32,
    layout: ChannelLayout,
    byte_order: ByteOrder,
    frequency: f64,
    amplitude: f64,
    chunk_frames: usize,
    produced: u64,
}

impl ToneGenerator {
    pub fn new(
        sample_rate: u32,
        layout: ChannelLayout,
        frequency: f64,
        chunk_frames: usize,
    ) -> Self {
        Self {
            sample_rate,
            layout,
            byte_order: ByteOrder::Native,
            frequency,
            amplitude: 0.25,
            chunk_frames,
            produced: 0,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Samples produced so far, per channel.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Next interleaved chunk and the pts of its first frame.
    pub fn next_chunk(&mut self) -> (Vec<i16>, MediaTime) {
        let pts = MediaTime::new(self.produced as i64, self.sample_rate);
        let channels = self.layout.channels();
        let mut samples = Vec::with_capacity(self.chunk_frames * channels);

        for i in 0..self.chunk_frames {
            let t = (self.produced + i as u64) as f64 / self.sample_rate as f64;
            let value = (t * self.frequency * std::f64::consts::TAU).sin() * self.amplitude;
            let sample = (value * i16::MAX as f64).round() as i16;
            let sample = match self.byte_order {
                ByteOrder::Native => sample,
                ByteOrder::Swapped => sample.swap_bytes(),
            };
            for _ in 0..channels {
                samples.push(sample);
            }
        }

        self.produced += self.chunk_frames as u64;
        (samples, pts)
    }
}

/// Moving-bar test pattern stamped with host-clock timestamps.
#[derive(Debug, Clone)]
pub struct TestPatternGenerator {
    width: u32,
    height: u32,
    frame_rate: u32,
    index: u64,
}

impl TestPatternGenerator {
    pub fn new(width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            width,
            height,
            frame_rate: frame_rate.max(1),
            index: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.index
    }

    pub fn next_frame(&mut self) -> VideoFrame {
        let nanos = self.index as i128 * HOST_CLOCK_TIMESCALE as i128 / self.frame_rate as i128;
        let pts = MediaTime::new(nanos as i64, HOST_CLOCK_TIMESCALE);

        // One luma byte per pixel, a bright bar sweeping left to right
        let bar = (self.index % self.width.max(1) as u64) as u32;
        let mut data = vec![16u8; (self.width * self.height) as usize];
        for row in 0..self.height {
            let at = (row * self.width + bar) as usize;
            if let Some(px) = data.get_mut(at) {
                *px = 235;
            }
        }

        self.index += 1;
        VideoFrame {
            width: self.width,
            height: self.height,
            pts,
            duration: MediaTime::new(1, self.frame_rate),
            data: Bytes::from(data),
        }
    }
}

//! Fixed-capacity interleaved stereo sample ring
//!
//! Layout, in stereo frames:
//!
//! ```text
//! | head (look-back) | body (last append) | spare |
//! 0                  head                 head + body
//! ```
//!
//! Before each write the tail of the previous body is moved to the front,
//! so the head always holds the most recent `head` frames already produced.

/// Interleaved stereo float32 frames with a look-back head region.
#[derive(Debug)]
pub struct SampleRingBuffer {
    data: Vec<f32>,
    head_frames: usize,
    body_frames: usize,
}

const CHANNELS: usize = 2;

impl SampleRingBuffer {
    /// Create a ring holding `capacity_frames` frames in total, the first
    /// `head_frames` of which form the look-back region.
    pub fn new(capacity_frames: usize, head_frames: usize) -> Self {
        let capacity_frames = capacity_frames.max(head_frames * 2);
        Self {
            data: vec![0.0; capacity_frames * CHANNELS],
            head_frames,
            body_frames: 0,
        }
    }

    pub fn head_frames(&self) -> usize {
        self.head_frames
    }

    pub fn body_frames(&self) -> usize {
        self.body_frames
    }

    /// Frames available for a single body write.
    pub fn body_capacity(&self) -> usize {
        self.data.len() / CHANNELS - self.head_frames
    }

    /// The only mutation entry point: shift the previous body's tail into
    /// the head, make room for `body_frames` new frames, then let `write`
    /// fill them.
    ///
    /// `write` receives the head and body as one slice together with the
    /// float index where the body starts, so kernels may read (and
    /// overwrite) frames just before the body.
    pub fn shift_then_write<F>(&mut self, body_frames: usize, write: F)
    where
        F: FnOnce(&mut [f32], usize),
    {
        self.shift();

        if body_frames > self.body_capacity() {
            let frames = self.head_frames + body_frames;
            tracing::warn!(
                "Ring buffer grown from {} to {} frames for an oversized append",
                self.data.len() / CHANNELS,
                frames
            );
            self.data.resize(frames * CHANNELS, 0.0);
        }

        let body_start = self.head_frames * CHANNELS;
        let end = body_start + body_frames * CHANNELS;
        debug_assert!(end <= self.data.len());
        write(&mut self.data[..end], body_start);
        self.body_frames = body_frames;
    }

    /// Window of `len` frames starting `back_off` frames before the body.
    pub fn window(&self, back_off: usize, len: usize) -> &[f32] {
        debug_assert!(back_off <= self.head_frames);
        let start = (self.head_frames - back_off) * CHANNELS;
        let end = start + len * CHANNELS;
        debug_assert!(end <= self.data.len());
        &self.data[start..end]
    }

    fn shift(&mut self) {
        let from = self.body_frames * CHANNELS;
        let len = self.head_frames * CHANNELS;
        self.data.copy_within(from..from + len, 0);
    }
}

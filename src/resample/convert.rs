//! PCM16 -> float32 stereo conversion kernels
//!
//! Every kernel writes interleaved stereo frames into a ring slice whose
//! body starts at float index `body`. Channel layout and byte order are
//! decoded by `PcmSource`, so they never affect sample-count math.

use super::resampler::{ByteOrder, ChannelLayout};

/// `1 / 32768`, the int16 full-scale factor.
pub const INT16_SCALE: f64 = 3.0517578125e-05;

/// Read-only view over one interleaved PCM16 chunk.
#[derive(Debug, Clone, Copy)]
pub struct PcmSource<'a> {
    samples: &'a [i16],
    layout: ChannelLayout,
    byte_order: ByteOrder,
}

impl<'a> PcmSource<'a> {
    pub fn new(samples: &'a [i16], layout: ChannelLayout, byte_order: ByteOrder) -> Self {
        Self {
            samples,
            layout,
            byte_order,
        }
    }

    /// Number of complete frames in the chunk.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.layout.channels()
    }

    #[inline]
    fn decode(&self, raw: i16) -> f64 {
        let value = match self.byte_order {
            ByteOrder::Native => raw,
            ByteOrder::Swapped => raw.swap_bytes(),
        };
        value as f64 * INT16_SCALE
    }

    /// Left/right pair of frame `i`; mono is duplicated to both sides.
    #[inline]
    pub fn frame(&self, i: usize) -> (f64, f64) {
        match self.layout {
            ChannelLayout::Mono => {
                let x = self.decode(self.samples[i]);
                (x, x)
            }
            ChannelLayout::Stereo => (
                self.decode(self.samples[i * 2]),
                self.decode(self.samples[i * 2 + 1]),
            ),
        }
    }
}

#[inline]
fn put(dst: &mut [f32], frame: usize, (l, r): (f64, f64)) {
    dst[frame * 2] = l as f32;
    dst[frame * 2 + 1] = r as f32;
}

/// Same-rate copy: `n` frames written at the body start.
pub fn copy(dst: &mut [f32], body: usize, src: &PcmSource<'_>) {
    let out = &mut dst[body..];
    for i in 0..src.frames() {
        put(out, i, src.frame(i));
    }
}

/// Integer upsampling by `factor` with linear interpolation.
///
/// The previous append left its last input sample `factor` frames before
/// the body. The first run interpolates from that frame to the first new
/// sample, so output starts `factor - 1` frames before the body and the
/// last `factor - 1` body frames are completed by the next append.
/// Requires `body >= 2 * factor`, which the ring head guarantees.
pub fn upsample(dst: &mut [f32], body: usize, src: &PcmSource<'_>, factor: usize) {
    let n = src.frames();
    if n == 0 {
        return;
    }
    debug_assert!(body >= factor * 2 * 2);
    let step = factor as f64;

    // Frame index `k` (relative to the body) lives at float `body + 2k`
    let base = body - factor * 2;
    let (x0, y0) = (dst[base] as f64, dst[base + 1] as f64);
    let (x1, y1) = src.frame(0);
    for j in 1..=factor {
        let t = j as f64;
        let at = base + j * 2;
        dst[at] = (x0 + (x1 - x0) * t / step) as f32;
        dst[at + 1] = (y0 + (y1 - y0) * t / step) as f32;
    }

    let out = &mut dst[body..];
    for i in 0..n - 1 {
        let (x0, y0) = src.frame(i);
        let (x1, y1) = src.frame(i + 1);
        for j in 1..=factor {
            let t = j as f64;
            put(
                out,
                i * factor + j,
                (x0 + (x1 - x0) * t / step, y0 + (y1 - y0) * t / step),
            );
        }
    }
}

/// 44100 Hz -> 48000 Hz linear interpolation; returns the frames written.
///
/// Output frame `i` samples the input at `p = i * 44100 / 48000`. The
/// right-hand neighbour of the final input frame is clamped to itself.
pub fn linear_44100_to_48000(dst: &mut [f32], body: usize, src: &PcmSource<'_>) -> usize {
    let n = src.frames();
    let out_count = (n as u64 * 48_000 / 44_100) as usize;
    let out = &mut dst[body..];
    for i in 0..out_count {
        let p = (i as u64 * 44_100) as f64 / 48_000.0;
        let j = p.floor() as usize;
        let frac = p - j as f64;
        let (x0, y0) = src.frame(j);
        let (x1, y1) = src.frame((j + 1).min(n - 1));
        put(out, i, (x0 + frac * (x1 - x0), y0 + frac * (y1 - y0)));
    }
    out_count
}

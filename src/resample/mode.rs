//! Supported input/output sample-rate pairs

use crate::error::{Result, WriterError};

/// Conversion selected for one `(input_rate, output_rate)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMode {
    /// Same rate: int16 -> float scale only
    Copy,
    /// Output rate is exactly twice the input rate
    UpsampleBy2,
    /// Output rate is exactly six times the input rate
    UpsampleBy6,
    /// 44100 Hz -> 48000 Hz linear interpolation
    Linear44100To48000,
}

impl ResampleMode {
    /// Pick the mode for a rate pair, failing for anything unsupported.
    pub fn select(input_rate: u32, output_rate: u32) -> Result<Self> {
        let input = input_rate as u64;
        let output = output_rate as u64;
        if input == 0 || output == 0 {
            return Err(WriterError::UnsupportedRateRatio {
                input_rate,
                output_rate,
            });
        }

        if input == output {
            Ok(ResampleMode::Copy)
        } else if input * 2 == output {
            Ok(ResampleMode::UpsampleBy2)
        } else if input * 6 == output {
            Ok(ResampleMode::UpsampleBy6)
        } else if input_rate == 44_100 && output_rate == 48_000 {
            Ok(ResampleMode::Linear44100To48000)
        } else {
            Err(WriterError::UnsupportedRateRatio {
                input_rate,
                output_rate,
            })
        }
    }

    /// Integer expansion factor, `None` for the fractional mode.
    pub fn factor(self) -> Option<usize> {
        match self {
            ResampleMode::Copy => Some(1),
            ResampleMode::UpsampleBy2 => Some(2),
            ResampleMode::UpsampleBy6 => Some(6),
            ResampleMode::Linear44100To48000 => None,
        }
    }

    /// Number of output frames produced from `input_frames` input frames.
    pub fn output_len(self, input_frames: usize) -> usize {
        match self.factor() {
            Some(n) => input_frames * n,
            None => (input_frames as u64 * 48_000 / 44_100) as usize,
        }
    }
}

//! Recorder configuration

use crate::error::{Result, WriterError};
use crate::playlist::VariantAttributes;
use crate::segment::DurationStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Segment cache configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum memory usage for segment cache in megabytes
    pub max_memory_mb: usize,

    /// Maximum number of segments to cache
    pub max_segments: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 256,
            max_segments: 200,
        }
    }
}

impl CacheConfig {
    /// Get maximum memory in bytes
    pub fn max_memory_bytes(&self) -> usize {
        self.max_memory_mb * 1024 * 1024
    }
}

/// What gets recorded and where
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Directory receiving segments and playlists
    pub output_dir: PathBuf,

    /// Asset prefix; streams are written as `<prefix>-video`, `-app`, `-mic`
    pub asset_prefix: String,

    /// Record the microphone rendition
    pub mic_enabled: bool,

    /// Rewrite EVENT playlists while recording
    pub incremental_playlist: bool,

    /// Length of the synthetic `demo` recording in seconds
    pub demo_seconds: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            asset_prefix: "recording".to_string(),
            mic_enabled: true,
            incremental_playlist: false,
            demo_seconds: 20,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate every audio stream is resampled to
    pub output_sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_sample_rate: 48000,
        }
    }
}

/// Video input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Frame rate; video pts are rescaled to this timescale
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            width: 320,
            height: 180,
        }
    }
}

/// Segmenting and encoder hand-off configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Segment interval in seconds, also the target duration hint
    pub interval_secs: u32,

    /// How EXTINF durations are resolved
    pub duration_strategy: DurationStrategy,

    /// Segment reports buffered between an encoder and its muxer
    pub report_channel_capacity: usize,

    /// Input units buffered by the encoder before it reports not-ready
    pub encoder_queue_depth: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            interval_secs: 6,
            duration_strategy: DurationStrategy::Reported,
            report_channel_capacity: 16,
            encoder_queue_depth: 256,
        }
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    pub recording: RecordingConfig,
    pub audio: AudioConfig,
    pub video: VideoConfig,
    pub segment: SegmentConfig,

    /// Attributes of the master playlist's video variant
    pub variant: VariantAttributes,

    pub cache: CacheConfig,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            recording: RecordingConfig::default(),
            audio: AudioConfig::default(),
            video: VideoConfig::default(),
            segment: SegmentConfig::default(),
            variant: VariantAttributes::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl WriterConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values the recorder cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.output_sample_rate == 0 {
            return Err(WriterError::Config(
                "audio.output_sample_rate must be non-zero".to_string(),
            ));
        }
        if self.video.frame_rate == 0 {
            return Err(WriterError::Config(
                "video.frame_rate must be non-zero".to_string(),
            ));
        }
        if self.segment.interval_secs == 0 {
            return Err(WriterError::Config(
                "segment.interval_secs must be non-zero".to_string(),
            ));
        }
        if self.segment.report_channel_capacity == 0 || self.segment.encoder_queue_depth == 0 {
            return Err(WriterError::Config(
                "segment channel capacities must be non-zero".to_string(),
            ));
        }
        if self.recording.asset_prefix.is_empty() {
            return Err(WriterError::Config(
                "recording.asset_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: WriterConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

//! Configuration file support
//!
//! Loads recorder configuration from TOML files. Every section except
//! `[server]` and `[recording]` may be omitted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::WriterConfig;
use crate::playlist::VariantAttributes;
use crate::segment::DurationStrategy;

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Recording settings
    pub recording: RecordingSettings,
    /// Audio settings
    pub audio: Option<AudioSettings>,
    /// Video settings
    pub video: Option<VideoSettings>,
    /// Segment settings
    pub segment: Option<SegmentSettings>,
    /// Master playlist settings
    pub master: Option<MasterSettings>,
    /// Cache settings
    pub cache: Option<CacheSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Output directory
    pub output_dir: PathBuf,
    /// Asset prefix
    pub asset_prefix: String,
    /// Record the microphone
    pub mic_enabled: Option<bool>,
    /// Rewrite playlists while recording
    pub incremental_playlist: Option<bool>,
    /// Synthetic demo length in seconds
    pub demo_seconds: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Output sample rate
    pub output_sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Frame rate
    pub frame_rate: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSettings {
    /// Segment interval in seconds
    pub interval_secs: u32,
    /// `reported` or `earliest_pts_delta`
    pub duration_strategy: Option<DurationStrategy>,
    pub report_channel_capacity: Option<usize>,
    pub encoder_queue_depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterSettings {
    pub bandwidth: Option<u64>,
    pub codecs: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum memory usage in MB
    pub max_memory_mb: usize,
    /// Maximum number of cached segments
    pub max_segments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            recording: RecordingSettings {
                output_dir: PathBuf::from("recordings"),
                asset_prefix: "recording".to_string(),
                mic_enabled: Some(true),
                incremental_playlist: Some(false),
                demo_seconds: Some(20),
            },
            audio: Some(AudioSettings {
                output_sample_rate: 48000,
            }),
            video: Some(VideoSettings {
                frame_rate: 60,
                width: Some(320),
                height: Some(180),
            }),
            segment: Some(SegmentSettings {
                interval_secs: 6,
                duration_strategy: Some(DurationStrategy::Reported),
                report_channel_capacity: Some(16),
                encoder_queue_depth: Some(256),
            }),
            master: Some(MasterSettings {
                bandwidth: Some(150_000),
                codecs: Some("avc1.42e00a,mp4a.40.2".to_string()),
            }),
            cache: Some(CacheSettings {
                max_memory_mb: 256,
                max_segments: 200,
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to WriterConfig, filling omitted values with defaults
    pub fn into_writer_config(self) -> WriterConfig {
        let defaults = WriterConfig::default();
        let variant_defaults = VariantAttributes::default();

        WriterConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or(defaults.log_level),
            log_format: self
                .logging
                .and_then(|l| l.format)
                .unwrap_or(defaults.log_format),
            recording: crate::config::RecordingConfig {
                output_dir: self.recording.output_dir,
                asset_prefix: self.recording.asset_prefix,
                mic_enabled: self.recording.mic_enabled.unwrap_or(true),
                incremental_playlist: self.recording.incremental_playlist.unwrap_or(false),
                demo_seconds: self
                    .recording
                    .demo_seconds
                    .unwrap_or(defaults.recording.demo_seconds),
            },
            audio: self
                .audio
                .map(|a| crate::config::AudioConfig {
                    output_sample_rate: a.output_sample_rate,
                })
                .unwrap_or(defaults.audio),
            video: match self.video {
                Some(v) => crate::config::VideoConfig {
                    frame_rate: v.frame_rate,
                    width: v.width.unwrap_or(defaults.video.width),
                    height: v.height.unwrap_or(defaults.video.height),
                },
                None => defaults.video,
            },
            segment: match self.segment {
                Some(s) => crate::config::SegmentConfig {
                    interval_secs: s.interval_secs,
                    duration_strategy: s.duration_strategy.unwrap_or_default(),
                    report_channel_capacity: s
                        .report_channel_capacity
                        .unwrap_or(defaults.segment.report_channel_capacity),
                    encoder_queue_depth: s
                        .encoder_queue_depth
                        .unwrap_or(defaults.segment.encoder_queue_depth),
                },
                None => defaults.segment,
            },
            variant: match self.master {
                Some(m) => VariantAttributes {
                    bandwidth: m.bandwidth.unwrap_or(variant_defaults.bandwidth),
                    codecs: m.codecs.unwrap_or(variant_defaults.codecs),
                },
                None => variant_defaults,
            },
            cache: self
                .cache
                .map(|c| crate::config::CacheConfig {
                    max_memory_mb: c.max_memory_mb,
                    max_segments: c.max_segments,
                })
                .unwrap_or(defaults.cache),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

//! Three-stream recording session
//!
//! Video, app audio and (optionally) mic audio each get their own track
//! writer behind its own lock, so the capture producers never contend with
//! each other. Closing drains all tracks and writes the master playlist.

use super::track::{AudioTrackWriter, TrackWriter, VideoTrackWriter};
use crate::config::WriterConfig;
use crate::encoder::{EncoderFactory, PassthroughConfig, StreamKind, VideoFrame};
use crate::error::{Result, WriterError};
use crate::playlist::{render_master, AssetManifest, VariantAttributes};
use crate::resample::CaptureFrame;
use crate::segment::{DurationStrategy, MuxerOptions, SegmentMuxer, SegmentStore};
use crate::time::MediaTime;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything a session needs besides its store and encoder factory.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub asset_prefix: String,
    pub mic_enabled: bool,
    pub audio_output_rate: u32,
    pub frame_rate: u32,
    pub segment_interval_secs: u32,
    pub duration_strategy: DurationStrategy,
    pub incremental_playlist: bool,
    pub report_channel_capacity: usize,
    pub variant: VariantAttributes,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&WriterConfig::default())
    }
}

impl From<&WriterConfig> for SessionOptions {
    fn from(config: &WriterConfig) -> Self {
        Self {
            asset_prefix: config.recording.asset_prefix.clone(),
            mic_enabled: config.recording.mic_enabled,
            audio_output_rate: config.audio.output_sample_rate,
            frame_rate: config.video.frame_rate,
            segment_interval_secs: config.segment.interval_secs,
            duration_strategy: config.segment.duration_strategy,
            incremental_playlist: config.recording.incremental_playlist,
            report_channel_capacity: config.segment.report_channel_capacity,
            variant: config.variant.clone(),
        }
    }
}

impl SessionOptions {
    /// Matching settings for the built-in passthrough encoder.
    pub fn passthrough_config(&self, queue_depth: usize) -> PassthroughConfig {
        PassthroughConfig {
            segment_interval: MediaTime::new(self.segment_interval_secs as i64, 1),
            queue_depth,
            audio_sample_rate: self.audio_output_rate,
        }
    }

    fn stream_prefix(&self, stream: StreamKind) -> String {
        format!("{}-{}", self.asset_prefix, stream.suffix())
    }
}

/// Result of the first `close`, replayed by every later one.
enum CloseOutcome {
    Finished(AssetManifest),
    Failed(String),
}

/// A running recording of one asset.
pub struct RecordSession {
    id: Uuid,
    options: SessionOptions,
    store: Arc<dyn SegmentStore>,
    video: Mutex<VideoTrackWriter>,
    app_audio: Mutex<AudioTrackWriter>,
    mic_audio: Option<Mutex<AudioTrackWriter>>,
    /// Pts of the first video frame; audio before it is ignored
    start_pts: Mutex<Option<MediaTime>>,
    closing: AtomicBool,
    outcome: Mutex<Option<CloseOutcome>>,
}

impl RecordSession {
    /// Open encoders and muxers for every stream.
    pub fn start(
        options: SessionOptions,
        store: Arc<dyn SegmentStore>,
        factory: &dyn EncoderFactory,
    ) -> Result<Self> {
        if options.asset_prefix.is_empty() {
            return Err(WriterError::Config("asset prefix must not be empty".to_string()));
        }

        let id = Uuid::new_v4();
        let open = |stream: StreamKind| -> Result<TrackWriter> {
            let mut muxer_options =
                MuxerOptions::new(options.stream_prefix(stream), stream.media_type());
            muxer_options.duration_strategy = options.duration_strategy;
            muxer_options.target_duration_hint = options.segment_interval_secs;
            muxer_options.incremental = options.incremental_playlist;
            let muxer = Arc::new(SegmentMuxer::new(muxer_options, store.clone()));
            TrackWriter::open(stream, factory, muxer, options.report_channel_capacity)
        };

        let video = VideoTrackWriter::new(open(StreamKind::Video)?, options.frame_rate);
        let app_audio =
            AudioTrackWriter::new(open(StreamKind::AppAudio)?, options.audio_output_rate)?;
        let mic_audio = if options.mic_enabled {
            Some(Mutex::new(AudioTrackWriter::new(
                open(StreamKind::MicAudio)?,
                options.audio_output_rate,
            )?))
        } else {
            None
        };

        info!(
            "Recording session {} started: {} (mic {})",
            id,
            options.asset_prefix,
            if options.mic_enabled { "on" } else { "off" }
        );

        Ok(Self {
            id,
            options,
            store,
            video: Mutex::new(video),
            app_audio: Mutex::new(app_audio),
            mic_audio,
            start_pts: Mutex::new(None),
            closing: AtomicBool::new(false),
            outcome: Mutex::new(None),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn master_filename(&self) -> String {
        format!("{}.m3u8", self.options.asset_prefix)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closing.load(Ordering::Acquire) {
            return Err(WriterError::SessionClosed);
        }
        Ok(())
    }

    /// Feed one captured video frame. The first frame starts the session.
    pub fn append_video(&self, frame: VideoFrame) -> Result<()> {
        self.ensure_open()?;
        {
            let mut start = self.start_pts.lock();
            if start.is_none() {
                debug!("Session {} starts at {}", self.id, frame.pts);
                *start = Some(frame.pts);
            }
        }
        self.video.lock().append(frame)
    }

    pub fn append_app_audio(&self, frame: &CaptureFrame<'_>) -> Result<()> {
        self.ensure_open()?;
        if !self.started_by(frame.pts) {
            return Ok(());
        }
        self.app_audio.lock().append(frame)
    }

    /// Feed microphone audio; ignored when the mic rendition is disabled.
    pub fn append_mic_audio(&self, frame: &CaptureFrame<'_>) -> Result<()> {
        self.ensure_open()?;
        let Some(mic) = &self.mic_audio else {
            return Ok(());
        };
        if !self.started_by(frame.pts) {
            return Ok(());
        }
        mic.lock().append(frame)
    }

    fn started_by(&self, pts: MediaTime) -> bool {
        match *self.start_pts.lock() {
            Some(start) => pts >= start,
            None => false,
        }
    }

    /// Finish every stream and write the master playlist.
    ///
    /// Safe to call repeatedly: later calls return the same manifest, or
    /// fail again when the first close failed. The master playlist is
    /// never written once a track has failed.
    pub fn close(&self) -> Result<AssetManifest> {
        self.closing.store(true, Ordering::Release);

        let mut outcome = self.outcome.lock();
        match outcome.as_ref() {
            Some(CloseOutcome::Finished(done)) => return Ok(done.clone()),
            Some(CloseOutcome::Failed(reason)) => {
                return Err(WriterError::StreamAborted(reason.clone()))
            }
            None => {}
        }

        let result = self.finish();
        *outcome = Some(match &result {
            Ok(done) => CloseOutcome::Finished(done.clone()),
            Err(e) => CloseOutcome::Failed(format!("session {}: {}", self.id, e)),
        });
        result
    }

    fn finish(&self) -> Result<AssetManifest> {
        // Every track is drained even when an earlier one failed
        let mut first_error = None;
        let mut record = |result: Result<()>, stream: StreamKind| {
            if let Err(e) = result {
                warn!("Session {}: closing {} failed: {}", self.id, stream, e);
                first_error.get_or_insert(e);
            }
        };
        record(self.video.lock().close(), StreamKind::Video);
        record(self.app_audio.lock().close(), StreamKind::AppAudio);
        if let Some(mic) = &self.mic_audio {
            record(mic.lock().close(), StreamKind::MicAudio);
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let video_muxer = self.video.lock().track().muxer().clone();
        let app_muxer = self.app_audio.lock().track().muxer().clone();
        let mic_muxer = self
            .mic_audio
            .as_ref()
            .map(|mic| mic.lock().track().muxer().clone());

        let video_index = video_muxer.index_filename();
        let app_index = app_muxer.index_filename();
        let mic_index = mic_muxer.as_ref().map(|m| m.index_filename());

        let document = render_master(
            &video_index,
            Some(&app_index),
            mic_index.as_deref(),
            &self.options.variant,
        );
        let master = self.master_filename();
        self.store.write_playlist(&master, &document)?;

        let mut segment_counts = vec![video_muxer.entries().len(), app_muxer.entries().len()];
        if let Some(mic) = &mic_muxer {
            segment_counts.push(mic.entries().len());
        }

        info!(
            "Recording session {} closed: {} ({:?} segments)",
            self.id, master, segment_counts
        );

        Ok(AssetManifest {
            master,
            video_index,
            app_audio_index: app_index,
            mic_audio_index: mic_index,
            segment_counts,
        })
    }
}

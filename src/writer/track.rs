//! Per-stream writers
//!
//! A `TrackWriter` owns one encoder session and the muxer its segment
//! reports drain into. The video and audio writers put the capture-side
//! shaping in front of it: pts rescaling, resampling and dropping input
//! while the encoder is not ready.

use crate::encoder::{segment_channel, EncoderFactory, MediaEncoder, StreamKind, VideoFrame};
use crate::error::{Result, WriterError};
use crate::resample::{CaptureFrame, RingResampler};
use crate::segment::{SegmentMuxer, WallClockAnchor};
use crate::time::{MediaTime, Rounding};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, warn};

/// Encoder session plus the thread feeding its reports to a muxer.
pub struct TrackWriter {
    stream: StreamKind,
    encoder: Box<dyn MediaEncoder>,
    muxer: Arc<SegmentMuxer>,
    drain: Option<JoinHandle<()>>,
    failure: Arc<Mutex<Option<WriterError>>>,
    /// First fatal error, reported again by every later close
    aborted: Option<String>,
    closed: bool,
}

impl TrackWriter {
    pub fn open(
        stream: StreamKind,
        factory: &dyn EncoderFactory,
        muxer: Arc<SegmentMuxer>,
        report_capacity: usize,
    ) -> Result<Self> {
        let (reports, mut rx) = segment_channel(report_capacity);
        let encoder = factory.create(stream, reports)?;

        let failure: Arc<Mutex<Option<WriterError>>> = Arc::new(Mutex::new(None));
        let drain = {
            let muxer = muxer.clone();
            let failure = failure.clone();
            std::thread::Builder::new()
                .name(format!("drain-{}", stream))
                .spawn(move || {
                    while let Some(report) = rx.blocking_recv() {
                        if failure.lock().is_some() {
                            debug!("{}: discarding segment after failure", stream);
                            continue;
                        }
                        if let Err(e) = muxer.on_segment(report) {
                            error!("{}: segment handling failed: {}", stream, e);
                            *failure.lock() = Some(e);
                        }
                    }
                })
                .map_err(|e| {
                    WriterError::EncoderSession(format!("{}: failed to start drain: {}", stream, e))
                })?
        };

        Ok(Self {
            stream,
            encoder,
            muxer,
            drain: Some(drain),
            failure,
            aborted: None,
            closed: false,
        })
    }

    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    pub fn muxer(&self) -> &Arc<SegmentMuxer> {
        &self.muxer
    }

    /// `true` once a segment report failed or close hit a fatal error.
    pub fn has_failed(&self) -> bool {
        self.aborted.is_some() || self.failure.lock().is_some()
    }

    /// Refuse input once the stream is closed or aborted.
    fn ensure_accepting(&self) -> Result<()> {
        if self.closed {
            return Err(WriterError::SessionClosed);
        }
        if self.has_failed() {
            return Err(WriterError::StreamAborted(format!(
                "{}: segment handling failed",
                self.stream
            )));
        }
        Ok(())
    }

    /// Drain the encoder, wait for its last report, then finalize the
    /// muxer. A failed close fails again on every later call.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return match &self.aborted {
                Some(reason) => Err(WriterError::StreamAborted(reason.clone())),
                None => Ok(()),
            };
        }
        self.closed = true;

        let result = self.finish_stream();
        if let Err(e) = &result {
            self.aborted = Some(format!("{}: {}", self.stream, e));
        }
        result
    }

    fn finish_stream(&mut self) -> Result<()> {
        let finished = self.encoder.finish();

        if let Some(drain) = self.drain.take() {
            drain.join().map_err(|_| {
                WriterError::Muxing(format!("{}: drain thread panicked", self.stream))
            })?;
        }

        finished?;
        if let Some(e) = self.failure.lock().take() {
            return Err(e);
        }
        self.muxer.close()
    }
}

/// Video track: rescales pts to the frame rate and anchors wall-clock time.
pub struct VideoTrackWriter {
    track: TrackWriter,
    frame_rate: u32,
    anchored: bool,
    frames: u64,
    dropped: u64,
}

impl VideoTrackWriter {
    pub fn new(track: TrackWriter, frame_rate: u32) -> Self {
        Self {
            track,
            frame_rate: frame_rate.max(1),
            anchored: false,
            frames: 0,
            dropped: 0,
        }
    }

    pub fn append(&mut self, frame: VideoFrame) -> Result<()> {
        self.append_at(frame, Utc::now())
    }

    /// Append a frame that arrived at `arrival`.
    pub fn append_at(&mut self, frame: VideoFrame, arrival: DateTime<Utc>) -> Result<()> {
        self.track.ensure_accepting()?;

        let pts = frame
            .pts
            .rescale(self.frame_rate, Rounding::TowardPositiveInfinity);

        if !self.anchored {
            self.track.muxer().set_wall_clock_anchor(WallClockAnchor {
                first_frame_arrival: arrival,
                session_start_pts: pts,
            });
            self.anchored = true;
        }

        if !self.track.encoder.is_ready_for_more_media_data() {
            self.drop_frame(pts);
            return Ok(());
        }

        let frame = VideoFrame {
            pts,
            duration: MediaTime::new(1, self.frame_rate),
            ..frame
        };
        match self.track.encoder.push_video(frame) {
            Ok(()) => {
                self.frames += 1;
                Ok(())
            }
            Err(e) if e.is_transient() => {
                self.drop_frame(pts);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn drop_frame(&mut self, pts: MediaTime) {
        self.dropped += 1;
        warn!(
            "{}: encoder not ready, dropped frame at {:.3}s ({} dropped)",
            self.track.stream(),
            pts.seconds(),
            self.dropped
        );
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn track(&self) -> &TrackWriter {
        &self.track
    }

    pub fn close(&mut self) -> Result<()> {
        self.track.close()
    }
}

/// Audio track: resamples capture chunks before they reach the encoder.
pub struct AudioTrackWriter {
    track: TrackWriter,
    resampler: RingResampler,
    dropped: u64,
}

impl AudioTrackWriter {
    pub fn new(track: TrackWriter, output_rate: u32) -> Result<Self> {
        Ok(Self {
            track,
            resampler: RingResampler::new(output_rate)?,
            dropped: 0,
        })
    }

    pub fn append(&mut self, frame: &CaptureFrame<'_>) -> Result<()> {
        self.track.ensure_accepting()?;
        if frame.num_samples() == 0 {
            return Ok(());
        }

        self.resampler.append(frame)?;
        let output = self.resampler.current_frame();
        let pts = output
            .pts
            .rescale(self.resampler.output_rate(), Rounding::TowardPositiveInfinity);

        let encoder = &mut self.track.encoder;
        if !encoder.is_ready_for_more_media_data() {
            self.dropped += 1;
            warn!(
                "{}: encoder not ready, dropped {} samples at {:.3}s",
                self.track.stream,
                output.num_samples,
                pts.seconds()
            );
            return Ok(());
        }

        match encoder.push_audio(output.data, output.num_samples, pts) {
            Ok(_) => Ok(()),
            Err(e) if e.is_transient() => {
                self.dropped += 1;
                warn!(
                    "{}: encoder not ready, dropped {} samples at {:.3}s",
                    self.track.stream,
                    output.num_samples,
                    pts.seconds()
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn track(&self) -> &TrackWriter {
        &self.track
    }

    pub fn close(&mut self) -> Result<()> {
        self.track.close()
    }
}

//! Uncompressed stand-in encoder
//!
//! Packetizes pushed media as-is and groups packets into fixed-interval
//! segments on its own worker thread. Segment payloads are minimal ISO-BMFF
//! boxes (`ftyp`/`free` for the initialization segment, `moof`/`mdat` for
//! separable ones) so stored files look like fMP4 to simple tooling.

use super::{EncodedPacket, EncoderFactory, MediaEncoder, SegmentSender, StreamKind, VideoFrame};
use crate::error::{Result, WriterError};
use crate::segment::{MediaType, SegmentReport, TrackReport};
use crate::time::MediaTime;
use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Tuning for `PassthroughEncoder`.
#[derive(Debug, Clone)]
pub struct PassthroughConfig {
    pub segment_interval: MediaTime,
    /// Input units buffered before the encoder reports not-ready
    pub queue_depth: usize,
    pub audio_sample_rate: u32,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            segment_interval: MediaTime::new(6, 1),
            queue_depth: 64,
            audio_sample_rate: 48_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PassthroughFactory {
    config: PassthroughConfig,
}

impl PassthroughFactory {
    pub fn new(config: PassthroughConfig) -> Self {
        Self { config }
    }
}

impl EncoderFactory for PassthroughFactory {
    fn create(&self, stream: StreamKind, reports: SegmentSender) -> Result<Box<dyn MediaEncoder>> {
        let encoder = PassthroughEncoder::spawn(stream, self.config.clone(), reports)?;
        Ok(Box::new(encoder))
    }
}

/// Encoder session backed by one worker thread.
pub struct PassthroughEncoder {
    stream: StreamKind,
    audio_sample_rate: u32,
    input: Option<mpsc::Sender<EncodedPacket>>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl PassthroughEncoder {
    pub fn spawn(
        stream: StreamKind,
        config: PassthroughConfig,
        reports: SegmentSender,
    ) -> Result<Self> {
        if config.segment_interval.value <= 0 || config.audio_sample_rate == 0 {
            return Err(WriterError::EncoderSession(format!(
                "{}: invalid encoder configuration",
                stream
            )));
        }

        let (input, rx) = mpsc::channel(config.queue_depth.max(1));
        let segmenter = Segmenter::new(stream, config.segment_interval, reports);
        let worker = std::thread::Builder::new()
            .name(format!("encoder-{}", stream))
            .spawn(move || segmenter.run(rx))
            .map_err(|e| {
                WriterError::EncoderSession(format!("{}: failed to start encoder: {}", stream, e))
            })?;

        debug!("{}: passthrough encoder started", stream);

        Ok(Self {
            stream,
            audio_sample_rate: config.audio_sample_rate,
            input: Some(input),
            worker: Some(worker),
        })
    }

    fn submit(&self, packet: EncodedPacket) -> Result<()> {
        let input = self.input.as_ref().ok_or(WriterError::SessionClosed)?;
        match input.try_send(packet) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(WriterError::EncoderNotReady),
            Err(TrySendError::Closed(_)) => Err(WriterError::EncoderSession(format!(
                "{}: encoder worker stopped",
                self.stream
            ))),
        }
    }

    fn join(&mut self) -> Result<()> {
        self.input = None;
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| {
                WriterError::EncoderSession(format!("{}: encoder worker panicked", self.stream))
            })?,
            None => Ok(()),
        }
    }
}

impl MediaEncoder for PassthroughEncoder {
    fn is_ready_for_more_media_data(&self) -> bool {
        self.input
            .as_ref()
            .map(|input| input.capacity() > 0)
            .unwrap_or(false)
    }

    fn push_audio(
        &mut self,
        pcm: &[f32],
        num_samples: usize,
        pts: MediaTime,
    ) -> Result<Vec<EncodedPacket>> {
        let floats = (num_samples * 2).min(pcm.len());
        let mut data = BytesMut::with_capacity(floats * 4);
        for &sample in &pcm[..floats] {
            data.put_f32_le(sample);
        }

        let packet = EncodedPacket {
            pts,
            duration: MediaTime::from_samples(num_samples, self.audio_sample_rate),
            keyframe: true,
            data: data.freeze(),
        };
        self.submit(packet.clone())?;
        Ok(vec![packet])
    }

    fn push_video(&mut self, frame: VideoFrame) -> Result<()> {
        self.submit(EncodedPacket {
            pts: frame.pts,
            duration: frame.duration,
            keyframe: true,
            data: frame.data,
        })
    }

    fn finish(&mut self) -> Result<()> {
        let result = self.join();
        debug!("{}: passthrough encoder finished", self.stream);
        result
    }
}

impl Drop for PassthroughEncoder {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.join() {
                warn!("{}: encoder dropped without finish: {}", self.stream, e);
            }
        }
    }
}

#[derive(Serialize)]
struct TrackDescription {
    stream: StreamKind,
    media_type: MediaType,
    track_id: u32,
    codec: &'static str,
}

fn write_box(out: &mut BytesMut, kind: &[u8; 4], body: &[u8]) {
    out.put_u32((body.len() + 8) as u32);
    out.put_slice(kind);
    out.put_slice(body);
}

/// Worker-side segmentation state.
struct Segmenter {
    stream: StreamKind,
    interval: MediaTime,
    reports: SegmentSender,
    sent_init: bool,
    sequence: u64,
    current: Vec<EncodedPacket>,
}

impl Segmenter {
    fn new(stream: StreamKind, interval: MediaTime, reports: SegmentSender) -> Self {
        Self {
            stream,
            interval,
            reports,
            sent_init: false,
            sequence: 0,
            current: Vec::new(),
        }
    }

    fn run(mut self, mut rx: mpsc::Receiver<EncodedPacket>) -> Result<()> {
        while let Some(packet) = rx.blocking_recv() {
            self.push(packet)?;
        }
        self.cut()
    }

    fn push(&mut self, packet: EncodedPacket) -> Result<()> {
        if !self.sent_init {
            self.send_init()?;
        }
        if let Some(first) = self.current.first() {
            if packet.pts >= first.pts + self.interval {
                self.cut()?;
            }
        }
        self.current.push(packet);
        Ok(())
    }

    fn send_init(&mut self) -> Result<()> {
        let description = TrackDescription {
            stream: self.stream,
            media_type: self.stream.media_type(),
            track_id: 1,
            codec: match self.stream.media_type() {
                MediaType::Video => "raw",
                MediaType::Audio => "f32le",
            },
        };
        let json = serde_json::to_vec(&description)
            .map_err(|e| WriterError::EncoderSession(e.to_string()))?;

        let mut payload = BytesMut::new();
        write_box(&mut payload, b"ftyp", b"iso6\0\0\0\0iso6cmfc");
        write_box(&mut payload, b"free", &json);

        self.send(SegmentReport::initialization(payload.freeze()))?;
        self.sent_init = true;
        Ok(())
    }

    /// Emit the buffered packets as one separable segment.
    fn cut(&mut self) -> Result<()> {
        let (first, last) = match (self.current.first(), self.current.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(()),
        };

        let media_type = self.stream.media_type();
        let duration = match media_type {
            MediaType::Video => last.pts + last.duration - first.pts,
            MediaType::Audio => self
                .current
                .iter()
                .fold(MediaTime::zero(), |acc, p| acc + p.duration),
        };
        let track = TrackReport {
            track_id: 1,
            media_type,
            earliest_pts: first.pts,
            duration,
        };

        let mut moof = BytesMut::new();
        moof.put_u32(self.sequence as u32);
        moof.put_u32(self.current.len() as u32);
        let mut mdat = BytesMut::new();
        for packet in &self.current {
            mdat.put_slice(&packet.data);
        }
        let mut payload = BytesMut::with_capacity(moof.len() + mdat.len() + 16);
        write_box(&mut payload, b"moof", &moof);
        write_box(&mut payload, b"mdat", &mdat);

        let report = SegmentReport::separable(payload.freeze(), self.sequence, vec![track]);
        self.current.clear();
        self.sequence += 1;
        self.send(report)
    }

    fn send(&self, report: SegmentReport) -> Result<()> {
        self.reports.blocking_send(report).map_err(|_| {
            WriterError::EncoderSession(format!("{}: segment report channel closed", self.stream))
        })
    }
}

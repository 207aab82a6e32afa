//! Test fixtures for integration tests
//!
//! Describes synthetic capture sessions and drives them through a real
//! `RecordSession` with the passthrough encoder.

use std::sync::Arc;

use crate::encoder::PassthroughFactory;
use crate::error::Result;
use crate::playlist::AssetManifest;
use crate::resample::{ByteOrder, CaptureFrame, ChannelLayout};
use crate::segment::{DurationStrategy, SegmentStore};
use crate::synthetic::{TestPatternGenerator, ToneGenerator};
use crate::writer::{RecordSession, SessionOptions};

/// One audio source of a fixture
#[derive(Debug, Clone, Copy)]
pub struct AudioSource {
    pub sample_rate: u32,
    pub layout: ChannelLayout,
    pub byte_order: ByteOrder,
    pub frequency: f64,
}

impl AudioSource {
    pub fn new(sample_rate: u32, layout: ChannelLayout) -> Self {
        Self {
            sample_rate,
            layout,
            byte_order: ByteOrder::Native,
            frequency: 440.0,
        }
    }

    /// 10 ms chunks, like a typical capture callback
    fn generator(&self) -> ToneGenerator {
        ToneGenerator::new(
            self.sample_rate,
            self.layout,
            self.frequency,
            (self.sample_rate / 100) as usize,
        )
        .with_byte_order(self.byte_order)
    }
}

/// Synthetic recording description
#[derive(Debug, Clone)]
pub struct RecordingFixture {
    pub name: &'static str,
    pub description: &'static str,
    pub seconds: u32,
    pub frame_rate: u32,
    pub segment_interval_secs: u32,
    pub duration_strategy: DurationStrategy,
    pub app: AudioSource,
    pub mic: Option<AudioSource>,
    pub expected_video_segments: usize,
}

impl RecordingFixture {
    /// Typical desktop capture: 44.1 kHz app audio, 24 kHz mic
    pub fn desktop_capture() -> Self {
        Self {
            name: "desktop_capture",
            description: "60 fps video, 44.1 kHz stereo app audio, 24 kHz mono mic",
            seconds: 4,
            frame_rate: 60,
            segment_interval_secs: 1,
            duration_strategy: DurationStrategy::Reported,
            app: AudioSource::new(44100, ChannelLayout::Stereo),
            mic: Some(AudioSource::new(24000, ChannelLayout::Mono)),
            expected_video_segments: 4,
        }
    }

    /// Durations from earliest-pts deltas
    pub fn pts_delta_durations() -> Self {
        Self {
            name: "pts_delta_durations",
            description: "Desktop capture timed by earliest presentation time deltas",
            duration_strategy: DurationStrategy::EarliestPtsDelta,
            ..Self::desktop_capture()
        }
    }

    /// Microphone disabled
    pub fn without_mic() -> Self {
        Self {
            name: "without_mic",
            description: "Video and app audio only",
            mic: None,
            ..Self::desktop_capture()
        }
    }

    /// Byte-swapped 48 kHz app audio and an 8 kHz telephone mic
    pub fn swapped_and_narrowband() -> Self {
        let mut app = AudioSource::new(48000, ChannelLayout::Stereo);
        app.byte_order = ByteOrder::Swapped;
        Self {
            name: "swapped_and_narrowband",
            description: "48 kHz byte-swapped stereo app audio, 8 kHz mono mic",
            seconds: 3,
            frame_rate: 30,
            segment_interval_secs: 2,
            duration_strategy: DurationStrategy::Reported,
            app,
            mic: Some(AudioSource::new(8000, ChannelLayout::Mono)),
            expected_video_segments: 2,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::desktop_capture(),
            Self::pts_delta_durations(),
            Self::without_mic(),
            Self::swapped_and_narrowband(),
        ]
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            asset_prefix: self.name.to_string(),
            mic_enabled: self.mic.is_some(),
            frame_rate: self.frame_rate,
            segment_interval_secs: self.segment_interval_secs,
            duration_strategy: self.duration_strategy,
            ..Default::default()
        }
    }

    /// Total recorded media time in seconds
    pub fn expected_seconds(&self) -> f64 {
        self.seconds as f64
    }
}

/// Record a fixture into `store`, interleaving the three sources in
/// capture order.
pub fn record(fixture: &RecordingFixture, store: Arc<dyn SegmentStore>) -> Result<AssetManifest> {
    let options = fixture.session_options();
    // Deep enough that no unit is dropped on backpressure
    let factory = PassthroughFactory::new(options.passthrough_config(8192));
    let session = RecordSession::start(options, store, &factory)?;

    let mut video = TestPatternGenerator::new(16, 8, fixture.frame_rate);
    let mut app = fixture.app.generator();
    let mut mic = fixture.mic.map(|m| m.generator());

    let total_frames = (fixture.seconds * fixture.frame_rate) as u64;
    for i in 0..total_frames {
        session.append_video(video.next_frame())?;

        // Audio due before the next video frame
        let until = (i + 1) as f64 / fixture.frame_rate as f64;
        feed_until(&mut app, &fixture.app, until, |frame| {
            session.append_app_audio(frame)
        })?;
        if let (Some(mic), Some(source)) = (mic.as_mut(), fixture.mic.as_ref()) {
            feed_until(mic, source, until, |frame| session.append_mic_audio(frame))?;
        }
    }

    session.close()
}

fn feed_until<F>(
    generator: &mut ToneGenerator,
    source: &AudioSource,
    until_secs: f64,
    mut append: F,
) -> Result<()>
where
    F: FnMut(&CaptureFrame<'_>) -> Result<()>,
{
    while (generator.produced() as f64 / source.sample_rate as f64) < until_secs - 1e-9 {
        let (samples, pts) = generator.next_chunk();
        let frame = CaptureFrame::new(
            &samples,
            source.layout,
            source.byte_order,
            source.sample_rate,
            pts,
        );
        append(&frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_names_are_unique() {
        let fixtures = RecordingFixture::all();
        for (i, a) in fixtures.iter().enumerate() {
            for b in &fixtures[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_session_options_follow_fixture() {
        let fixture = RecordingFixture::without_mic();
        let options = fixture.session_options();
        assert_eq!(options.asset_prefix, "without_mic");
        assert!(!options.mic_enabled);
        assert_eq!(options.segment_interval_secs, 1);
        assert_eq!(options.audio_output_rate, 48000);
    }
}

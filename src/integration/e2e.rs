//! End-to-end integration tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::integration::fixtures::{record, RecordingFixture};
use crate::integration::validation::{
    extinf_durations, map_uri, segment_uris, validate_fmp4_segment, validate_index_playlist,
    validate_master_playlist, ValidationResult,
};
use crate::playlist::{render_index, AssetManifest, PlaylistEntry};
use crate::resample::{ByteOrder, CaptureFrame, ChannelLayout, RingResampler};
use crate::segment::{MemoryStore, SegmentStore};
use crate::synthetic::ToneGenerator;
use crate::time::MediaTime;

/// Tolerance for summed EXTINF values against recorded media time
const DURATION_TOLERANCE: f64 = 1e-3;

/// Record a fixture and validate every file it produced
pub fn test_recording_lifecycle(fixture: &RecordingFixture) -> ValidationResult {
    let store = Arc::new(MemoryStore::new());
    let manifest = match record(fixture, store.clone()) {
        Ok(manifest) => manifest,
        Err(e) => {
            return ValidationResult::fail(format!("{}: recording failed: {}", fixture.name, e))
        }
    };

    validate_asset(fixture, store.as_ref(), &manifest)
}

/// Validate the master playlist, every index, and the segments they list
pub fn validate_asset(
    fixture: &RecordingFixture,
    store: &dyn SegmentStore,
    manifest: &AssetManifest,
) -> ValidationResult {
    let master = match read_text(store, &manifest.master) {
        Some(master) => master,
        None => return ValidationResult::fail(format!("Missing master {}", manifest.master)),
    };
    let mut result = validate_master_playlist(&master);

    let mut indexes = vec![&manifest.video_index, &manifest.app_audio_index];
    indexes.extend(manifest.mic_audio_index.as_ref());
    if manifest.mic_audio_index.is_some() != fixture.mic.is_some() {
        result.merge(ValidationResult::fail("Mic rendition does not match fixture"));
    }

    for name in indexes {
        if !master.contains(name.as_str()) {
            result.merge(ValidationResult::fail(format!("Master does not list {}", name)));
        }
        result.merge(validate_stream(fixture, store, name));
    }

    let video_segments = manifest.segment_counts.first().copied().unwrap_or(0);
    if video_segments != fixture.expected_video_segments {
        result.merge(ValidationResult::fail(format!(
            "{}: expected {} video segments, got {}",
            fixture.name, fixture.expected_video_segments, video_segments
        )));
    }

    result
}

fn validate_stream(
    fixture: &RecordingFixture,
    store: &dyn SegmentStore,
    name: &str,
) -> ValidationResult {
    let index = match read_text(store, name) {
        Some(index) => index,
        None => return ValidationResult::fail(format!("Missing index {}", name)),
    };
    let mut result = validate_index_playlist(&index, true);

    match map_uri(&index) {
        Some(init) => match store.read(&init) {
            Ok(Some(data)) => result.merge(validate_fmp4_segment(&data, true)),
            _ => result.merge(ValidationResult::fail(format!("Missing init {}", init))),
        },
        None => result.merge(ValidationResult::fail(format!("{} has no init", name))),
    }

    let uris = segment_uris(&index);
    for (i, uri) in uris.iter().enumerate() {
        // Sequence numbers are contiguous from zero
        if !uri.ends_with(&format!("-{:06}.m4s", i)) {
            result.merge(ValidationResult::fail(format!("Out of order segment {}", uri)));
        }
        match store.read(uri) {
            Ok(Some(data)) => result.merge(validate_fmp4_segment(&data, false)),
            _ => result.merge(ValidationResult::fail(format!("Missing segment {}", uri))),
        }
    }

    let total: f64 = extinf_durations(&index).iter().sum();
    if (total - fixture.expected_seconds()).abs() > DURATION_TOLERANCE {
        result.merge(ValidationResult::fail(format!(
            "{}: EXTINF total {:.5} != {} s",
            name,
            total,
            fixture.expected_seconds()
        )));
    }

    result
}

fn read_text(store: &dyn SegmentStore, name: &str) -> Option<String> {
    let data = store.read(name).ok()??;
    String::from_utf8(data.to_vec()).ok()
}

/// Check that an incremental recording exposes a growing EVENT playlist
pub fn test_incremental_playlist() -> ValidationResult {
    use crate::encoder::PassthroughFactory;
    use crate::synthetic::TestPatternGenerator;
    use crate::writer::RecordSession;

    let store = Arc::new(MemoryStore::new());
    let fixture = RecordingFixture::without_mic();
    let mut options = fixture.session_options();
    options.incremental_playlist = true;
    let factory = PassthroughFactory::new(options.passthrough_config(8192));
    let session = match RecordSession::start(options, store.clone(), &factory) {
        Ok(session) => session,
        Err(e) => return ValidationResult::fail(e.to_string()),
    };

    let mut pattern = TestPatternGenerator::new(16, 8, fixture.frame_rate);
    // Two full segments plus the start of a third
    for _ in 0..(fixture.frame_rate * 2 + 1) {
        if let Err(e) = session.append_video(pattern.next_frame()) {
            return ValidationResult::fail(e.to_string());
        }
    }

    let index_name = format!("{}-video.m3u8", fixture.name);
    let deadline = Instant::now() + Duration::from_secs(10);
    let live = loop {
        if let Some(text) = store.read_string(&index_name) {
            if extinf_durations(&text).len() >= 2 {
                break text;
            }
        }
        if Instant::now() > deadline {
            return ValidationResult::fail("EVENT playlist never reached two segments");
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let mut result = validate_index_playlist(&live, false);
    if store.read_string(&format!("{}.m3u8", fixture.name)).is_some() {
        result.merge(ValidationResult::fail("Master written before close"));
    }

    match session.close() {
        Ok(_) => {
            let done = store.read_string(&index_name).unwrap_or_default();
            result.merge(validate_index_playlist(&done, true));
            if extinf_durations(&done).len() != 3 {
                result.merge(ValidationResult::fail("Final playlist lost the tail segment"));
            }
        }
        Err(e) => result.merge(ValidationResult::fail(e.to_string())),
    }

    result
}

/// Performance benchmark for index rendering
pub fn benchmark_index_rendering(iterations: usize) -> BenchmarkResult {
    let entries: Vec<PlaylistEntry> = (0..600)
        .map(|i| PlaylistEntry::new(format!("bench-video-{:06}.m4s", i), MediaTime::new(6, 1)))
        .collect();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = render_index(Some("bench-video-init.m4s"), &entries, 6);
    }
    let duration = start.elapsed();

    BenchmarkResult {
        name: "Index Rendering (600 segments)",
        iterations,
        duration_ms: duration.as_millis() as u64,
        avg_ms: (duration.as_millis() as f64 / iterations as f64) as u64,
    }
}

/// Performance benchmark for 44.1 kHz stereo resampling, one second per iteration
pub fn benchmark_resampling(iterations: usize) -> BenchmarkResult {
    let mut resampler = RingResampler::new(48000).expect("48 kHz output is supported");
    let mut tone = ToneGenerator::new(44100, ChannelLayout::Stereo, 440.0, 441);

    let start = Instant::now();
    for _ in 0..iterations {
        for _ in 0..100 {
            let (samples, pts) = tone.next_chunk();
            let frame = CaptureFrame::new(
                &samples,
                ChannelLayout::Stereo,
                ByteOrder::Native,
                44100,
                pts,
            );
            let _ = resampler.append(&frame);
        }
    }
    let duration = start.elapsed();

    BenchmarkResult {
        name: "Resampling 44.1 kHz stereo (1 s)",
        iterations,
        duration_ms: duration.as_millis() as u64,
        avg_ms: (duration.as_millis() as f64 / iterations as f64) as u64,
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub name: &'static str,
    pub iterations: usize,
    pub duration_ms: u64,
    pub avg_ms: u64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} iterations in {}ms (avg: {}ms)",
            self.name, self.iterations, self.duration_ms, self.avg_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;
    use crate::http::{create_router, ServeState};
    use crate::segment::DirectoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    #[test]
    fn test_recording_lifecycle_all_fixtures() {
        for fixture in RecordingFixture::all() {
            let result = test_recording_lifecycle(&fixture);
            assert!(
                result.is_valid,
                "{} failed: {:?}",
                fixture.name,
                result.errors
            );
        }
    }

    #[test]
    fn test_desktop_capture_master_document() {
        let store = Arc::new(MemoryStore::new());
        let manifest = record(&RecordingFixture::desktop_capture(), store.clone()).unwrap();
        assert_eq!(manifest.segment_counts.len(), 3);

        let master = store.read_string(&manifest.master).unwrap();
        let expected = "#EXTM3U\n\
#EXT-X-VERSION:7\n\
#EXT-X-INDEPENDENT-SEGMENTS\n\
#EXT-X-STREAM-INF:BANDWIDTH=150000,CODECS=\"avc1.42e00a,mp4a.40.2\",AUDIO=\"audio\"\n\
desktop_capture-video.m3u8\n\
\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio\",NAME=\"App\",DEFAULT=YES,AUTOSELECT=YES,URI=\"desktop_capture-app.m3u8\"\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio\",NAME=\"Mic\",DEFAULT=NO,AUTOSELECT=YES,URI=\"desktop_capture-mic.m3u8\"\n";
        assert_eq!(master, expected);

        let video = store.read_string(&manifest.video_index).unwrap();
        assert_eq!(extinf_durations(&video), vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_incremental_playlist_e2e() {
        let result = test_incremental_playlist();
        assert!(
            result.is_valid,
            "Incremental playlist test failed: {:?}",
            result.errors
        );
    }

    #[tokio::test]
    async fn test_directory_recording_served_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn SegmentStore> = Arc::new(DirectoryStore::new(dir.path()).unwrap());

        let fixture = RecordingFixture::without_mic();
        let recording_store = store.clone();
        let recording_fixture = fixture.clone();
        let manifest =
            tokio::task::spawn_blocking(move || record(&recording_fixture, recording_store))
                .await
                .unwrap()
                .unwrap();

        // Atomic playlist writes leave no temporaries behind
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let result = validate_asset(&fixture, store.as_ref(), &manifest);
        assert!(result.is_valid, "{:?}", result.errors);

        let app = create_router(Arc::new(ServeState::new(WriterConfig::default(), store)));
        let request = Request::builder()
            .uri(format!("/{}", manifest.master))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("/without_mic-video-000000.m4s")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_benchmark_index_rendering() {
        let result = benchmark_index_rendering(100);
        println!("{}", result);
        assert!(
            result.avg_ms < 50,
            "Index rendering too slow: {}ms avg",
            result.avg_ms
        );
    }

    #[test]
    fn test_benchmark_resampling() {
        let result = benchmark_resampling(20);
        println!("{}", result);
        // One second of audio must resample far faster than real time
        assert!(
            result.avg_ms < 500,
            "Resampling too slow: {}ms avg",
            result.avg_ms
        );
    }
}

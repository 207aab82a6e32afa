//! Per-stream segment muxer
//!
//! Persists the segments reported by one encoder session under
//! deterministic names and keeps the entry log its index playlist is
//! rendered from. The number of segments is never known in advance, so
//! every separable report extends the log and `close()` renders the final
//! document.

use super::report::{MediaType, SegmentKind, SegmentReport};
use super::store::SegmentStore;
use crate::error::{Result, WriterError};
use crate::playlist::{self, PlaylistEntry};
use crate::time::MediaTime;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a muxer. `Active` is entered on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxerState {
    Active,
    Finalizing,
    Closed,
}

/// How a separable segment's EXTINF duration is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationStrategy {
    /// The duration the encoder reported for the segment
    #[default]
    Reported,
    /// Distance to the next segment's earliest pts; the last segment
    /// falls back to its reported duration
    EarliestPtsDelta,
}

/// Maps presentation times onto wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClockAnchor {
    pub first_frame_arrival: DateTime<Utc>,
    pub session_start_pts: MediaTime,
}

impl WallClockAnchor {
    pub fn wall_clock_at(&self, pts: MediaTime) -> DateTime<Utc> {
        self.first_frame_arrival + (pts - self.session_start_pts).to_chrono()
    }
}

#[derive(Debug, Clone)]
pub struct MuxerOptions {
    /// File prefix, e.g. `rec-video`
    pub prefix: String,
    pub media_type: MediaType,
    pub duration_strategy: DurationStrategy,
    pub target_duration_hint: u32,
    /// Rewrite an EVENT playlist after every entry
    pub incremental: bool,
}

impl MuxerOptions {
    pub fn new(prefix: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            prefix: prefix.into(),
            media_type,
            duration_strategy: DurationStrategy::default(),
            target_duration_hint: 6,
            incremental: false,
        }
    }
}

#[derive(Debug)]
struct PendingEntry {
    filename: String,
    earliest_pts: MediaTime,
    reported_duration: MediaTime,
}

#[derive(Debug)]
struct MuxerInner {
    state: MuxerState,
    init_filename: Option<String>,
    next_sequence: u64,
    pending: Option<PendingEntry>,
    entries: Vec<PlaylistEntry>,
    anchor: Option<WallClockAnchor>,
    manifest: Option<String>,
}

/// Segment writer and entry log for one elementary stream.
pub struct SegmentMuxer {
    options: MuxerOptions,
    store: Arc<dyn SegmentStore>,
    inner: Mutex<MuxerInner>,
}

impl SegmentMuxer {
    pub fn new(options: MuxerOptions, store: Arc<dyn SegmentStore>) -> Self {
        Self {
            options,
            store,
            inner: Mutex::new(MuxerInner {
                state: MuxerState::Active,
                init_filename: None,
                next_sequence: 0,
                pending: None,
                entries: Vec::new(),
                anchor: None,
                manifest: None,
            }),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.options.prefix
    }

    pub fn init_filename(&self) -> String {
        format!("{}-init.m4s", self.options.prefix)
    }

    pub fn segment_filename(&self, sequence: u64) -> String {
        format!("{}-{:06}.m4s", self.options.prefix, sequence)
    }

    pub fn index_filename(&self) -> String {
        format!("{}.m3u8", self.options.prefix)
    }

    /// Attach wall-clock metadata to entries produced from now on.
    pub fn set_wall_clock_anchor(&self, anchor: WallClockAnchor) {
        self.inner.lock().anchor = Some(anchor);
    }

    pub fn state(&self) -> MuxerState {
        self.inner.lock().state
    }

    /// Entries resolved so far (a deferred last entry is not included).
    pub fn entries(&self) -> Vec<PlaylistEntry> {
        self.inner.lock().entries.clone()
    }

    /// The final index document, once closed.
    pub fn manifest(&self) -> Option<String> {
        self.inner.lock().manifest.clone()
    }

    /// Handle one completed segment.
    ///
    /// Separable segments require an initialization segment first; nothing
    /// is persisted when that precondition fails.
    pub fn on_segment(&self, report: SegmentReport) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.state != MuxerState::Active {
            warn!(
                "{}: dropping {:?} segment reported after close",
                self.options.prefix, report.kind
            );
            return Ok(());
        }

        match report.kind {
            SegmentKind::Initialization => {
                let filename = self.init_filename();
                self.store.write(&filename, report.payload)?;
                debug!("{}: initialization segment {}", self.options.prefix, filename);
                inner.init_filename = Some(filename);
                Ok(())
            }
            SegmentKind::Separable => self.on_separable(&mut inner, report),
            SegmentKind::Unrecognized(code) => {
                warn!(
                    "{}: ignoring unrecognized segment kind {}",
                    self.options.prefix, code
                );
                Ok(())
            }
        }
    }

    fn on_separable(&self, inner: &mut MuxerInner, report: SegmentReport) -> Result<()> {
        if inner.init_filename.is_none() {
            return Err(WriterError::NoInitializationSegment(
                self.options.prefix.clone(),
            ));
        }
        let timing = *report.timing_track(self.options.media_type).ok_or_else(|| {
            WriterError::Muxing(format!(
                "{}: separable segment without track timing",
                self.options.prefix
            ))
        })?;

        let sequence = inner.next_sequence;
        let filename = self.segment_filename(sequence);
        self.store.write(&filename, report.payload)?;
        inner.next_sequence += 1;

        debug!(
            "{}: segment {} pts={} duration={:.5}s",
            self.options.prefix,
            filename,
            timing.earliest_pts,
            timing.duration.seconds()
        );

        let current = PendingEntry {
            filename,
            earliest_pts: timing.earliest_pts,
            reported_duration: timing.duration,
        };

        let resolved = match self.options.duration_strategy {
            DurationStrategy::Reported => Some((current, None)),
            DurationStrategy::EarliestPtsDelta => {
                let previous = inner.pending.replace(current);
                previous.map(|prev| {
                    let next_pts = inner.pending.as_ref().map(|p| p.earliest_pts);
                    (prev, next_pts)
                })
            }
        };

        if let Some((entry, next_pts)) = resolved {
            let duration = match next_pts {
                Some(next) => {
                    let delta = next - entry.earliest_pts;
                    if delta.value <= 0 {
                        warn!(
                            "{}: non-increasing earliest pts after {}, using reported duration",
                            self.options.prefix, entry.filename
                        );
                        entry.reported_duration
                    } else {
                        delta
                    }
                }
                None => entry.reported_duration,
            };
            self.push_entry(inner, entry, duration);
            self.write_incremental(inner)?;
        }

        Ok(())
    }

    fn push_entry(&self, inner: &mut MuxerInner, entry: PendingEntry, duration: MediaTime) {
        let program_date_time = inner
            .anchor
            .map(|anchor| anchor.wall_clock_at(entry.earliest_pts));
        inner.entries.push(PlaylistEntry {
            filename: entry.filename,
            duration,
            program_date_time,
        });
    }

    fn write_incremental(&self, inner: &MuxerInner) -> Result<()> {
        if !self.options.incremental {
            return Ok(());
        }
        if let Some(init) = inner.init_filename.as_deref() {
            let document = playlist::render_event_index(
                init,
                &inner.entries,
                self.options.target_duration_hint,
            );
            self.store
                .write_playlist(&self.index_filename(), &document)?;
        }
        Ok(())
    }

    /// Flush the deferred entry and write the final index.
    ///
    /// The caller must have drained the encoder first. Calling it again is
    /// a no-op.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == MuxerState::Closed {
            return Ok(());
        }
        inner.state = MuxerState::Finalizing;

        if let Some(last) = inner.pending.take() {
            let duration = last.reported_duration;
            self.push_entry(&mut inner, last, duration);
        }

        let document = match inner.init_filename.as_deref() {
            Some(init) => playlist::render_index(
                Some(init),
                &inner.entries,
                self.options.target_duration_hint,
            )?,
            None => {
                warn!(
                    "{}: closing without any initialization segment",
                    self.options.prefix
                );
                playlist::render_empty_index(self.options.target_duration_hint)
            }
        };

        self.store
            .write_playlist(&self.index_filename(), &document)?;

        info!(
            "{}: closed with {} segments ({:.3}s)",
            self.options.prefix,
            inner.entries.len(),
            inner.entries.iter().map(|e| e.duration_secs()).sum::<f64>()
        );

        inner.manifest = Some(document);
        inner.state = MuxerState::Closed;
        Ok(())
    }
}

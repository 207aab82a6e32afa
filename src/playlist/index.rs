//! Per-stream index playlist rendering
//!
//! Generates `<prefix>.m3u8` documents listing an initialization segment
//! and the separable segments recorded so far.

use super::PlaylistEntry;
use crate::error::{Result, WriterError};
use chrono::SecondsFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaylistType {
    Vod,
    Event,
}

impl PlaylistType {
    fn tag(self) -> &'static str {
        match self {
            PlaylistType::Vod => "VOD",
            PlaylistType::Event => "EVENT",
        }
    }
}

/// Render the final VOD index for one stream.
///
/// Fails when no initialization segment was ever recorded.
pub fn render_index(
    init_filename: Option<&str>,
    entries: &[PlaylistEntry],
    target_duration_hint: u32,
) -> Result<String> {
    let init = init_filename
        .ok_or_else(|| WriterError::NoInitializationSegment("index playlist".to_string()))?;
    Ok(render(
        Some(init),
        entries,
        target_duration_hint,
        PlaylistType::Vod,
    ))
}

/// Render an in-progress EVENT index (no end marker).
pub fn render_event_index(
    init_filename: &str,
    entries: &[PlaylistEntry],
    target_duration_hint: u32,
) -> String {
    render(
        Some(init_filename),
        entries,
        target_duration_hint,
        PlaylistType::Event,
    )
}

/// Header and end marker only, for a stream that never produced any segment.
pub fn render_empty_index(target_duration_hint: u32) -> String {
    render(None, &[], target_duration_hint, PlaylistType::Vod)
}

/// `max(hint, ceil(longest entry))`, so no EXTINF exceeds the target.
pub fn target_duration(entries: &[PlaylistEntry], hint: u32) -> u32 {
    let max_duration = entries
        .iter()
        .map(|e| e.duration_secs())
        .fold(0.0f64, |a, b| a.max(b));

    (max_duration.ceil() as u32).max(hint)
}

fn render(
    init_filename: Option<&str>,
    entries: &[PlaylistEntry],
    target_duration_hint: u32,
    playlist_type: PlaylistType,
) -> String {
    let mut output = String::new();

    output.push_str("#EXTM3U\n");
    output.push_str(&format!(
        "#EXT-X-TARGETDURATION:{}\n",
        target_duration(entries, target_duration_hint)
    ));
    output.push_str("#EXT-X-VERSION:7\n");
    output.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");
    output.push_str(&format!("#EXT-X-PLAYLIST-TYPE:{}\n", playlist_type.tag()));
    output.push_str("#EXT-X-INDEPENDENT-SEGMENTS\n");
    if let Some(init) = init_filename {
        output.push_str(&format!("#EXT-X-MAP:URI=\"{}\"\n", init));
    }

    for entry in entries {
        if let Some(at) = entry.program_date_time {
            output.push_str(&format!(
                "#EXT-X-PROGRAM-DATE-TIME:{}\n",
                at.to_rfc3339_opts(SecondsFormat::Millis, true)
            ));
        }
        output.push_str(&format!("#EXTINF:{:.5},\n", entry.duration_secs()));
        output.push_str(&entry.filename);
        output.push('\n');
    }

    if playlist_type == PlaylistType::Vod {
        output.push_str("#EXT-X-ENDLIST\n");
    }

    output
}

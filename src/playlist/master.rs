//! Master playlist generator
//!
//! Binds the video index and the audio rendition indexes of one recorded
//! asset into `<asset>.m3u8`.

use serde::{Deserialize, Serialize};

/// Audio rendition group shared by every rendition and the video variant
pub const AUDIO_GROUP_ID: &str = "audio";

/// Fixed attributes advertised on the single video variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAttributes {
    pub bandwidth: u64,
    pub codecs: String,
}

impl Default for VariantAttributes {
    fn default() -> Self {
        Self {
            bandwidth: 150_000,
            codecs: "avc1.42e00a,mp4a.40.2".to_string(),
        }
    }
}

/// Generate master playlist content
///
/// Emits the single variant stream that references the video index,
/// followed by the audio renditions ("App", then "Mic" when present; the
/// first one listed is the default).
pub fn render_master(
    video_index: &str,
    app_audio_index: Option<&str>,
    mic_audio_index: Option<&str>,
    attributes: &VariantAttributes,
) -> String {
    let mut output = String::new();

    output.push_str("#EXTM3U\n");
    output.push_str("#EXT-X-VERSION:7\n");
    output.push_str("#EXT-X-INDEPENDENT-SEGMENTS\n");

    let renditions: Vec<(&str, &str)> = [("App", app_audio_index), ("Mic", mic_audio_index)]
        .into_iter()
        .filter_map(|(name, uri)| uri.map(|u| (name, u)))
        .collect();

    let audio_attr = if renditions.is_empty() {
        String::new()
    } else {
        format!(",AUDIO=\"{}\"", AUDIO_GROUP_ID)
    };
    output.push_str(&format!(
        "#EXT-X-STREAM-INF:BANDWIDTH={},CODECS=\"{}\"{}\n",
        attributes.bandwidth, attributes.codecs, audio_attr
    ));
    output.push_str(video_index);
    output.push('\n');

    if !renditions.is_empty() {
        output.push('\n');
    }
    for (i, (name, uri)) in renditions.iter().enumerate() {
        let default = if i == 0 { "YES" } else { "NO" };
        output.push_str(&format!(
            "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"{}\",NAME=\"{}\",\
             DEFAULT={},AUTOSELECT=YES,URI=\"{}\"\n",
            AUDIO_GROUP_ID, name, default, uri
        ));
    }

    output
}

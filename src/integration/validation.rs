//! Playlist and segment validation utilities

/// Outcome of a validation pass
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![message.into()],
            warnings: Vec::new(),
        }
    }

    fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate master playlist structure
pub fn validate_master_playlist(content: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !content.starts_with("#EXTM3U\n") {
        errors.push("Missing #EXTM3U header".to_string());
    }

    match tag_value(content, "#EXT-X-VERSION:").map(|v| v.parse::<u32>()) {
        Some(Ok(v)) if v < 7 => warnings.push(format!("HLS version {} may not support fMP4", v)),
        Some(Ok(_)) => {}
        _ => errors.push("Missing #EXT-X-VERSION tag".to_string()),
    }

    let mut defaults = 0;
    let mut renditions = 0;
    for line in content.lines() {
        if line.starts_with("#EXT-X-MEDIA:TYPE=AUDIO") {
            renditions += 1;
            for attr in ["GROUP-ID=", "NAME=", "URI=", "DEFAULT="] {
                if !line.contains(attr) {
                    errors.push(format!("AUDIO entry missing {}", attr.trim_end_matches('=')));
                }
            }
            if line.contains("DEFAULT=YES") {
                defaults += 1;
            }
        }
    }
    if renditions > 0 && defaults != 1 {
        errors.push(format!("Expected one default audio rendition, found {}", defaults));
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut variants = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("#EXT-X-STREAM-INF:") {
            variants += 1;
            if !line.contains("BANDWIDTH=") {
                errors.push("STREAM-INF missing BANDWIDTH".to_string());
            }
            if !line.contains("CODECS=") {
                errors.push("STREAM-INF missing CODECS".to_string());
            }
            if renditions > 0 && !line.contains("AUDIO=") {
                errors.push("STREAM-INF does not reference the audio group".to_string());
            }
            match lines.get(i + 1) {
                Some(uri) if !uri.starts_with('#') && !uri.trim().is_empty() => {}
                _ => errors.push("STREAM-INF not followed by a URI".to_string()),
            }
        }
    }
    if variants == 0 {
        errors.push("No video stream variants found".to_string());
    }

    ValidationResult::from_parts(errors, warnings)
}

/// Validate a per-stream index playlist.
///
/// `finished` selects between a closed VOD playlist and an in-progress
/// EVENT playlist.
pub fn validate_index_playlist(content: &str, finished: bool) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !content.starts_with("#EXTM3U\n") {
        errors.push("Missing #EXTM3U header".to_string());
    }
    for tag in ["#EXT-X-VERSION:", "#EXT-X-MEDIA-SEQUENCE:", "#EXT-X-INDEPENDENT-SEGMENTS"] {
        if !content.contains(tag) {
            errors.push(format!("Missing {} tag", tag.trim_end_matches(':')));
        }
    }

    let target = match tag_value(content, "#EXT-X-TARGETDURATION:").map(|v| v.parse::<u64>()) {
        Some(Ok(target)) => target,
        _ => {
            errors.push("Missing #EXT-X-TARGETDURATION tag".to_string());
            0
        }
    };

    let (playlist_type, endlist) = if finished {
        ("#EXT-X-PLAYLIST-TYPE:VOD", true)
    } else {
        ("#EXT-X-PLAYLIST-TYPE:EVENT", false)
    };
    if !content.contains(playlist_type) {
        errors.push(format!("Missing {}", playlist_type));
    }
    if content.contains("#EXT-X-ENDLIST") != endlist {
        errors.push(format!(
            "#EXT-X-ENDLIST {}",
            if endlist { "missing" } else { "present before close" }
        ));
    }

    let durations = extinf_durations(content);
    if durations.is_empty() {
        warnings.push("No segment entries found".to_string());
    } else if !content.contains("#EXT-X-MAP:URI=") {
        errors.push("Segments listed without #EXT-X-MAP".to_string());
    }
    for d in &durations {
        if d.ceil() as u64 > target {
            errors.push(format!("EXTINF {:.5} exceeds target duration {}", d, target));
        }
    }

    // Every EXTINF is followed by a URI line
    let mut pending = false;
    for line in content.lines() {
        if line.starts_with("#EXTINF:") {
            if pending {
                errors.push("EXTINF without URI".to_string());
            }
            pending = true;
        } else if pending && !line.starts_with('#') && !line.trim().is_empty() {
            pending = false;
        }
    }
    if pending {
        errors.push("Trailing EXTINF without URI".to_string());
    }

    ValidationResult::from_parts(errors, warnings)
}

/// Validate a stored segment payload
pub fn validate_fmp4_segment(data: &[u8], initialization: bool) -> ValidationResult {
    if data.len() < 8 {
        return ValidationResult::fail("Segment too small");
    }

    let mut errors = Vec::new();
    let first = &data[4..8];
    let expected: &[u8] = if initialization { b"ftyp" } else { b"moof" };
    if first != expected {
        errors.push(format!(
            "Invalid box type at start: {:?}",
            String::from_utf8_lossy(first)
        ));
    }
    if !initialization && find_box(data, b"mdat").is_none() {
        errors.push("Missing mdat box".to_string());
    }

    ValidationResult::from_parts(errors, Vec::new())
}

/// EXTINF durations in playlist order
pub fn extinf_durations(content: &str) -> Vec<f64> {
    content
        .lines()
        .filter_map(|l| l.strip_prefix("#EXTINF:"))
        .filter_map(|v| v.trim_end_matches(',').parse::<f64>().ok())
        .collect()
}

/// Segment URIs in playlist order
pub fn segment_uris(content: &str) -> Vec<String> {
    let mut uris = Vec::new();
    let mut pending = false;
    for line in content.lines() {
        if line.starts_with("#EXTINF:") {
            pending = true;
        } else if pending && !line.starts_with('#') && !line.trim().is_empty() {
            uris.push(line.to_string());
            pending = false;
        }
    }
    uris
}

/// URI of the `#EXT-X-MAP` tag, if any
pub fn map_uri(content: &str) -> Option<String> {
    let rest = tag_value(content, "#EXT-X-MAP:URI=")?;
    Some(rest.trim_matches('"').to_string())
}

fn tag_value<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    content
        .lines()
        .find_map(|l| l.strip_prefix(tag))
        .map(str::trim)
}

/// Find a specific top-level box in MP4 data
fn find_box(data: &[u8], box_type: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while pos + 8 <= data.len() {
        let size =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        if size < 8 {
            return None;
        }
        if &data[pos + 4..pos + 8] == box_type {
            return Some(pos);
        }
        pos += size;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::{render_index, render_master, PlaylistEntry, VariantAttributes};
    use crate::time::MediaTime;

    #[test]
    fn test_rendered_master_is_valid() {
        let master = render_master(
            "a-video.m3u8",
            Some("a-app.m3u8"),
            Some("a-mic.m3u8"),
            &VariantAttributes::default(),
        );
        let result = validate_master_playlist(&master);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_master_without_variant_is_invalid() {
        let result = validate_master_playlist("#EXTM3U\n#EXT-X-VERSION:7\n");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_rendered_index_is_valid() {
        let entries = vec![
            PlaylistEntry::new("a-000000.m4s", MediaTime::new(6, 1)),
            PlaylistEntry::new("a-000001.m4s", MediaTime::new(7, 2)),
        ];
        let document = render_index(Some("a-init.m4s"), &entries, 6).unwrap();
        let result = validate_index_playlist(&document, true);
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(extinf_durations(&document), vec![6.0, 3.5]);
        assert_eq!(segment_uris(&document), vec!["a-000000.m4s", "a-000001.m4s"]);
        assert_eq!(map_uri(&document).as_deref(), Some("a-init.m4s"));
    }

    #[test]
    fn test_extinf_over_target_is_invalid() {
        let document = "#EXTM3U\n#EXT-X-TARGETDURATION:2\n#EXT-X-VERSION:7\n\
            #EXT-X-MEDIA-SEQUENCE:0\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXT-X-INDEPENDENT-SEGMENTS\n\
            #EXT-X-MAP:URI=\"i.m4s\"\n#EXTINF:2.50000,\ns.m4s\n#EXT-X-ENDLIST\n";
        let result = validate_index_playlist(document, true);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_segment_boxes() {
        let mut data = Vec::new();
        data.extend_from_slice(&16u32.to_be_bytes());
        data.extend_from_slice(b"moof");
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&8u32.to_be_bytes());
        data.extend_from_slice(b"mdat");

        assert!(validate_fmp4_segment(&data, false).is_valid);
        assert!(!validate_fmp4_segment(&data, true).is_valid);
        assert!(!validate_fmp4_segment(&data[..4], false).is_valid);
    }
}

//! Format Resolver: reduces the raw yt-dlp format list to a deduplicated,
//! user-presentable set of quality choices.

use crate::errors::{BotError, BotResult};
use crate::extractor::{FormatDescriptor, VideoMetadata};
use crate::utils::format_size_mb;

/// Known-good muxed/high-quality mp4 format ids offered to the user:
/// 18 (360p muxed), 22 (720p muxed), 137/399 (1080p avc1/av01), 400 (1440p av01).
const KNOWN_GOOD_FORMAT_IDS: [&str; 5] = ["18", "22", "137", "399", "400"];

/// One selectable quality. Ephemeral: lives only until the user answers
/// the prompt or the selection token expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub quality_label: String,
    pub format_id: String,
    pub approx_size_bytes: Option<u64>,
}

impl FormatChoice {
    /// Inline-button caption, e.g. "720p (12.34 MB)".
    pub fn button_label(&self) -> String {
        match self.approx_size_bytes {
            Some(bytes) => format!("{} ({})", self.quality_label, format_size_mb(bytes)),
            None => format!("{} (Size Unknown)", self.quality_label),
        }
    }
}

fn quality_label(descriptor: &FormatDescriptor) -> String {
    match &descriptor.format_note {
        Some(note) if !note.is_empty() => note.clone(),
        _ => match descriptor.height {
            Some(h) if h > 0 => format!("{}p", h),
            _ => "Unknown".to_string(),
        },
    }
}

/// Reduce format metadata to an ordered list of choices.
///
/// Eligible formats come from a fixed allow-list of known-good ids; choices
/// are deduplicated by quality label keeping the first occurrence, then
/// sorted by descending resolution.
pub fn resolve_choices(metadata: &VideoMetadata) -> BotResult<Vec<FormatChoice>> {
    let mut choices: Vec<FormatChoice> = Vec::new();

    for descriptor in &metadata.formats {
        if !KNOWN_GOOD_FORMAT_IDS.contains(&descriptor.format_id.as_str()) {
            continue;
        }

        let label = quality_label(descriptor);
        if choices.iter().any(|c| c.quality_label == label) {
            continue;
        }

        choices.push(FormatChoice {
            quality_label: label,
            format_id: descriptor.format_id.clone(),
            approx_size_bytes: descriptor.filesize,
        });
    }

    // Highest resolution first; the allow-list maps each id to a height,
    // so sort by the descriptor heights we saw
    let height_of = |choice: &FormatChoice| -> u32 {
        metadata
            .formats
            .iter()
            .find(|f| f.format_id == choice.format_id)
            .and_then(|f| f.height)
            .unwrap_or(0)
    };
    choices.sort_by(|a, b| height_of(b).cmp(&height_of(a)));

    if choices.is_empty() {
        return Err(BotError::NoFormatsAvailable);
    }

    Ok(choices)
}

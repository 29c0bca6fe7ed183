//! Binding to the `yt-dlp` extraction backend.
//! Spawns the executable, never reimplements extraction.

use std::time::Duration;

use serde::Deserialize;
use tokio::process;
use tokio::time::timeout;

use crate::errors::{BotError, BotResult};

/// One encoding of the source video, as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    pub height: Option<u32>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
    pub format_note: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

/// Direct-media URLs resolved for a chosen format.
///
/// Split streams stay structured here; only the persisted record flattens
/// them into the legacy pipe-separated composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMedia {
    /// Single stream carrying both video and audio
    Muxed(String),
    /// Separate video and audio streams the consumer must combine
    Split { video: String, audio: String },
    /// Audio-only fallback when no video stream was resolvable
    AudioOnly(String),
}

/// Separator used in the stored composite URL. Consumers split on it to
/// recover the two streams.
pub const COMPOSITE_SEPARATOR: char = '|';

impl ResolvedMedia {
    /// Flat form written to the link record.
    pub fn storage_url(&self) -> String {
        match self {
            ResolvedMedia::Muxed(url) | ResolvedMedia::AudioOnly(url) => url.clone(),
            ResolvedMedia::Split { video, audio } => {
                format!("{}{}{}", video, COMPOSITE_SEPARATOR, audio)
            }
        }
    }

    /// URL the user actually downloads from (video stream when split).
    pub fn primary_url(&self) -> &str {
        match self {
            ResolvedMedia::Muxed(url) | ResolvedMedia::AudioOnly(url) => url,
            ResolvedMedia::Split { video, .. } => video,
        }
    }
}

fn base_command() -> process::Command {
    let mut cmd = process::Command::new("yt-dlp");
    cmd.arg("--no-playlist")
        .args(["--socket-timeout", "5", "--retries", "3"]);
    cmd
}

async fn run(mut cmd: process::Command, bound: Duration) -> BotResult<String> {
    let output = timeout(bound, cmd.output())
        .await
        .map_err(|_| BotError::UpstreamTimeout("yt-dlp"))?
        .map_err(|e| BotError::extraction_failed(format!("failed to spawn yt-dlp: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(BotError::extraction_failed(stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Fetch title and the full format list for a video URL.
pub async fn fetch_metadata(url: &str, bound: Duration) -> BotResult<VideoMetadata> {
    let mut cmd = base_command();
    cmd.args(["-J"]).arg(url); // single-line JSON dump

    let stdout = run(cmd, bound).await?;
    let metadata: VideoMetadata = serde_json::from_str(&stdout)
        .map_err(|e| BotError::parse_error(format!("failed to parse yt-dlp output: {}", e)))?;

    Ok(metadata)
}

/// Resolve direct-media URLs for the chosen format, combined with the best
/// available audio track. Falls back to audio-only when the format request
/// yields nothing; `MediaUnavailable` when even that fails.
pub async fn resolve_direct_media(
    url: &str,
    format_id: &str,
    bound: Duration,
) -> BotResult<ResolvedMedia> {
    let selector = format!("{}+bestaudio/best", format_id);
    let mut cmd = base_command();
    cmd.args(["-f", &selector]).arg("-g").arg(url);

    if let Ok(stdout) = run(cmd, bound).await {
        if let Some(media) = parse_printed_urls(&stdout) {
            return Ok(media);
        }
    }

    // Audio fallback: the chosen video format had no resolvable URL
    let mut cmd = base_command();
    cmd.args(["-f", "bestaudio/best"]).arg("-g").arg(url);

    match run(cmd, bound).await {
        Ok(stdout) => match parse_printed_urls(&stdout) {
            Some(ResolvedMedia::Muxed(audio)) => Ok(ResolvedMedia::AudioOnly(audio)),
            Some(other) => Ok(other),
            None => Err(BotError::MediaUnavailable),
        },
        Err(BotError::UpstreamTimeout(w)) => Err(BotError::UpstreamTimeout(w)),
        Err(_) => Err(BotError::MediaUnavailable),
    }
}

/// `-g` prints one URL per line: one line for a muxed stream, two when
/// video and audio come from separate streams.
fn parse_printed_urls(stdout: &str) -> Option<ResolvedMedia> {
    let urls: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match urls.as_slice() {
        [single] => Some(ResolvedMedia::Muxed(single.to_string())),
        [video, audio, ..] => Some(ResolvedMedia::Split {
            video: video.to_string(),
            audio: audio.to_string(),
        }),
        [] => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metadata_with_partial_fields() {
        let json = r#"{
            "title": "Test Video",
            "formats": [
                {"format_id": "18", "height": 360, "vcodec": "avc1", "acodec": "mp4a",
                 "filesize": 1000, "format_note": "360p", "url": "https://cdn/18"},
                {"format_id": "251", "height": null, "vcodec": "none", "acodec": "opus"}
            ]
        }"#;

        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Test Video"));
        assert_eq!(meta.formats.len(), 2);
        assert_eq!(meta.formats[1].height, None);
        assert_eq!(meta.formats[1].filesize, None);
    }

    #[test]
    fn metadata_without_formats_is_empty() {
        let meta: VideoMetadata = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert!(meta.formats.is_empty());
    }

    #[test]
    fn one_printed_url_is_muxed() {
        let media = parse_printed_urls("https://cdn/video\n").unwrap();
        assert_eq!(media, ResolvedMedia::Muxed("https://cdn/video".to_string()));
        assert_eq!(media.storage_url(), "https://cdn/video");
    }

    #[test]
    fn two_printed_urls_are_split() {
        let media = parse_printed_urls("https://cdn/video\nhttps://cdn/audio\n").unwrap();
        assert_eq!(
            media,
            ResolvedMedia::Split {
                video: "https://cdn/video".to_string(),
                audio: "https://cdn/audio".to_string(),
            }
        );
        assert_eq!(media.storage_url(), "https://cdn/video|https://cdn/audio");
        assert_eq!(media.primary_url(), "https://cdn/video");
    }

    #[test]
    fn empty_output_is_none() {
        assert!(parse_printed_urls("\n  \n").is_none());
    }
}

pub mod client;

pub use client::PlatformClient;

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Reference to one video on the platform: opaque id plus an optional
/// session credential. Immutable once constructed; the id keys every cached
/// artifact derived from the video.
#[derive(Debug, Clone)]
pub struct VideoRef {
    id: String,
    credential: Option<String>,
}

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/video/([A-Za-z0-9_-]+)").expect("valid regex"))
}

impl VideoRef {
    /// Accepts either a bare video id or a full `.../video/<id>` URL.
    pub fn parse(input: &str, credential: Option<String>) -> Option<Self> {
        let input = input.trim();
        let id = if let Some(caps) = url_regex().captures(input) {
            caps[1].to_string()
        } else if id_regex().is_match(input) {
            input.to_string()
        } else {
            return None;
        };
        Some(Self { id, credential })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }
}

/// One entry of the platform's subtitle-track listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleTrackInfo {
    pub id: u64,
    pub locale: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VideoStat {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
}

/// Video metadata as returned by the platform's view endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    /// Duration in seconds.
    pub duration: u64,
    #[serde(default)]
    pub owner: String,
    /// Internal numeric id used by the stream and subtitle endpoints.
    pub stream_id: u64,
    #[serde(default)]
    pub stat: VideoStat,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrackInfo>,
}

/// One downloadable stream variant; the playurl endpoint lists these
/// best-quality-first.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSource {
    pub quality: u32,
    pub format: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_id() {
        let v = VideoRef::parse("AV1xK4y187vv", None).unwrap();
        assert_eq!(v.id(), "AV1xK4y187vv");
        assert!(v.credential().is_none());
    }

    #[test]
    fn test_parse_url() {
        let v = VideoRef::parse(
            "https://www.example.tv/video/AV1xK4y187vv?p=1",
            Some("sess=abc".to_string()),
        )
        .unwrap();
        assert_eq!(v.id(), "AV1xK4y187vv");
        assert_eq!(v.credential(), Some("sess=abc"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(VideoRef::parse("not a video id!", None).is_none());
        assert!(VideoRef::parse("", None).is_none());
    }
}

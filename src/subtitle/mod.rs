pub mod flat;
pub mod json;
pub mod srt;

use crate::config::OutputFormat;
use std::time::Duration;

/// A single timed line of subtitle text.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// An ordered cue sequence, possibly empty.
#[derive(Debug, Clone, Default)]
pub struct SubtitleTrack {
    pub cues: Vec<SubtitleCue>,
    /// Locale tag of a platform-native track; generated tracks carry none.
    pub locale: Option<String>,
}

impl SubtitleTrack {
    pub fn new(cues: Vec<SubtitleCue>) -> Self {
        Self { cues, locale: None }
    }

    pub fn with_locale(mut self, locale: String) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// End timestamp of the last cue.
    pub fn duration(&self) -> Duration {
        self.cues.last().map(|c| c.end).unwrap_or(Duration::ZERO)
    }
}

pub trait SubtitleFormatter {
    fn format(&self, cues: &[SubtitleCue]) -> String;
    fn extension(&self) -> &'static str;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn SubtitleFormatter> {
    match format {
        OutputFormat::Flat => Box::new(flat::FlatFormatter),
        OutputFormat::Srt => Box::new(srt::SrtFormatter),
        OutputFormat::Json => Box::new(json::JsonFormatter::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_duration() {
        let track = SubtitleTrack::new(vec![
            SubtitleCue {
                start: Duration::from_secs(0),
                end: Duration::from_secs(2),
                text: "one".to_string(),
            },
            SubtitleCue {
                start: Duration::from_secs(2),
                end: Duration::from_millis(4500),
                text: "two".to_string(),
            },
        ]);
        assert_eq!(track.duration(), Duration::from_millis(4500));
        assert!(!track.is_empty());
    }

    #[test]
    fn test_empty_track() {
        let track = SubtitleTrack::default();
        assert!(track.is_empty());
        assert_eq!(track.duration(), Duration::ZERO);
    }
}

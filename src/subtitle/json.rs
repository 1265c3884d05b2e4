// JSON subtitle format
use super::{SubtitleCue, SubtitleFormatter};
use serde::Serialize;

#[derive(Default)]
pub struct JsonFormatter {
    pub video_id: Option<String>,
    pub locale: Option<String>,
}

#[derive(Serialize)]
struct JsonOutput {
    metadata: JsonMetadata,
    cues: Vec<JsonCue>,
}

#[derive(Serialize)]
struct JsonMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    cue_count: usize,
}

#[derive(Serialize)]
struct JsonCue {
    start: f64,
    end: f64,
    text: String,
}

impl SubtitleFormatter for JsonFormatter {
    fn format(&self, cues: &[SubtitleCue]) -> String {
        let output = JsonOutput {
            metadata: JsonMetadata {
                video_id: self.video_id.clone(),
                locale: self.locale.clone(),
                cue_count: cues.len(),
            },
            cues: cues
                .iter()
                .map(|c| JsonCue {
                    start: c.start.as_secs_f64(),
                    end: c.end.as_secs_f64(),
                    text: c.text.clone(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

// Flat timestamped-text format, one cue per line: `12.34 -> 15.60: text`.
// This is also the on-disk cache format, so it has a parser.
use super::{SubtitleCue, SubtitleFormatter};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

pub struct FlatFormatter;

impl SubtitleFormatter for FlatFormatter {
    fn format(&self, cues: &[SubtitleCue]) -> String {
        let mut output = String::new();
        for cue in cues {
            output.push_str(&format!(
                "{:.2} -> {:.2}: {}\n",
                cue.start.as_secs_f64(),
                cue.end.as_secs_f64(),
                cue.text
            ));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?) -> (\d+(?:\.\d+)?): (.*)$").expect("valid regex")
    })
}

/// Parse a flat subtitle file back into cues. Lines that do not match the
/// cue shape are skipped.
pub fn parse_flat(content: &str) -> Vec<SubtitleCue> {
    let re = line_regex();
    content
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim_end())?;
            let start: f64 = caps[1].parse().ok()?;
            let end: f64 = caps[2].parse().ok()?;
            Some(SubtitleCue {
                start: Duration::from_secs_f64(start),
                end: Duration::from_secs_f64(end),
                text: caps[3].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cues() -> Vec<SubtitleCue> {
        vec![
            SubtitleCue {
                start: Duration::from_millis(1500),
                end: Duration::from_secs(4),
                text: "Hello, world!".to_string(),
            },
            SubtitleCue {
                start: Duration::from_millis(4500),
                end: Duration::from_secs(7),
                text: "This is a test.".to_string(),
            },
        ]
    }

    #[test]
    fn test_flat_format() {
        let output = FlatFormatter.format(&sample_cues());
        assert_eq!(
            output,
            "1.50 -> 4.00: Hello, world!\n4.50 -> 7.00: This is a test.\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        let cues = sample_cues();
        let parsed = parse_flat(&FlatFormatter.format(&cues));
        assert_eq!(parsed, cues);
    }

    #[test]
    fn test_parse_skips_garbage_lines() {
        let parsed = parse_flat("not a cue\n1.00 -> 2.00: ok\n\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "ok");
    }

    #[test]
    fn test_parse_keeps_colons_in_text() {
        let parsed = parse_flat("0.00 -> 1.00: a: b -> c\n");
        assert_eq!(parsed[0].text, "a: b -> c");
    }
}

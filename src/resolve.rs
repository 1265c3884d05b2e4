use crate::error::{Result, SubfetchError};
use crate::platform::{PlatformClient, SubtitleTrackInfo, VideoInfo, VideoRef};
use crate::subtitle::SubtitleTrack;
use tracing::{debug, info, warn};

/// A platform-native track selected for a video.
#[derive(Debug)]
pub struct NativeTrack {
    pub track: SubtitleTrack,
    /// Whether the AI-generated variant of the chosen track was used.
    pub ai_variant: bool,
}

/// Pick the best human-authored track: primary locale, then the secondary
/// variant, then the first listed.
pub fn select_track<'a>(
    tracks: &'a [SubtitleTrackInfo],
    primary_locale: &str,
    secondary_locale: &str,
) -> Option<&'a SubtitleTrackInfo> {
    tracks
        .iter()
        .find(|t| t.locale == primary_locale)
        .or_else(|| tracks.iter().find(|t| t.locale == secondary_locale))
        .or_else(|| tracks.first())
}

/// Resolve the best available platform-native subtitle track.
///
/// Returns `Ok(None)` when the video has nothing usable (no tracks listed,
/// or the payload parses to zero cues) so the caller can fall back to
/// generation. A selected track with no content URL is an error: the
/// listing promised data it cannot deliver.
pub async fn resolve_native(
    client: &PlatformClient,
    video: &VideoRef,
    info: &VideoInfo,
    primary_locale: &str,
    secondary_locale: &str,
) -> Result<Option<NativeTrack>> {
    let Some(selected) = select_track(&info.subtitles, primary_locale, secondary_locale) else {
        debug!("no native subtitle tracks listed for {}", video.id());
        return Ok(None);
    };
    debug!(
        "selected native track {} ({}) for {}",
        selected.id,
        selected.locale,
        video.id()
    );

    // The AI-generated counterpart of the same track id is treated as
    // higher fidelity. Listing failures fall back to the human track.
    let mut chosen = selected.clone();
    let mut ai_variant = false;
    match client.ai_subtitles(video, info.stream_id).await {
        Ok(ai_tracks) => {
            if let Some(ai) = ai_tracks.into_iter().find(|t| t.id == selected.id) {
                debug!("using AI variant of track {}", selected.id);
                chosen = ai;
                ai_variant = true;
            }
        }
        Err(e) => warn!("AI subtitle listing unavailable: {e}"),
    }

    if chosen.url.is_empty() {
        return Err(SubfetchError::NoData(format!(
            "subtitle track {} has no content URL",
            chosen.id
        )));
    }

    let cues = client.fetch_subtitle_cues(&chosen.url).await?;
    if cues.is_empty() {
        debug!("native track {} parsed to zero cues", chosen.id);
        return Ok(None);
    }

    info!(
        "resolved native subtitles for {}: {} cues ({})",
        video.id(),
        cues.len(),
        chosen.locale
    );
    Ok(Some(NativeTrack {
        track: SubtitleTrack::new(cues).with_locale(chosen.locale),
        ai_variant,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u64, locale: &str) -> SubtitleTrackInfo {
        SubtitleTrackInfo {
            id,
            locale: locale.to_string(),
            url: format!("https://example.com/sub/{id}.json"),
        }
    }

    #[test]
    fn test_select_prefers_primary_locale() {
        let tracks = vec![track(1, "en-US"), track(2, "zh-CN"), track(3, "zh-Hans")];
        let chosen = select_track(&tracks, "zh-CN", "zh-Hans").unwrap();
        assert_eq!(chosen.id, 2);
    }

    #[test]
    fn test_select_falls_back_to_secondary() {
        let tracks = vec![track(1, "en-US"), track(3, "zh-Hans")];
        let chosen = select_track(&tracks, "zh-CN", "zh-Hans").unwrap();
        assert_eq!(chosen.id, 3);
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let tracks = vec![track(7, "ja-JP"), track(8, "ko-KR")];
        let chosen = select_track(&tracks, "zh-CN", "zh-Hans").unwrap();
        assert_eq!(chosen.id, 7);
    }

    #[test]
    fn test_select_empty_listing() {
        assert!(select_track(&[], "zh-CN", "zh-Hans").is_none());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let tracks = vec![track(1, "en-US"), track(2, "zh-CN"), track(3, "zh-CN")];
        for _ in 0..10 {
            assert_eq!(select_track(&tracks, "zh-CN", "zh-Hans").unwrap().id, 2);
        }
    }
}

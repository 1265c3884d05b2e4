use crate::error::{Result, SubfetchError};
use crate::platform::VideoRef;
use crate::store::{ArtifactKind, ArtifactStore};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Result of the extraction stage. `fresh` is false on a cache hit; the
/// transcription stage keys its failure cleanup on it.
#[derive(Debug)]
pub struct ExtractOutcome {
    pub path: PathBuf,
    pub fresh: bool,
}

/// Verify the transcoder binary runs at all. Its absence is a configuration
/// problem, not something to retry.
pub async fn check_transcoder(program: &str) -> Result<()> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .await
        .map_err(|e| {
            SubfetchError::MissingDependency(format!(
                "transcoder '{program}' not found. Install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(SubfetchError::MissingDependency(format!(
            "transcoder '{program}' failed its version check"
        )));
    }

    debug!("transcoder '{program}' is available");
    Ok(())
}

/// Extract the audio track of a downloaded video into the audio artifact
/// slot as 16 kHz mono PCM WAV.
///
/// An existing audio artifact short-circuits the transcode. The transcoder
/// writes to a temp file that is promoted only after its exit status and
/// output both check out; on any failure the temp file is dropped, which
/// deletes it.
pub async fn extract_audio(
    store: &ArtifactStore,
    video: &VideoRef,
    video_path: &Path,
    program: &str,
) -> Result<ExtractOutcome> {
    let _guard = store.lock(video.id(), ArtifactKind::Audio).await;

    if let Some(path) = store.cached(video.id(), ArtifactKind::Audio) {
        return Ok(ExtractOutcome { path, fresh: false });
    }

    check_transcoder(program).await?;

    let temp = store.temp_file(".wav")?;
    let output = Command::new(program)
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(temp.path())
        .output()
        .await
        .map_err(|e| SubfetchError::Extraction(format!("failed to run transcoder: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SubfetchError::Extraction(format!(
            "transcoder exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    // Exit status alone is not trusted; the output must exist and be a
    // readable WAV file.
    verify_wav(temp.path())?;

    let path = store.promote(temp, video.id(), ArtifactKind::Audio)?;
    info!("extracted audio for {} to {}", video.id(), path.display());
    Ok(ExtractOutcome { path, fresh: true })
}

fn verify_wav(path: &Path) -> Result<()> {
    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(SubfetchError::Extraction(
            "transcoder produced no output".to_string(),
        ));
    }
    let reader = hound::WavReader::open(path)
        .map_err(|e| SubfetchError::Extraction(format!("transcoder output is not valid WAV: {e}")))?;
    debug!(
        "extracted audio: {} Hz, {} channel(s), {} samples",
        reader.spec().sample_rate,
        reader.spec().channels,
        reader.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_transcoder_is_a_dependency_error() {
        let result = check_transcoder("definitely-not-a-real-transcoder").await;
        match result {
            Err(SubfetchError::MissingDependency(msg)) => {
                assert!(msg.contains("definitely-not-a-real-transcoder"));
            }
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_wav_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.wav");
        std::fs::write(&path, b"mpeg frames, allegedly").unwrap();
        assert!(matches!(
            verify_wav(&path),
            Err(SubfetchError::Extraction(_))
        ));
    }

    #[test]
    fn test_verify_wav_accepts_real_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..160 {
            writer.write_sample((i % 32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        assert!(verify_wav(&path).is_ok());
    }
}

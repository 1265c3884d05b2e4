use crate::config::DownloadPolicy;
use crate::error::{Result, SubfetchError};
use crate::platform::{PlatformClient, VideoRef};
use crate::store::{ArtifactKind, ArtifactStore};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Download the resolved stream URL into the video artifact slot.
///
/// An existing video artifact short-circuits the download entirely. Each
/// attempt streams into a temp file and is promoted only once complete, so
/// a failed attempt never leaves a partial artifact behind. Transport
/// errors, non-success statuses and empty bodies are retried up to
/// `policy.max_attempts` with a fixed backoff between attempts.
pub async fn download_stream(
    client: &PlatformClient,
    video: &VideoRef,
    url: &str,
    store: &ArtifactStore,
    policy: &DownloadPolicy,
) -> Result<PathBuf> {
    let _guard = store.lock(video.id(), ArtifactKind::Video).await;

    if let Some(path) = store.cached(video.id(), ArtifactKind::Video) {
        return Ok(path);
    }

    let mut last_error: Option<SubfetchError> = None;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            warn!(
                "download attempt {}/{} for {} after: {}",
                attempt,
                policy.max_attempts,
                video.id(),
                last_error.as_ref().map(|e| e.to_string()).unwrap_or_default()
            );
            tokio::time::sleep(policy.backoff).await;
        }

        match fetch_once(client, url, store).await {
            Ok(temp) => {
                let path = store.promote(temp, video.id(), ArtifactKind::Video)?;
                info!("downloaded stream for {} to {}", video.id(), path.display());
                return Ok(path);
            }
            Err(e) => {
                debug!("download attempt {attempt} failed: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(SubfetchError::Download {
        attempts: policy.max_attempts,
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}

/// One streaming GET into a temp file. The temp file deletes itself if this
/// returns an error.
async fn fetch_once(
    client: &PlatformClient,
    url: &str,
    store: &ArtifactStore,
) -> Result<tempfile::NamedTempFile> {
    let response = client.stream_request(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SubfetchError::Api(format!(
            "stream endpoint returned {status}"
        )));
    }

    let mut temp = store.temp_file(".mp4")?;
    let mut written: u64 = 0;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        temp.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    temp.flush()?;

    // A 200 with no bytes is still a failed download.
    if written == 0 {
        return Err(SubfetchError::Api(
            "stream endpoint returned an empty body".to_string(),
        ));
    }

    debug!("fetched {written} bytes from stream endpoint");
    Ok(temp)
}

use crate::config::Config;
use crate::error::{Result, SubfetchError};
use crate::platform::{StreamSource, SubtitleTrackInfo, VideoInfo, VideoRef};
use crate::subtitle::SubtitleCue;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Every platform endpoint wraps its payload in this envelope; a non-zero
/// code carries a human-readable message instead of data.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// Cue payload of a native subtitle track.
#[derive(Debug, Deserialize)]
struct SubtitlePayload {
    #[serde(default)]
    body: Vec<RawCue>,
}

#[derive(Debug, Deserialize)]
struct RawCue {
    from: f64,
    to: f64,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SubtitleListData {
    #[serde(default)]
    subtitles: Vec<SubtitleTrackInfo>,
}

#[derive(Debug, Deserialize)]
struct PlayUrlData {
    #[serde(default)]
    sources: Vec<StreamSource>,
}

/// Client for the platform's metadata, subtitle and stream-resolution
/// endpoints.
pub struct PlatformClient {
    http: reqwest::Client,
    api_base: String,
    credential: Option<String>,
    referer: String,
    user_agent: String,
}

impl PlatformClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credential: config.credential.clone(),
            referer: config.referer.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn get(&self, url: &str, credential: Option<&str>) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::REFERER, &self.referer);
        if let Some(cred) = credential.or(self.credential.as_deref()) {
            req = req.header(reqwest::header::COOKIE, cred.to_string());
        }
        req
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: Option<&str>,
    ) -> Result<T> {
        debug!("GET {url}");
        let response = self.get(url, credential).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubfetchError::Api(format!(
                "{url} returned {status}: {body}"
            )));
        }

        let body = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| SubfetchError::Api(format!("{url} returned a malformed body: {e}")))?;
        if envelope.code != 0 {
            return Err(SubfetchError::Api(format!(
                "{url} returned code {}: {}",
                envelope.code, envelope.message
            )));
        }
        envelope
            .data
            .ok_or_else(|| SubfetchError::Api(format!("{url} returned an empty data field")))
    }

    /// Fetch title, duration, stream id and the human subtitle listing.
    pub async fn video_info(&self, video: &VideoRef) -> Result<VideoInfo> {
        let url = format!("{}/video/view?id={}", self.api_base, video.id());
        self.get_data(&url, video.credential()).await
    }

    /// Fetch the AI-generated subtitle listing for a stream.
    pub async fn ai_subtitles(
        &self,
        video: &VideoRef,
        stream_id: u64,
    ) -> Result<Vec<SubtitleTrackInfo>> {
        let url = format!(
            "{}/video/subtitles?stream_id={}&ai=1",
            self.api_base, stream_id
        );
        let data: SubtitleListData = self.get_data(&url, video.credential()).await?;
        Ok(data.subtitles)
    }

    /// Resolve downloadable stream URLs for a video, best quality first.
    pub async fn stream_sources(
        &self,
        video: &VideoRef,
        stream_id: u64,
    ) -> Result<Vec<StreamSource>> {
        let url = format!("{}/video/playurl?stream_id={}", self.api_base, stream_id);
        let data: PlayUrlData = self.get_data(&url, video.credential()).await?;
        Ok(data.sources)
    }

    /// Fetch and parse a native subtitle payload. A single GET with no
    /// retry; non-200 or a malformed body is an upstream failure.
    pub async fn fetch_subtitle_cues(&self, url: &str) -> Result<Vec<SubtitleCue>> {
        // Listings sometimes carry scheme-relative URLs.
        let url = if url.starts_with("//") {
            format!("https:{url}")
        } else {
            url.to_string()
        };

        debug!("GET {url}");
        let response = self.get(&url, None).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubfetchError::Api(format!(
                "subtitle payload fetch returned {status}"
            )));
        }

        let body = response.text().await?;
        let payload: SubtitlePayload = serde_json::from_str(&body)
            .map_err(|e| SubfetchError::Api(format!("malformed subtitle payload: {e}")))?;
        Ok(payload
            .body
            .into_iter()
            .map(|c| SubtitleCue {
                start: Duration::from_secs_f64(c.from.max(0.0)),
                end: Duration::from_secs_f64(c.to.max(0.0)),
                text: c.content,
            })
            .collect())
    }

    /// Request builder for a stream download; carries the referer and
    /// user-agent the CDN insists on.
    pub fn stream_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.get(url, None)
    }
}

use crate::config::{Config, PollPolicy};
use crate::error::{Result, SubfetchError};
use crate::subtitle::SubtitleCue;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Remote-side job state; the service owns it, we only poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    asset_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobPoll {
    status: JobStatus,
    #[serde(default)]
    cues: Vec<RawCue>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCue {
    from: f64,
    to: f64,
    content: String,
}

/// Client for the job-based ASR service: upload bytes, create a job, poll
/// it to completion.
pub struct AsrClient {
    http: reqwest::Client,
    base: String,
    api_key: Option<String>,
}

impl AsrClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: config.asr_base.trim_end_matches('/').to_string(),
            api_key: config.asr_api_key.clone(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        &self,
        what: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubfetchError::Api(format!("{what} returned {status}: {body}")));
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| SubfetchError::Api(format!("{what} returned a malformed body: {e}")))
    }

    /// Upload raw audio bytes; returns the asset handle jobs reference.
    pub async fn upload(&self, bytes: Vec<u8>) -> Result<String> {
        debug!("uploading {} bytes to ASR service", bytes.len());
        let response = self
            .authed(self.http.post(format!("{}/v1/upload", self.base)))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        let parsed: UploadResponse = self.expect_json("ASR upload", response).await?;
        Ok(parsed.asset_id)
    }

    /// Create a transcription job for an uploaded asset.
    pub async fn create_job(&self, asset_id: &str) -> Result<String> {
        let response = self
            .authed(self.http.post(format!("{}/v1/jobs", self.base)))
            .json(&serde_json::json!({ "asset_id": asset_id }))
            .send()
            .await?;
        let parsed: CreateJobResponse = self.expect_json("ASR job creation", response).await?;
        debug!("created ASR job {}", parsed.job_id);
        Ok(parsed.job_id)
    }

    async fn poll_job(&self, job_id: &str) -> Result<JobPoll> {
        let response = self
            .authed(self.http.get(format!("{}/v1/jobs/{job_id}", self.base)))
            .send()
            .await?;
        self.expect_json("ASR job poll", response).await
    }

    /// Transcribe a local audio file end to end: upload, create a job, poll
    /// until it completes, parse the cues.
    ///
    /// Upload and job creation are preconditions; either failing fails the
    /// call without retry. The poll loop is bounded by `policy.deadline`; a
    /// job still pending at the deadline surfaces a timeout, distinct from
    /// a transport or job failure. A job that completes with zero cues is
    /// "no data", also distinct from failure.
    pub async fn transcribe_file(
        &self,
        audio_path: &Path,
        policy: &PollPolicy,
    ) -> Result<Vec<SubtitleCue>> {
        let bytes = tokio::fs::read(audio_path).await?;
        let asset_id = self.upload(bytes).await?;
        let job_id = self.create_job(&asset_id).await?;

        info!("polling ASR job {job_id} every {:?}", policy.interval);
        let started = Instant::now();
        loop {
            let poll = self.poll_job(&job_id).await?;
            match poll.status {
                JobStatus::Complete => {
                    if poll.cues.is_empty() {
                        return Err(SubfetchError::NoData(format!(
                            "ASR job {job_id} completed with no cues"
                        )));
                    }
                    info!("ASR job {job_id} complete: {} cues", poll.cues.len());
                    return Ok(poll
                        .cues
                        .into_iter()
                        .map(|c| SubtitleCue {
                            start: Duration::from_secs_f64(c.from.max(0.0)),
                            end: Duration::from_secs_f64(c.to.max(0.0)),
                            text: c.content,
                        })
                        .collect());
                }
                JobStatus::Failed => {
                    return Err(SubfetchError::Transcription(format!(
                        "ASR job {job_id} failed: {}",
                        poll.error.unwrap_or_else(|| "no reason given".to_string())
                    )));
                }
                JobStatus::Queued | JobStatus::Running => {
                    if started.elapsed() >= policy.deadline {
                        warn!("ASR job {job_id} still {:?} at deadline", poll.status);
                        return Err(SubfetchError::Timeout(format!(
                            "ASR job {job_id} did not complete within {:?}",
                            policy.deadline
                        )));
                    }
                    debug!("ASR job {job_id} is {:?}", poll.status);
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }
}

use crate::asr::AsrClient;
use crate::config::Config;
use crate::download::download_stream;
use crate::error::{Result, SubfetchError};
use crate::extract::extract_audio;
use crate::platform::{PlatformClient, VideoInfo, VideoRef};
use crate::resolve::{resolve_native, NativeTrack};
use crate::store::{ArtifactKind, ArtifactStore};
use crate::subtitle::flat::{parse_flat, FlatFormatter};
use crate::subtitle::{SubtitleFormatter, SubtitleTrack};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where an acquired track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionSource {
    /// Previously produced subtitle file, returned without any network.
    CachedSubtitle,
    /// Human-authored platform track.
    Native,
    /// AI-generated platform track.
    NativeAi,
    /// Generated here via download, extraction and remote transcription.
    Transcribed,
}

impl std::fmt::Display for AcquisitionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionSource::CachedSubtitle => write!(f, "cached"),
            AcquisitionSource::Native => write!(f, "native"),
            AcquisitionSource::NativeAi => write!(f, "native (AI)"),
            AcquisitionSource::Transcribed => write!(f, "transcribed"),
        }
    }
}

/// A successful acquisition.
#[derive(Debug)]
pub struct Acquisition {
    pub track: SubtitleTrack,
    pub source: AcquisitionSource,
    /// Canonical path the flat subtitle file was written to (or read from).
    pub subtitle_path: PathBuf,
    /// The cached video file, when the generation path ran.
    pub video_path: Option<PathBuf>,
}

/// The pipeline stage a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Download,
    Extract,
    Transcribe,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Resolve => write!(f, "native-subtitle resolution"),
            Stage::Download => write!(f, "stream download"),
            Stage::Extract => write!(f, "audio extraction"),
            Stage::Transcribe => write!(f, "transcription"),
        }
    }
}

/// A failed acquisition: which stage failed, why, and any artifact that was
/// completed before the failure (a downloaded video survives an extraction
/// failure, for example).
#[derive(Debug)]
pub struct AcquireFailure {
    pub stage: Stage,
    pub error: SubfetchError,
    pub artifact: Option<PathBuf>,
}

impl std::fmt::Display for AcquireFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)?;
        if let Some(path) = &self.artifact {
            write!(f, " (kept artifact: {})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for AcquireFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The subtitle-acquisition pipeline.
///
/// Stages run strictly in sequence on one logical task: native-subtitle
/// resolution first; only if nothing native is usable, stream download,
/// audio extraction and remote transcription. Every derived artifact is
/// cached per video id.
pub struct SubtitleAcquirer {
    config: Config,
    platform: PlatformClient,
    asr: AsrClient,
    store: ArtifactStore,
    show_progress: bool,
}

impl SubtitleAcquirer {
    pub fn new(config: Config) -> Result<Self> {
        let platform = PlatformClient::new(&config);
        let asr = AsrClient::new(&config);
        let store = ArtifactStore::new(&config.data_dir)?;
        Ok(Self {
            config,
            platform,
            asr,
            store,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub async fn video_info(&self, video: &VideoRef) -> Result<VideoInfo> {
        self.platform.video_info(video).await
    }

    fn spinner(&self, msg: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Acquire subtitles for one video, start to finish.
    ///
    /// With `revalidate` set the subtitle cache is bypassed and the
    /// pipeline re-runs; cached video and audio artifacts still apply.
    pub async fn acquire(
        &self,
        video: &VideoRef,
        revalidate: bool,
    ) -> std::result::Result<Acquisition, AcquireFailure> {
        if !revalidate {
            if let Some(path) = self.store.cached(video.id(), ArtifactKind::Subtitle) {
                return self.load_cached(video, path);
            }
        }

        // Stage 1: platform-native subtitles.
        info!("resolving native subtitles for {}", video.id());
        let pb = self.spinner("Resolving native subtitles...");
        let resolved: std::result::Result<(VideoInfo, Option<NativeTrack>), AcquireFailure> = async {
            let info = self
                .platform
                .video_info(video)
                .await
                .map_err(|error| self.fail(Stage::Resolve, error, None))?;
            let native = resolve_native(
                &self.platform,
                video,
                &info,
                &self.config.primary_locale,
                &self.config.secondary_locale,
            )
            .await
            .map_err(|error| self.fail(Stage::Resolve, error, None))?;
            Ok((info, native))
        }
        .await;
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let (info, native) = resolved?;

        if let Some(native) = native {
            let subtitle_path = self
                .persist_track(video, &native.track)
                .await
                .map_err(|error| self.fail(Stage::Resolve, error, None))?;
            return Ok(Acquisition {
                track: native.track,
                source: if native.ai_variant {
                    AcquisitionSource::NativeAi
                } else {
                    AcquisitionSource::Native
                },
                subtitle_path,
                video_path: None,
            });
        }

        // Stages 2-4: generate from the stream.
        info!(
            "no usable native subtitles for {}; generating from stream",
            video.id()
        );

        let pb = self.spinner("Downloading stream...");
        let video_path = self.download(video, &info).await;
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let video_path = video_path?;

        let pb = self.spinner("Extracting audio...");
        let extracted = extract_audio(
            &self.store,
            video,
            &video_path,
            &self.config.ffmpeg_program,
        )
        .await
        .map_err(|error| self.fail(Stage::Extract, error, Some(video_path.clone())));
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let extracted = extracted?;

        let pb = self.spinner("Transcribing audio...");
        let transcribed = self
            .asr
            .transcribe_file(&extracted.path, &self.config.poll_policy())
            .await;
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        let cues = match transcribed {
            Ok(cues) => cues,
            Err(error) => {
                // Audio produced just for this run yielded nothing usable;
                // don't keep it as if it were a good cache entry.
                if extracted.fresh {
                    if let Err(e) = self.store.remove(video.id(), ArtifactKind::Audio) {
                        warn!("failed to clean up audio artifact: {e}");
                    }
                }
                return Err(self.fail(Stage::Transcribe, error, Some(video_path)));
            }
        };

        let track = SubtitleTrack::new(cues);
        let subtitle_path = self
            .persist_track(video, &track)
            .await
            .map_err(|error| self.fail(Stage::Transcribe, error, Some(video_path.clone())))?;

        info!(
            "acquired {} cues for {} at {}",
            track.cues.len(),
            video.id(),
            subtitle_path.display()
        );
        Ok(Acquisition {
            track,
            source: AcquisitionSource::Transcribed,
            subtitle_path,
            video_path: Some(video_path),
        })
    }

    async fn download(
        &self,
        video: &VideoRef,
        info: &VideoInfo,
    ) -> std::result::Result<PathBuf, AcquireFailure> {
        // Cached video means the stream URL never needs resolving.
        if let Some(path) = self.store.cached(video.id(), ArtifactKind::Video) {
            return Ok(path);
        }

        let sources = self
            .platform
            .stream_sources(video, info.stream_id)
            .await
            .map_err(|error| self.fail(Stage::Download, error, None))?;
        let source = sources.first().ok_or_else(|| {
            self.fail(
                Stage::Download,
                SubfetchError::NoData("no downloadable streams listed".to_string()),
                None,
            )
        })?;
        debug!(
            "downloading {} stream (quality {}) for {}",
            source.format,
            source.quality,
            video.id()
        );

        download_stream(
            &self.platform,
            video,
            &source.url,
            &self.store,
            &self.config.download_policy(),
        )
        .await
        .map_err(|error| self.fail(Stage::Download, error, None))
    }

    fn load_cached(
        &self,
        video: &VideoRef,
        path: PathBuf,
    ) -> std::result::Result<Acquisition, AcquireFailure> {
        let content = self
            .store
            .read_subtitle(video.id())
            .map_err(|error| self.fail(Stage::Resolve, error, Some(path.clone())))?;
        let cues = parse_flat(&content);
        info!(
            "returning {} cached cues for {} from {}",
            cues.len(),
            video.id(),
            path.display()
        );
        Ok(Acquisition {
            track: SubtitleTrack::new(cues),
            source: AcquisitionSource::CachedSubtitle,
            subtitle_path: path,
            video_path: self.store.cached(video.id(), ArtifactKind::Video),
        })
    }

    async fn persist_track(&self, video: &VideoRef, track: &SubtitleTrack) -> Result<PathBuf> {
        let _guard = self.store.lock(video.id(), ArtifactKind::Subtitle).await;
        let content = FlatFormatter.format(&track.cues);
        self.store.write_subtitle(video.id(), &content)
    }

    fn fail(
        &self,
        stage: Stage,
        error: SubfetchError,
        artifact: Option<PathBuf>,
    ) -> AcquireFailure {
        warn!("{stage} failed for this request: {error}");
        AcquireFailure {
            stage,
            error,
            artifact,
        }
    }
}

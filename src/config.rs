use crate::error::{Result, SubfetchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `start -> end: text` line per cue; also the on-disk cache format.
    #[default]
    Flat,
    Srt,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Flat => write!(f, "flat"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" | "txt" => Ok(OutputFormat::Flat),
            "srt" => Ok(OutputFormat::Srt),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown format: {}. Use 'flat', 'srt', or 'json'",
                s
            )),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Flat => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Json => "json",
        }
    }
}

/// Retry knobs for the stream download stage.
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Bounds for the transcription poll loop. A job that is still not complete
/// at the deadline surfaces a timeout instead of stalling the pipeline.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform API base, e.g. `https://api.example.tv`.
    pub api_base: String,
    /// ASR service base URL.
    pub asr_base: String,
    pub asr_api_key: Option<String>,
    /// Platform session credential, sent as a Cookie header when present.
    pub credential: Option<String>,
    /// Root of the artifact cache (tmp/, video/, audio/, subtitle/).
    pub data_dir: PathBuf,
    /// Preferred subtitle locale, e.g. `zh-CN`.
    pub primary_locale: String,
    /// Acceptable locale variant tried after the primary one.
    pub secondary_locale: String,
    /// Referer header sent on stream downloads; the platform CDN rejects
    /// requests without it.
    pub referer: String,
    pub user_agent: String,
    /// Transcoder executable, resolved via PATH unless absolute.
    pub ffmpeg_program: String,
    pub default_format: OutputFormat,
    pub download_attempts: u32,
    pub download_backoff_secs: u64,
    pub poll_interval_secs: u64,
    pub poll_deadline_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            asr_base: String::new(),
            asr_api_key: None,
            credential: None,
            data_dir: default_data_dir(),
            primary_locale: "zh-CN".to_string(),
            secondary_locale: "zh-Hans".to_string(),
            referer: "https://www.bilibili.com".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/117.0"
                .to_string(),
            ffmpeg_program: "ffmpeg".to_string(),
            default_format: OutputFormat::default(),
            download_attempts: 3,
            download_backoff_secs: 2,
            poll_interval_secs: 1,
            poll_deadline_secs: 600,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subfetch")
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str(&contents)
                    .map_err(|e| SubfetchError::Config(format!("{}: {e}", config_path.display())))?;
            }
        }

        // Override with environment variables
        if let Ok(base) = std::env::var("SUBFETCH_API_BASE") {
            config.api_base = base;
        }
        if let Ok(base) = std::env::var("SUBFETCH_ASR_BASE") {
            config.asr_base = base;
        }
        if let Ok(key) = std::env::var("SUBFETCH_ASR_KEY") {
            config.asr_api_key = Some(key);
        }
        if let Ok(cred) = std::env::var("SUBFETCH_CREDENTIAL") {
            config.credential = Some(cred);
        }
        if let Ok(dir) = std::env::var("SUBFETCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(program) = std::env::var("SUBFETCH_FFMPEG") {
            config.ffmpeg_program = program;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base.is_empty() {
            return Err(SubfetchError::Config(
                "api_base not set. Set SUBFETCH_API_BASE or add it to config.toml".to_string(),
            ));
        }
        if self.asr_base.is_empty() {
            return Err(SubfetchError::Config(
                "asr_base not set. Set SUBFETCH_ASR_BASE or add it to config.toml".to_string(),
            ));
        }
        if self.download_attempts == 0 {
            return Err(SubfetchError::Config(
                "download_attempts must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(SubfetchError::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn download_policy(&self) -> DownloadPolicy {
        DownloadPolicy {
            max_attempts: self.download_attempts,
            backoff: Duration::from_secs(self.download_backoff_secs),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            deadline: Duration::from_secs(self.poll_deadline_secs),
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subfetch").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("flat".parse::<OutputFormat>().unwrap(), OutputFormat::Flat);
        assert_eq!("srt".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("ass".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(OutputFormat::Flat.extension(), "txt");
        assert_eq!(OutputFormat::Srt.extension(), "srt");
        assert_eq!(OutputFormat::Json.extension(), "json");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.primary_locale, "zh-CN");
        assert_eq!(config.secondary_locale, "zh-Hans");
        assert_eq!(config.download_attempts, 3);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.default_format, OutputFormat::Flat);
    }

    #[test]
    fn test_validate_missing_bases() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api_base = "http://localhost:1".to_string();
        assert!(config.validate().is_err());

        config.asr_base = "http://localhost:2".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.api_base = "http://localhost:1".to_string();
        config.asr_base = "http://localhost:2".to_string();
        config.download_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policies_from_config() {
        let mut config = Config::default();
        config.download_backoff_secs = 5;
        config.poll_deadline_secs = 30;

        let dl = config.download_policy();
        assert_eq!(dl.max_attempts, 3);
        assert_eq!(dl.backoff, Duration::from_secs(5));

        let poll = config.poll_policy();
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.deadline, Duration::from_secs(30));
    }
}

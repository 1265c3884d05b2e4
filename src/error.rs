use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubfetchError {
    #[error("Platform API error: {0}")]
    Api(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("No usable content: {0}")]
    NoData(String),

    #[error("Download failed after {attempts} attempts: {reason}")]
    Download { attempts: u32, reason: String },

    #[error("Audio extraction failed: {0}")]
    Extraction(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SubfetchError {
    /// "No usable content" is surfaced to users differently from a failed
    /// request, so callers need to tell the two apart.
    pub fn is_no_data(&self) -> bool {
        matches!(self, SubfetchError::NoData(_))
    }
}

pub type Result<T> = std::result::Result<T, SubfetchError>;

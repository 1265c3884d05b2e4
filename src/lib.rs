pub mod asr;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod platform;
pub mod resolve;
pub mod store;
pub mod subtitle;

pub use config::Config;
pub use error::{Result, SubfetchError};
pub use pipeline::{AcquireFailure, Acquisition, AcquisitionSource, Stage, SubtitleAcquirer};
pub use platform::VideoRef;

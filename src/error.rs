//! Error taxonomy for the submission workflow.

use std::path::PathBuf;
use thiserror::Error;

/// Shown to the user whenever a submission fails.
pub const FAILURE_NOTICE: &str = "Failed to colorize image. Please try again.";

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("no file was provided")]
    Empty,
    #[error("{} is not a regular file", path.display())]
    NotAFile { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("decode task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("service reported an error: {0}")]
    Service(String),
    #[error("service returned an empty payload")]
    EmptyPayload,
    #[error("submission task failed: {0}")]
    Task(String),
}

impl SubmissionError {
    /// Text for the blocking failure notice.
    pub fn notice(&self) -> String {
        format!("{FAILURE_NOTICE}\n\n{self}")
    }
}

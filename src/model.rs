use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Filename used when a colorized result is saved locally.
pub const DOWNLOAD_FILENAME: &str = "colorized_image.png";

/// Multipart field name the colorization service reads the upload from.
pub const UPLOAD_FIELD: &str = "file";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/colorize";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub endpoint: String,
    pub download_dir: PathBuf,
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

/// Monotonic tag handed out on every selection or reset.
///
/// Asynchronous work carries the generation it started with; its completion is
/// only allowed to touch workflow state while that generation is still current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    #[default]
    Empty,
    AwaitingResult,
    Ready,
}

impl WorkflowState {
    pub fn label(self) -> &'static str {
        match self {
            WorkflowState::Empty => "empty",
            WorkflowState::AwaitingResult => "awaiting result",
            WorkflowState::Ready => "ready",
        }
    }
}

/// Raw image bytes chosen by the user.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
    pub media_type: String,
    pub bytes: Bytes,
}

impl SourceFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Downsampled RGB raster small enough to paint into a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl Thumbnail {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or([0, 0, 0])
    }
}

/// Locally decoded form of a [`SourceFile`].
#[derive(Debug, Clone)]
pub struct PreviewArtifact {
    pub width: u32,
    pub height: u32,
    pub thumbnail: Thumbnail,
}

/// Colorized image returned by the service for the current source.
#[derive(Debug, Clone)]
pub struct ResultArtifact {
    pub bytes: Bytes,
    pub media_type: String,
    // None when the payload could not be decoded for display; it is still downloadable.
    pub thumbnail: Option<Thumbnail>,
}

/// Events emitted by the controller and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// The workflow record moved to a new state. Sent ahead of the event
    /// describing the transition.
    StateChanged(WorkflowState),
    Acquired {
        generation: Generation,
        name: String,
        media_type: String,
        size: usize,
    },
    PreviewReady {
        generation: Generation,
        // Boxed to keep the enum small; thumbnails carry whole rasters.
        preview: Box<PreviewArtifact>,
    },
    PreviewUnavailable {
        generation: Generation,
        reason: String,
    },
    ResultReady {
        generation: Generation,
        result: Box<ResultArtifact>,
    },
    SubmissionFailed {
        generation: Generation,
        notice: String,
    },
    Cleared,
    Downloaded {
        path: PathBuf,
        bytes: usize,
    },
    Info(InfoEvent),
}

/// Structured info events rendered as status-line messages.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Submitting { endpoint: String },
    AcquireFailed { reason: String },
    NothingToDownload,
    DownloadFailed { reason: String },
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Submitting { endpoint } => format!("Colorizing via {endpoint}"),
            InfoEvent::AcquireFailed { reason } => format!("Could not open file: {reason}"),
            InfoEvent::NothingToDownload => "No colorized result to download yet.".to_string(),
            InfoEvent::DownloadFailed { reason } => format!("Download failed: {reason}"),
        }
    }
}

/// Outcome of one headless acquire/submit/download cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp_utc: String,
    pub endpoint: String,
    pub source: Option<String>,
    pub media_type: Option<String>,
    pub source_bytes: Option<usize>,
    pub preview_width: Option<u32>,
    pub preview_height: Option<u32>,
    #[serde(default)]
    pub preview_error: Option<String>,
    pub result_bytes: Option<usize>,
    pub result_media_type: Option<String>,
    pub saved_path: Option<PathBuf>,
    pub state: WorkflowState,
    #[serde(default)]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.saved_path.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

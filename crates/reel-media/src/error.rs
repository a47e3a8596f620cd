//! Error types for media operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_media(message: impl Into<String>) -> Self {
        Self::InvalidMedia(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Which step of assembly failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyFailure {
    /// No images were supplied
    NoImages,
    /// Audio duration could not be determined
    Probe,
    /// An input file is missing or unreadable
    MissingInput,
    /// The encoder failed
    Render,
    /// The rendered file could not be moved into place
    Publish,
}

impl AssemblyFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyFailure::NoImages => "no_images",
            AssemblyFailure::Probe => "probe",
            AssemblyFailure::MissingInput => "missing_input",
            AssemblyFailure::Render => "render",
            AssemblyFailure::Publish => "publish",
        }
    }
}

impl fmt::Display for AssemblyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AssemblyFailure::NoImages => "no images to assemble",
            AssemblyFailure::Probe => "could not determine audio duration",
            AssemblyFailure::MissingInput => "input asset unavailable",
            AssemblyFailure::Render => "render failed",
            AssemblyFailure::Publish => "could not publish rendered video",
        };
        f.write_str(text)
    }
}

/// A failed assembly, carrying the step and the underlying cause.
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct AssemblyError {
    pub kind: AssemblyFailure,
    #[source]
    pub source: MediaError,
}

impl AssemblyError {
    pub fn new(kind: AssemblyFailure, source: MediaError) -> Self {
        Self { kind, source }
    }

    pub fn no_images() -> Self {
        Self::new(
            AssemblyFailure::NoImages,
            MediaError::invalid_input("at least one image is required"),
        )
    }

    pub fn probe(source: MediaError) -> Self {
        Self::new(AssemblyFailure::Probe, source)
    }

    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::new(AssemblyFailure::MissingInput, MediaError::FileNotFound(path.into()))
    }

    pub fn render(source: MediaError) -> Self {
        Self::new(AssemblyFailure::Render, source)
    }

    pub fn publish(source: MediaError) -> Self {
        Self::new(AssemblyFailure::Publish, source)
    }

    /// True when the audio could not be probed.
    pub fn is_probe(&self) -> bool {
        self.kind == AssemblyFailure::Probe
    }
}

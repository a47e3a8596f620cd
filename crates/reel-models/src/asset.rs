//! Generated media assets.

use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::JobId;

/// Kind of generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
    Video,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
            AssetKind::Video => "video",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file in the asset store, tagged with its owning job.
///
/// Assets are written once by the stage that produces them and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub path: PathBuf,
    pub job_id: JobId,
    pub kind: AssetKind,
    /// Scene index (0-based), images only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl MediaAsset {
    /// Scene image for `index`.
    pub fn image(path: impl Into<PathBuf>, job_id: JobId, index: usize) -> Self {
        Self {
            path: path.into(),
            job_id,
            kind: AssetKind::Image,
            index: Some(index),
        }
    }

    /// Narration track.
    pub fn audio(path: impl Into<PathBuf>, job_id: JobId) -> Self {
        Self {
            path: path.into(),
            job_id,
            kind: AssetKind::Audio,
            index: None,
        }
    }

    /// Final rendered video.
    pub fn video(path: impl Into<PathBuf>, job_id: JobId) -> Self {
        Self {
            path: path.into(),
            job_id,
            kind: AssetKind::Video,
            index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_tag_kind() {
        let job = JobId::from_string("j");
        let img = MediaAsset::image("j_image_2.png", job.clone(), 2);
        assert_eq!(img.kind, AssetKind::Image);
        assert_eq!(img.index, Some(2));

        let audio = MediaAsset::audio("j_audio.wav", job);
        assert_eq!(audio.kind, AssetKind::Audio);
        assert!(audio.index.is_none());
        assert_eq!(AssetKind::Video.to_string(), "video");
    }
}

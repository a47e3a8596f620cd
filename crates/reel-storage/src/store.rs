//! Asset store layout and discovery.
//!
//! Naming convention, all flat under the store root:
//! - `{job}_image_{index}.{ext}` scene images
//! - `{job}_audio.{ext}` narration
//! - `{job}_final.mp4` rendered video
//!
//! Scans tolerate extra suffixes after the index (`{job}_image_2_1712345.png`)
//! and skip in-progress files (`.tmp`, `.partial.`).

use std::path::{Path, PathBuf};

use reel_models::{AssetKind, JobId, MediaAsset};
use tokio::fs;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::fs_utils::write_atomic;

const IMAGE_MARKER: &str = "image";
const AUDIO_MARKER: &str = "audio";
const VIDEO_MARKER: &str = "final";
const PARTIAL_MARKER: &str = ".partial.";
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "aac"];

/// Flat directory of job assets.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

/// Assets discovered for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobAssets {
    /// Scene images ordered by scene index
    pub images: Vec<MediaAsset>,
    pub audio: Option<MediaAsset>,
    pub video: Option<MediaAsset>,
}

impl JobAssets {
    pub fn image_paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|a| a.path.clone()).collect()
    }
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store directory if missing.
    pub async fn ensure(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Check the store can accept writes.
    pub async fn check_writable(&self) -> StorageResult<()> {
        self.ensure().await?;
        let probe = self.root.join(".write-check");
        fs::write(&probe, b"ok").await?;
        fs::remove_file(&probe).await?;
        Ok(())
    }

    pub fn image_path(&self, job_id: &JobId, index: usize, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}_{}.{}", job_id, IMAGE_MARKER, index, extension))
    }

    pub fn audio_path(&self, job_id: &JobId, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}.{}", job_id, AUDIO_MARKER, extension))
    }

    pub fn video_path(&self, job_id: &JobId) -> PathBuf {
        self.root.join(format!("{}_{}.mp4", job_id, VIDEO_MARKER))
    }

    /// Render target that is published to [`Self::video_path`] on success.
    pub fn partial_video_path(&self, job_id: &JobId) -> PathBuf {
        self.root.join(format!("{}_{}.partial.mp4", job_id, VIDEO_MARKER))
    }

    /// Intermediate file owned by a job, e.g. raw PCM before encoding.
    pub fn scratch_path(&self, job_id: &JobId, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(StorageError::invalid_name(name));
        }
        Ok(self.root.join(format!("{}_scratch_{}", job_id, name)))
    }

    /// Write a scene image.
    pub async fn write_image(
        &self,
        job_id: &JobId,
        index: usize,
        extension: &str,
        bytes: &[u8],
    ) -> StorageResult<MediaAsset> {
        self.ensure().await?;
        let path = self.image_path(job_id, index, extension);
        write_atomic(&path, bytes).await?;
        debug!(job_id = %job_id, index, path = %path.display(), "Wrote image asset");
        Ok(MediaAsset::image(path, job_id.clone(), index))
    }

    /// Write the narration track.
    pub async fn write_audio(
        &self,
        job_id: &JobId,
        extension: &str,
        bytes: &[u8],
    ) -> StorageResult<MediaAsset> {
        self.ensure().await?;
        let path = self.audio_path(job_id, extension);
        write_atomic(&path, bytes).await?;
        debug!(job_id = %job_id, path = %path.display(), "Wrote audio asset");
        Ok(MediaAsset::audio(path, job_id.clone()))
    }

    /// Find every asset belonging to `job_id`.
    pub async fn scan_job(&self, job_id: &JobId) -> StorageResult<JobAssets> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(&self.root))
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        // Directory order is unspecified
        names.sort();

        let mut assets = JobAssets::default();
        for name in names {
            let Some((kind, index)) = classify(&name, job_id) else {
                continue;
            };
            let path = self.root.join(&name);
            match (kind, index) {
                (AssetKind::Image, Some(index)) => {
                    assets.images.push(MediaAsset::image(path, job_id.clone(), index))
                }
                (AssetKind::Audio, _) if assets.audio.is_none() => {
                    assets.audio = Some(MediaAsset::audio(path, job_id.clone()))
                }
                (AssetKind::Video, _) => {
                    assets.video = Some(MediaAsset::video(path, job_id.clone()))
                }
                _ => debug!(file = %name, "Skipping duplicate asset"),
            }
        }
        assets.images.sort_by_key(|a| a.index);
        assets.images.dedup_by_key(|a| a.index);

        Ok(assets)
    }
}

/// Classify a file name in the store as an asset of `job_id`.
///
/// Returns the kind and, for images, the scene index. Files of other jobs
/// and in-progress files yield `None`. Ids may contain `_`, so everything
/// after `{job_id}_` must match one of the asset shapes exactly; otherwise
/// `job` would claim `job_b_audio.mp3`.
pub fn classify(file_name: &str, job_id: &JobId) -> Option<(AssetKind, Option<usize>)> {
    let rest = file_name.strip_prefix(job_id.as_str())?.strip_prefix('_')?;
    if file_name.ends_with(".tmp") || file_name.contains(PARTIAL_MARKER) {
        return None;
    }

    let (stem, extension) = rest.split_once('.')?;
    let segments: Vec<&str> = stem.split('_').collect();
    match segments.as_slice() {
        // Optional numeric suffix after the index, e.g. a timestamp
        [IMAGE_MARKER, index, suffix @ ..]
            if is_digits(index) && suffix.len() <= 1 && suffix.iter().all(|s| is_digits(s)) =>
        {
            index.parse().ok().map(|index| (AssetKind::Image, Some(index)))
        }
        [AUDIO_MARKER] => Some((AssetKind::Audio, None)),
        [AUDIO_MARKER, suffix] if is_digits(suffix) => Some((AssetKind::Audio, None)),
        [VIDEO_MARKER] => Some((AssetKind::Video, None)),
        // Bare `{job}_{name}.{audio ext}`
        [_] if AUDIO_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) => {
            Some((AssetKind::Audio, None))
        }
        _ => None,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

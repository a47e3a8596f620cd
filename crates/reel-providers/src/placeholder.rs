//! Offline providers used when no credentials are configured.

use std::path::PathBuf;

use async_trait::async_trait;
use reel_media::synth::{placeholder_color, render_color_card, render_silence};
use reel_media::FfmpegRunner;
use reel_models::{JobId, ScriptDraft};
use reel_storage::AssetStore;
use tracing::debug;

use crate::error::ProviderResult;
use crate::traits::{AudioGenerator, ImageGenerator, ScriptGenerator};

const PLACEHOLDER_NARRATION: &str = "Welcome to our video about making the perfect cup of coffee. \
First, we start with fresh coffee beans. Next, we grind them to the perfect consistency. \
Finally, we brew and enjoy our delicious coffee.";

const PLACEHOLDER_SCENES: &[&str] = &[
    "A close-up of fresh coffee beans",
    "A burr grinder producing fine coffee grounds",
    "A steaming cup of freshly brewed coffee",
];

/// Returns the same fixed script for every query.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderScriptWriter;

#[async_trait]
impl ScriptGenerator for PlaceholderScriptWriter {
    async fn generate(&self, query: &str) -> ProviderResult<ScriptDraft> {
        debug!(query, "Using placeholder script");
        Ok(ScriptDraft::new(
            PLACEHOLDER_NARRATION,
            PLACEHOLDER_SCENES.iter().map(|s| s.to_string()).collect(),
        ))
    }
}

/// Solid colour cards, one palette colour per scene.
#[derive(Debug, Clone)]
pub struct PlaceholderImageGenerator {
    store: AssetStore,
    runner: FfmpegRunner,
}

impl PlaceholderImageGenerator {
    pub fn new(store: AssetStore) -> Self {
        Self {
            store,
            runner: FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderImageGenerator {
    async fn generate(&self, _prompt: &str, job_id: &JobId, scene_index: usize) -> ProviderResult<PathBuf> {
        self.store.ensure().await?;
        let path = self.store.image_path(job_id, scene_index, "png");
        render_color_card(&self.runner, placeholder_color(scene_index), &path).await?;
        debug!(job_id = %job_id, scene_index, "Rendered placeholder image");
        Ok(path)
    }
}

/// Ten seconds of silence.
#[derive(Debug, Clone)]
pub struct SilentAudioGenerator {
    store: AssetStore,
    runner: FfmpegRunner,
}

impl SilentAudioGenerator {
    pub fn new(store: AssetStore) -> Self {
        Self {
            store,
            runner: FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl AudioGenerator for SilentAudioGenerator {
    async fn generate(&self, _narration: &str, job_id: &JobId) -> ProviderResult<PathBuf> {
        self.store.ensure().await?;
        let path = self.store.audio_path(job_id, "mp3");
        render_silence(&self.runner, &path).await?;
        debug!(job_id = %job_id, "Rendered silent narration");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_script_is_valid() {
        let script = PlaceholderScriptWriter
            .generate("anything")
            .await
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(script.scene_count(), 3);
        assert!(script.narration().contains("coffee"));
    }
}

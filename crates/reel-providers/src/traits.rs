//! Collaborator contracts used by the pipeline.
//!
//! Implementations make a single attempt per call; retry policy, if any,
//! belongs to the caller.

use std::path::PathBuf;

use async_trait::async_trait;
use reel_models::{JobId, ScriptDraft};

use crate::error::ProviderResult;

/// Writes a narration script with scene prompts for a query.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, query: &str) -> ProviderResult<ScriptDraft>;
}

/// Produces the image for one scene and returns its asset path.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, job_id: &JobId, scene_index: usize) -> ProviderResult<PathBuf>;
}

/// Synthesizes narration audio and returns its asset path.
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    async fn generate(&self, narration: &str, job_id: &JobId) -> ProviderResult<PathBuf>;
}

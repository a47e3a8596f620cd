//! Pipeline error types.

use std::fmt;

use reel_media::AssemblyError;
use reel_models::{JobId, ScriptError};
use reel_providers::ProviderError;
use thiserror::Error;

use crate::jobs::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Sequential pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Script,
    Images,
    Audio,
    Assembly,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Images => "images",
            Stage::Audio => "audio",
            Stage::Assembly => "assembly",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Stage::Script => "script generation",
            Stage::Images => "image generation",
            Stage::Audio => "audio generation",
            Stage::Assembly => "video assembly",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ScriptError),

    #[error("{stage} failed: {source}")]
    Provider {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("{0}")]
    Probe(#[source] AssemblyError),

    #[error("video assembly failed: {0}")]
    Assembly(#[source] AssemblyError),

    #[error("missing assets for job {job_id}: {what}")]
    MissingAssets { job_id: JobId, what: String },

    #[error("job store error: {0}")]
    Store(#[from] StoreError),

    #[error("storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AssemblyError> for PipelineError {
    fn from(err: AssemblyError) -> Self {
        if err.is_probe() {
            Self::Probe(err)
        } else {
            Self::Assembly(err)
        }
    }
}

impl PipelineError {
    pub fn provider(stage: Stage, source: ProviderError) -> Self {
        Self::Provider { stage, source }
    }

    pub fn missing_assets(job_id: &JobId, what: impl Into<String>) -> Self {
        Self::MissingAssets {
            job_id: job_id.clone(),
            what: what.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stage the error belongs to, where one applies.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Validation(_) => Some(Stage::Script),
            PipelineError::Provider { stage, .. } => Some(*stage),
            PipelineError::Probe(_) | PipelineError::Assembly(_) => Some(Stage::Assembly),
            _ => None,
        }
    }

    /// Error category used for metrics and logs.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Provider { .. } => "provider",
            PipelineError::Probe(_) => "probe",
            PipelineError::Assembly(_) => "assembly",
            PipelineError::MissingAssets { .. } => "missing_assets",
            PipelineError::Store(_) | PipelineError::Storage(_) | PipelineError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_media::MediaError;

    #[test]
    fn test_probe_failures_are_classified() {
        let err: PipelineError = AssemblyError::probe(MediaError::invalid_media("no audio stream found")).into();
        assert_eq!(err.category(), "probe");
        assert_eq!(err.stage(), Some(Stage::Assembly));

        let err: PipelineError = AssemblyError::render(MediaError::internal("x")).into();
        assert_eq!(err.category(), "assembly");
        assert!(err.to_string().starts_with("video assembly failed"));
    }

    #[test]
    fn test_provider_message_names_stage() {
        let err = PipelineError::provider(
            Stage::Images,
            ProviderError::empty_response("gemini", "image"),
        );
        assert_eq!(err.to_string(), "image generation failed: gemini returned no image");
        assert_eq!(err.stage(), Some(Stage::Images));
    }

    #[test]
    fn test_validation_is_transparent() {
        let err = PipelineError::from(ScriptError::NoScenes);
        assert_eq!(err.to_string(), "malformed script: no scene prompts");
        assert_eq!(err.category(), "validation");
    }
}

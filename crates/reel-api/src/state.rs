//! Application state.

use std::sync::Arc;

use reel_media::SlideshowAssembler;
use reel_providers::{build_providers, ProviderConfig};
use reel_storage::AssetStore;
use reel_worker::{JobManager, PipelineConfig, PipelineOrchestrator};
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: PipelineOrchestrator,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: PipelineOrchestrator) -> Self {
        Self { config, orchestrator }
    }

    /// Wire the production pipeline: local asset store, configured
    /// providers and the FFmpeg slideshow assembler.
    pub fn build(config: ApiConfig, pipeline: &PipelineConfig, providers: &ProviderConfig) -> Self {
        let store = AssetStore::new(pipeline.asset_dir.clone());
        info!(asset_dir = %store.root().display(), "Using local asset store");

        let assembler = SlideshowAssembler::with_ffmpeg(store.clone(), pipeline.render.clone());
        let orchestrator = PipelineOrchestrator::new(
            JobManager::default(),
            build_providers(providers, store.clone()),
            Arc::new(assembler),
            store,
        );
        Self::new(config, orchestrator)
    }

    pub fn jobs(&self) -> &JobManager {
        self.orchestrator.jobs()
    }

    pub fn store(&self) -> &AssetStore {
        self.orchestrator.store()
    }
}

//! Query-to-video pipeline.
//!
//! A submitted job runs in its own background task through four strictly
//! sequential stages:
//!
//! 1. script generation (validated here, not by the provider)
//! 2. image generation, one concurrent call per scene
//! 3. narration
//! 4. assembly
//!
//! Any error ends the job as `Failed`. A supervisor task watches the worker
//! so that a panic is recorded as a failure instead of leaving the job stuck
//! in `Processing`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use reel_media::VideoAssembler;
use reel_models::{JobId, Script};
use reel_providers::{AudioGenerator, ImageGenerator, ProviderError, Providers, ScriptGenerator};
use reel_storage::{AssetStore, StorageError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::jobs::JobManager;
use crate::logging::JobLogger;
use crate::metrics;

const OPERATION: &str = "generate_video";

/// Progress once the script is validated.
pub const SCRIPT_PROGRESS: u8 = 20;
/// Progress once every scene image exists.
pub const IMAGES_PROGRESS: u8 = 50;
/// Progress once narration exists.
pub const AUDIO_PROGRESS: u8 = 70;

pub const PANIC_MESSAGE: &str = "internal error: pipeline task panicked";
const CANCELLED_MESSAGE: &str = "internal error: pipeline task cancelled";

/// Handle to a job that has been accepted.
#[derive(Debug)]
pub struct SubmittedJob {
    pub job_id: JobId,
    /// Resolves once the job has reached a terminal state.
    pub handle: JoinHandle<()>,
}

/// Drives jobs through the pipeline.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    jobs: JobManager,
    script: Arc<dyn ScriptGenerator>,
    images: Arc<dyn ImageGenerator>,
    audio: Arc<dyn AudioGenerator>,
    assembler: Arc<dyn VideoAssembler>,
    store: AssetStore,
}

impl PipelineOrchestrator {
    pub fn new(
        jobs: JobManager,
        providers: Providers,
        assembler: Arc<dyn VideoAssembler>,
        store: AssetStore,
    ) -> Self {
        Self {
            jobs,
            script: providers.script,
            images: providers.image,
            audio: providers.audio,
            assembler,
            store,
        }
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Create a job and start it in the background.
    ///
    /// Returns as soon as the job record exists; no stage has run yet.
    pub async fn submit(&self, query: impl Into<String>) -> PipelineResult<SubmittedJob> {
        let query = query.into();
        let job_id = self.jobs.create().await?;
        metrics::record_job_submitted();

        let span = JobLogger::new(&job_id, OPERATION).create_span();
        let worker = {
            let this = self.clone();
            let job_id = job_id.clone();
            tokio::spawn(async move { this.run(&job_id, &query).await }.instrument(span.clone()))
        };

        let jobs = self.jobs.clone();
        let supervised_id = job_id.clone();
        let handle = tokio::spawn(
            async move {
                let Err(e) = worker.await else {
                    return;
                };
                let message = if e.is_panic() {
                    PANIC_MESSAGE
                } else {
                    CANCELLED_MESSAGE
                };
                error!(job_id = %supervised_id, "Pipeline task aborted: {}", e);
                metrics::record_job_failed("none", "internal");
                jobs.fail(&supervised_id, message).await;
            }
            .instrument(span),
        );

        info!(job_id = %job_id, "Job submitted");
        Ok(SubmittedJob { job_id, handle })
    }

    /// Generate and validate a script without creating a job.
    pub async fn generate_script(&self, query: &str) -> PipelineResult<Script> {
        let draft = self
            .script
            .generate(query)
            .await
            .map_err(|e| PipelineError::provider(Stage::Script, e))?;
        Ok(draft.validate()?)
    }

    /// Run one job to a terminal state.
    async fn run(&self, job_id: &JobId, query: &str) {
        let logger = JobLogger::new(job_id, OPERATION);
        logger.log_start(query);
        let started = Instant::now();

        match self.execute(job_id, query, &logger).await {
            Ok(path) => {
                let display = path.display().to_string();
                if self.jobs.complete(job_id, path).await {
                    metrics::record_job_completed(started.elapsed().as_secs_f64());
                    logger.log_completion(&display);
                } else {
                    logger.log_warning(&format!("result {} was not recorded", display));
                }
            }
            Err(e) => {
                let stage = e.stage().map(|s| s.as_str()).unwrap_or("none");
                logger.log_error(&e.to_string());
                metrics::record_job_failed(stage, e.category());
                if !self.jobs.fail(job_id, e.to_string()).await {
                    logger.log_warning("failure was not recorded");
                }
            }
        }
    }

    async fn execute(&self, job_id: &JobId, query: &str, logger: &JobLogger) -> PipelineResult<PathBuf> {
        let stage_start = Instant::now();
        let script = self.generate_script(query).await?;
        finish_stage(logger, Stage::Script, stage_start);
        logger.log_progress(&format!("script ready with {} scenes", script.scene_count()));
        self.jobs.set_progress(job_id, SCRIPT_PROGRESS).await;

        let stage_start = Instant::now();
        let images = self.generate_images(&script, job_id).await?;
        finish_stage(logger, Stage::Images, stage_start);
        self.jobs.set_progress(job_id, IMAGES_PROGRESS).await;

        let stage_start = Instant::now();
        let audio = self
            .audio
            .generate(script.narration(), job_id)
            .await
            .map_err(|e| PipelineError::provider(Stage::Audio, e))?;
        finish_stage(logger, Stage::Audio, stage_start);
        self.jobs.set_progress(job_id, AUDIO_PROGRESS).await;

        let stage_start = Instant::now();
        let video = self.assembler.assemble(&images, &audio, job_id).await?;
        finish_stage(logger, Stage::Assembly, stage_start);

        Ok(video)
    }

    /// One image per scene, all requested at once.
    ///
    /// Every call is allowed to finish. The first failure to arrive is the
    /// one reported; the returned paths are in scene order whatever order
    /// the calls completed in.
    async fn generate_images(&self, script: &Script, job_id: &JobId) -> PipelineResult<Vec<PathBuf>> {
        let prompts = script.scene_prompts();

        let mut pending: FuturesUnordered<_> = prompts
            .iter()
            .enumerate()
            .map(|(index, prompt)| async move {
                (index, self.images.generate(prompt, job_id, index).await)
            })
            .collect();

        let mut slots: Vec<Option<PathBuf>> = vec![None; prompts.len()];
        let mut first_error: Option<(usize, ProviderError)> = None;

        while let Some((index, result)) = pending.next().await {
            match result {
                Ok(path) => {
                    debug!(job_id = %job_id, scene_index = index, path = %path.display(), "Scene image ready");
                    slots[index] = Some(path);
                }
                Err(e) if first_error.is_none() => {
                    warn!(job_id = %job_id, scene_index = index, error = %e, "Scene image failed");
                    first_error = Some((index, e));
                }
                Err(e) => {
                    debug!(job_id = %job_id, scene_index = index, error = %e, "Discarding later image failure");
                }
            }
        }

        if let Some((_, e)) = first_error {
            return Err(PipelineError::provider(Stage::Images, e));
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| PipelineError::internal(format!("scene {} produced no image", index)))
            })
            .collect()
    }

    /// Rebuild a job's video from whatever assets are on disk.
    ///
    /// Does not consult or update the job table.
    pub async fn reassemble_from_assets(&self, job_id: &JobId) -> PipelineResult<PathBuf> {
        let assets = match self.store.scan_job(job_id).await {
            Ok(assets) => assets,
            Err(StorageError::NotFound(_)) => {
                return Err(PipelineError::missing_assets(job_id, "asset directory does not exist"))
            }
            Err(e) => return Err(e.into()),
        };

        if assets.images.is_empty() {
            return Err(PipelineError::missing_assets(job_id, "no scene images"));
        }
        let audio = assets
            .audio
            .as_ref()
            .map(|a| a.path.clone())
            .ok_or_else(|| PipelineError::missing_assets(job_id, "no narration audio"))?;

        let images = assets.image_paths();
        info!(
            job_id = %job_id,
            images = images.len(),
            audio = %audio.display(),
            "Reassembling video from stored assets"
        );

        let started = Instant::now();
        let path = self.assembler.assemble(&images, &audio, job_id).await?;
        metrics::record_stage_duration(Stage::Assembly.as_str(), started.elapsed().as_secs_f64());
        Ok(path)
    }
}

fn finish_stage(logger: &JobLogger, stage: Stage, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    metrics::record_stage_duration(stage.as_str(), elapsed);
    logger.log_stage(stage, elapsed);
}

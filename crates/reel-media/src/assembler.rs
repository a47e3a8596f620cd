//! Slideshow video assembly.
//!
//! Turns ordered scene images plus one narration track into a single
//! portrait video where every image is shown for `audio_duration / N`.
//! Rendering goes through a [`RenderEngine`] so the process boundary can be
//! replaced (tests use an in-memory engine).

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use reel_models::{JobId, RenderProfile};
use reel_storage::fs_utils::{discard_file, publish_file};
use reel_storage::AssetStore;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{AssemblyError, MediaError, MediaResult};
use crate::filters::{build_slideshow_graph, FilterGraph, FrameGeometry};
use crate::probe::probe_duration;

/// Builds the final video for a job.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    /// Render `images` (in scene order) over `audio` and return the
    /// published video path.
    async fn assemble(
        &self,
        images: &[PathBuf],
        audio: &Path,
        job_id: &JobId,
    ) -> Result<PathBuf, AssemblyError>;
}

/// Process boundary used by [`SlideshowAssembler`].
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Duration of an audio file in seconds.
    async fn probe_duration(&self, audio: &Path) -> MediaResult<f64>;

    /// Execute a render. `expected_secs` is the output length, used for
    /// progress reporting.
    async fn render(&self, command: &FfmpegCommand, expected_secs: f64) -> MediaResult<()>;
}

/// FFmpeg/FFprobe binaries on PATH.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RenderEngine for FfmpegEngine {
    async fn probe_duration(&self, audio: &Path) -> MediaResult<f64> {
        probe_duration(audio).await
    }

    async fn render(&self, command: &FfmpegCommand, expected_secs: f64) -> MediaResult<()> {
        let output = command.output().display().to_string();
        self.runner
            .run_with_progress(command, move |progress| {
                debug!(
                    output = %output,
                    percent = progress.percentage(expected_secs),
                    speed = progress.speed,
                    "Render progress"
                );
            })
            .await
    }
}

/// A fully computed render.
#[derive(Debug, Clone)]
pub struct SlideshowPlan {
    pub audio_duration: f64,
    pub per_image_duration: f64,
    pub graph: FilterGraph,
    pub command: FfmpegCommand,
}

/// Compute timing, filter graph and FFmpeg command for a slideshow.
///
/// Inputs `0..N` are the images, input `N` is the audio.
pub fn plan_slideshow(
    images: &[PathBuf],
    audio: &Path,
    audio_duration: f64,
    profile: &RenderProfile,
    output: &Path,
) -> MediaResult<SlideshowPlan> {
    if !(audio_duration.is_finite() && audio_duration > 0.0) {
        return Err(MediaError::invalid_input(format!(
            "audio duration must be positive, got {}",
            audio_duration
        )));
    }

    let graph = build_slideshow_graph(images.len(), FrameGeometry::from(profile))?;
    let per_image_duration = audio_duration / images.len() as f64;

    let mut command = FfmpegCommand::new(output);
    for image in images {
        command = command.input(
            FfmpegInput::file(image)
                .loop_image()
                .duration(per_image_duration)
                .frame_rate(profile.fps),
        );
    }
    let command = command
        .input(FfmpegInput::file(audio))
        .filter_complex(graph.to_filter_complex())
        .map(graph.output_spec())
        .map(format!("{}:a", images.len()))
        .output_args(profile.to_ffmpeg_args())
        .shortest();

    Ok(SlideshowPlan {
        audio_duration,
        per_image_duration,
        graph,
        command,
    })
}

/// [`VideoAssembler`] that renders into the asset store.
///
/// Output goes to a partial file first and is published under
/// [`AssetStore::video_path`] only after the engine succeeds.
pub struct SlideshowAssembler<E = FfmpegEngine> {
    engine: E,
    store: AssetStore,
    profile: RenderProfile,
}

impl SlideshowAssembler<FfmpegEngine> {
    pub fn with_ffmpeg(store: AssetStore, profile: RenderProfile) -> Self {
        Self::new(FfmpegEngine::new(), store, profile)
    }
}

impl<E: RenderEngine> SlideshowAssembler<E> {
    pub fn new(engine: E, store: AssetStore, profile: RenderProfile) -> Self {
        Self {
            engine,
            store,
            profile,
        }
    }

    pub fn profile(&self) -> &RenderProfile {
        &self.profile
    }
}

#[async_trait]
impl<E: RenderEngine> VideoAssembler for SlideshowAssembler<E> {
    async fn assemble(
        &self,
        images: &[PathBuf],
        audio: &Path,
        job_id: &JobId,
    ) -> Result<PathBuf, AssemblyError> {
        if images.is_empty() {
            return Err(AssemblyError::no_images());
        }

        let audio_duration = self
            .engine
            .probe_duration(audio)
            .await
            .map_err(AssemblyError::probe)?;

        for image in images {
            let readable = tokio::fs::metadata(image)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !readable {
                return Err(AssemblyError::missing_input(image));
            }
        }

        self.store
            .ensure()
            .await
            .map_err(|e| AssemblyError::render(e.into()))?;
        let partial = self.store.partial_video_path(job_id);
        let output = self.store.video_path(job_id);
        discard_file(&partial).await;

        let plan = plan_slideshow(images, audio, audio_duration, &self.profile, &partial)
            .map_err(AssemblyError::render)?;
        info!(
            job_id = %job_id,
            images = images.len(),
            audio_secs = plan.audio_duration,
            per_image_secs = plan.per_image_duration,
            "Assembling video"
        );

        let start = Instant::now();
        if let Err(e) = self.engine.render(&plan.command, audio_duration).await {
            warn!(job_id = %job_id, error = %e, "Render failed, discarding partial output");
            discard_file(&partial).await;
            return Err(AssemblyError::render(e));
        }
        histogram!("reel_render_duration_seconds").record(start.elapsed().as_secs_f64());

        if let Err(e) = publish_file(&partial, &output).await {
            discard_file(&partial).await;
            return Err(AssemblyError::publish(e.into()));
        }

        info!(job_id = %job_id, path = %output.display(), "Video assembled");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssemblyFailure;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Engine that records commands and writes a stub output file.
    struct FakeEngine {
        duration: MediaResult<f64>,
        fail_render: bool,
        commands: Mutex<Vec<FfmpegCommand>>,
    }

    impl FakeEngine {
        fn with_duration(duration: f64) -> Self {
            Self {
                duration: Ok(duration),
                fail_render: false,
                commands: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RenderEngine for FakeEngine {
        async fn probe_duration(&self, _audio: &Path) -> MediaResult<f64> {
            match &self.duration {
                Ok(d) => Ok(*d),
                Err(_) => Err(MediaError::invalid_media("no audio stream found")),
            }
        }

        async fn render(&self, command: &FfmpegCommand, _expected_secs: f64) -> MediaResult<()> {
            self.commands.lock().unwrap().push(command.clone());
            tokio::fs::write(command.output(), b"partial").await?;
            if self.fail_render {
                return Err(MediaError::ffmpeg_failed("encoder error", None, Some(1)));
            }
            Ok(())
        }
    }

    async fn write_images(dir: &Path, count: usize) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for i in 0..count {
            let path = dir.join(format!("img_{}.png", i));
            tokio::fs::write(&path, b"png").await.unwrap();
            paths.push(path);
        }
        paths
    }

    #[test]
    fn test_plan_divides_audio_evenly() {
        let images: Vec<PathBuf> = (0..3).map(|i| PathBuf::from(format!("{}.png", i))).collect();
        let plan = plan_slideshow(
            &images,
            Path::new("voice.wav"),
            12.0,
            &RenderProfile::default(),
            Path::new("out.mp4"),
        )
        .unwrap();

        assert!((plan.per_image_duration - 4.0).abs() < 1e-9);
        assert!((plan.per_image_duration * 3.0 - 12.0).abs() < 1e-9);
        assert_eq!(plan.graph.stages.len(), 3);

        let args = plan.command.build_args();
        let t_values: Vec<_> = args
            .windows(2)
            .filter(|w| w[0] == "-t")
            .map(|w| w[1].clone())
            .collect();
        assert_eq!(t_values, vec!["4", "4", "4"]);
        assert!(args.windows(2).any(|w| w == ["-map", "3:a"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_plan_single_image() {
        let plan = plan_slideshow(
            &[PathBuf::from("only.png")],
            Path::new("voice.wav"),
            5.0,
            &RenderProfile::default(),
            Path::new("out.mp4"),
        )
        .unwrap();
        assert!((plan.per_image_duration - 5.0).abs() < 1e-9);
        assert!(plan.command.build_args().windows(2).any(|w| w == ["-map", "1:a"]));
    }

    #[test]
    fn test_plan_rejects_non_positive_duration() {
        let result = plan_slideshow(
            &[PathBuf::from("a.png")],
            Path::new("voice.wav"),
            0.0,
            &RenderProfile::default(),
            Path::new("out.mp4"),
        );
        assert!(matches!(result, Err(MediaError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_assemble_publishes_final_video() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path().join("uploads"));
        let images = write_images(dir.path(), 3).await;
        let job = JobId::from_string("job-1");
        let assembler =
            SlideshowAssembler::new(FakeEngine::with_duration(12.0), store.clone(), RenderProfile::default());

        let output = assembler
            .assemble(&images, &dir.path().join("voice.wav"), &job)
            .await
            .unwrap();

        assert_eq!(output, store.video_path(&job));
        assert!(output.exists());
        assert!(!store.partial_video_path(&job).exists());
        let commands = assembler.engine.commands.lock().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].inputs().len(), 4);
        assert_eq!(commands[0].inputs()[0].source(), images[0].to_string_lossy());
    }

    #[tokio::test]
    async fn test_assemble_rejects_empty_before_probing() {
        let dir = TempDir::new().unwrap();
        let engine = FakeEngine {
            duration: Err(MediaError::internal("must not probe")),
            fail_render: false,
            commands: Mutex::new(Vec::new()),
        };
        let assembler = SlideshowAssembler::new(engine, AssetStore::new(dir.path()), RenderProfile::default());

        let err = assembler
            .assemble(&[], Path::new("voice.wav"), &JobId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, AssemblyFailure::NoImages);
    }

    #[tokio::test]
    async fn test_assemble_probe_failure() {
        let dir = TempDir::new().unwrap();
        let images = write_images(dir.path(), 1).await;
        let engine = FakeEngine {
            duration: Err(MediaError::internal("undecodable")),
            fail_render: false,
            commands: Mutex::new(Vec::new()),
        };
        let assembler = SlideshowAssembler::new(engine, AssetStore::new(dir.path()), RenderProfile::default());

        let err = assembler
            .assemble(&images, Path::new("voice.wav"), &JobId::new())
            .await
            .unwrap_err();
        assert!(err.is_probe());
        assert!(assembler.engine.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assemble_missing_image() {
        let dir = TempDir::new().unwrap();
        let assembler = SlideshowAssembler::new(
            FakeEngine::with_duration(5.0),
            AssetStore::new(dir.path()),
            RenderProfile::default(),
        );

        let err = assembler
            .assemble(&[dir.path().join("gone.png")], Path::new("voice.wav"), &JobId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, AssemblyFailure::MissingInput);
    }

    #[tokio::test]
    async fn test_failed_render_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());
        let images = write_images(dir.path(), 2).await;
        let job = JobId::from_string("job-2");
        let engine = FakeEngine {
            fail_render: true,
            ..FakeEngine::with_duration(8.0)
        };
        let assembler = SlideshowAssembler::new(engine, store.clone(), RenderProfile::default());

        let err = assembler
            .assemble(&images, Path::new("voice.wav"), &job)
            .await
            .unwrap_err();

        assert_eq!(err.kind, AssemblyFailure::Render);
        assert!(!store.video_path(&job).exists());
        assert!(!store.partial_video_path(&job).exists());
    }
}

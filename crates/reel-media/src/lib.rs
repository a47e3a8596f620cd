//! FFmpeg CLI wrapper and slideshow video assembly.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building for multi-input renders
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe duration probing
//! - The slideshow filter graph and the [`VideoAssembler`] built on it
//! - Synthetic media (colour cards, silence, PCM to WAV)

pub mod assembler;
pub mod command;
pub mod error;
pub mod filters;
pub mod probe;
pub mod progress;
pub mod synth;

pub use assembler::{
    plan_slideshow, FfmpegEngine, RenderEngine, SlideshowAssembler, SlideshowPlan, VideoAssembler,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use error::{AssemblyError, AssemblyFailure, MediaError, MediaResult};
pub use filters::{build_slideshow_graph, FilterGraph, FrameGeometry};
pub use probe::probe_duration;
pub use progress::FfmpegProgress;

//! Job management and the query-to-video pipeline.
//!
//! This crate provides:
//! - [`JobManager`], the single writer of job records, over a [`JobStore`]
//! - [`PipelineOrchestrator`], which drives a job through script, parallel
//!   image generation, narration and assembly in a supervised background task
//! - Structured job logging and pipeline metrics

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod orchestrator;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, Stage};
pub use jobs::{InMemoryJobStore, JobManager, JobStore, StoreError, StoreResult};
pub use logging::JobLogger;
pub use orchestrator::{PipelineOrchestrator, SubmittedJob};

//! Shared data models for the reel video pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, their status and lifecycle transitions
//! - Scripts produced by the script writer
//! - Media assets written to the asset store
//! - The render profile used for final encoding

pub mod asset;
pub mod encoding;
pub mod job;
pub mod script;

// Re-export common types
pub use asset::{AssetKind, MediaAsset};
pub use encoding::{RenderProfile, DISPLAY_ASPECT};
pub use job::{Job, JobId, JobMutation, JobStatus, TransitionError};
pub use script::{Script, ScriptDraft, ScriptError};

//! Local asset store for generated media.
//!
//! Every artifact a job produces (scene images, narration audio, the final
//! video) lives flat in one directory, named after the job id and asset kind
//! so a directory scan can reconstruct a job's assets.

pub mod error;
pub mod fs_utils;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{classify, AssetStore, JobAssets};

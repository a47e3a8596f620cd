//! Job lifecycle management.

use std::path::PathBuf;
use std::sync::Arc;

use reel_models::{Job, JobId, JobMutation};
use tracing::{debug, warn};

use super::store::{InMemoryJobStore, JobStore, StoreError, StoreResult};

/// Single writer of job state.
///
/// Updates aimed at a job that is missing or already terminal are logged
/// and dropped; callers never see them as errors.
#[derive(Clone)]
pub struct JobManager {
    store: Arc<dyn JobStore>,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryJobStore::new()))
    }
}

impl JobManager {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Register a new processing job at 0% and return its id.
    pub async fn create(&self) -> StoreResult<JobId> {
        let id = JobId::new();
        self.store.insert(Job::new(id.clone())).await?;
        debug!(job_id = %id, "Job created");
        Ok(id)
    }

    /// Snapshot of a job, if known.
    pub async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        self.store.get(id).await
    }

    /// Report progress. Status is unchanged.
    pub async fn set_progress(&self, id: &JobId, progress: u8) -> bool {
        self.apply(id, JobMutation::Progress(progress)).await
    }

    /// Processing -> Completed with the rendered file.
    pub async fn complete(&self, id: &JobId, file_path: PathBuf) -> bool {
        self.apply(id, JobMutation::Complete(file_path)).await
    }

    /// Processing -> Failed with a human-readable reason.
    pub async fn fail(&self, id: &JobId, message: impl Into<String>) -> bool {
        self.apply(id, JobMutation::Fail(message.into())).await
    }

    /// Returns whether the mutation took effect.
    async fn apply(&self, id: &JobId, mutation: JobMutation) -> bool {
        let name = mutation.name();
        match self.store.update(id, mutation).await {
            Ok(job) => {
                debug!(
                    job_id = %id,
                    mutation = name,
                    status = %job.status,
                    progress = job.progress,
                    "Job updated"
                );
                true
            }
            Err(StoreError::NotFound(_)) => {
                debug!(job_id = %id, mutation = name, "Ignoring update for unknown job");
                false
            }
            Err(StoreError::Rejected(e)) => {
                warn!(job_id = %id, "Ignoring update: {}", e);
                false
            }
            Err(e) => {
                warn!(job_id = %id, mutation = name, error = %e, "Job update failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobStatus;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_create_is_immediately_visible() {
        let manager = JobManager::default();
        let id = assert_ok!(manager.create().await);
        let job = assert_ok!(manager.get(&id).await).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let manager = JobManager::default();
        let a = manager.create().await.unwrap();
        let b = manager.create().await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_progress_on_unknown_job_is_noop() {
        let manager = JobManager::default();
        assert!(!manager.set_progress(&JobId::new(), 50).await);
    }

    #[tokio::test]
    async fn test_complete_then_fail_is_ignored() {
        let manager = JobManager::default();
        let id = manager.create().await.unwrap();

        assert!(manager.complete(&id, PathBuf::from("uploads/x_final.mp4")).await);
        assert!(!manager.fail(&id, "late failure").await);
        assert!(!manager.set_progress(&id, 10).await);

        let job = manager.get(&id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.error_message.is_none());
    }

    #[tokio::test]
    async fn test_fail_keeps_progress() {
        let manager = JobManager::default();
        let id = manager.create().await.unwrap();
        manager.set_progress(&id, 50).await;
        manager.fail(&id, "audio generation failed").await;

        let job = manager.get(&id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 50);
        assert_eq!(job.error_message.as_deref(), Some("audio generation failed"));
    }
}

//! Job record storage.

use std::collections::HashMap;

use async_trait::async_trait;
use reel_models::{Job, JobId, JobMutation, TransitionError};
use thiserror::Error;
use tokio::sync::RwLock;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job already exists: {0}")]
    Duplicate(JobId),

    #[error(transparent)]
    Rejected(#[from] TransitionError),

    #[error("job store backend error: {0}")]
    Backend(String),
}

/// Concurrency-safe table of job records.
///
/// `update` must apply the mutation atomically with respect to other
/// updates of the same job; different jobs never block each other's
/// correctness.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: Job) -> StoreResult<()>;

    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Apply `mutation` and return the updated record.
    async fn update(&self, id: &JobId, mutation: JobMutation) -> StoreResult<Job>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate(job.id));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn update(&self, id: &JobId, mutation: JobMutation) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        job.apply(mutation)?;
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobStatus;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_get_update() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();
        store.insert(Job::new(id.clone())).await.unwrap();

        let job = store.update(&id, JobMutation::Progress(50)).await.unwrap();
        assert_eq!(job.progress, 50);
        assert_eq!(store.get(&id).await.unwrap().unwrap().progress, 50);
        assert!(store.get(&JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryJobStore::new();
        let id = JobId::from_string("dup");
        store.insert(Job::new(id.clone())).await.unwrap();
        assert!(matches!(
            store.insert(Job::new(id)).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_job() {
        let store = InMemoryJobStore::new();
        assert!(matches!(
            store.update(&JobId::new(), JobMutation::Progress(1)).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_terminal_writes_single_winner() {
        let store = Arc::new(InMemoryJobStore::new());
        let id = JobId::new();
        store.insert(Job::new(id.clone())).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let mutation = if i % 2 == 0 {
                    JobMutation::Complete(PathBuf::from(format!("{}.mp4", i)))
                } else {
                    JobMutation::Fail(format!("error {}", i))
                };
                store.update(&id, mutation).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let job = store.get(&id).await.unwrap().unwrap();
        match job.status {
            JobStatus::Completed => assert!(job.file_path.is_some() && job.error_message.is_none()),
            JobStatus::Failed => assert!(job.error_message.is_some() && job.file_path.is_none()),
            JobStatus::Processing => panic!("job left processing state"),
        }
    }
}

//! Job records: storage and lifecycle.

mod manager;
mod store;

pub use manager::JobManager;
pub use store::{InMemoryJobStore, JobStore, StoreError, StoreResult};

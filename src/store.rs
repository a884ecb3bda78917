//! JobStore (spec.md §3/§5): a single protected map, serialized mutations,
//! concurrent reads — grounded in the teacher's `RwLock<HashMap<...>>` job
//! registries.

use crate::core::types::Job;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    retention_hours: i64,
}

impl JobStore {
    pub fn new(retention_hours: i64) -> Self {
        Self { jobs: Arc::new(RwLock::new(HashMap::new())), retention_hours }
    }

    pub async fn insert(&self, job: Job) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id, job);
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).cloned()
    }

    /// Applies `mutate` to the stored job under a write lock, if present.
    pub async fn update<F>(&self, id: Uuid, mutate: F)
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            mutate(job);
        }
    }

    /// Removes a job from the store (DELETE / cancellation path, spec.md §5).
    pub async fn remove(&self, id: Uuid) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        jobs.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Retention sweep (spec.md §4.9): remove jobs older than `retention_hours`.
    /// Returns the number of jobs removed.
    pub async fn sweep(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::hours(self.retention_hours);
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at > cutoff);
        before - jobs.len()
    }

    /// Spawns a background task that sweeps once an hour for the life of the
    /// process (spec.md §4.9: "JobStore sweeps every hour and on each job
    /// creation").
    pub fn spawn_periodic_sweep(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                let removed = store.sweep().await;
                if removed > 0 {
                    tracing::info!(removed, "job store retention sweep");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::JobOptions;

    fn sample_job() -> Job {
        Job::new("https://example.com".into(), "2840".into(), None, JobOptions::default(), None)
    }

    #[tokio::test]
    async fn insert_and_get_round_trips() {
        let store = JobStore::new(24);
        let job = sample_job();
        let id = job.id;
        store.insert(job).await;
        let fetched = store.get(id).await;
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().id, id);
    }

    #[tokio::test]
    async fn remove_then_get_returns_none() {
        let store = JobStore::new(24);
        let job = sample_job();
        let id = job.id;
        store.insert(job).await;
        store.remove(id).await;
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_jobs_older_than_retention() {
        let store = JobStore::new(0);
        let mut job = sample_job();
        job.created_at = Utc::now() - chrono::Duration::hours(1);
        store.insert(job).await;
        let removed = store.sweep().await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn update_mutates_stored_job() {
        let store = JobStore::new(24);
        let job = sample_job();
        let id = job.id;
        store.insert(job).await;
        store.update(id, |j| j.set_progress(50, "scanning")).await;
        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.progress, 50);
    }
}

//! File-backed job ledger
//!
//! Jobs live in one `jobs.json` file under the data directory, written
//! atomically under an `fd-lock` like every other collection. Mutation goes
//! through the four ledger operations only.

use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::ledger::{Job, JobStatus};
use crate::populate::{JobApi, PopulateResult};
use crate::store::{OpenPolicy, StoreError, MAX_STORE_FILE_SIZE};

/// Durable record of population runs
pub struct JobLedger {
    path: PathBuf,
    lock_path: PathBuf,
    counter: AtomicU64,
}

impl JobLedger {
    /// Open the ledger under `dir`, creating the directory if needed
    pub fn open(dir: &Path, policy: &OpenPolicy) -> Result<Self, StoreError> {
        let mut last_error = None;
        for attempt in 1..=policy.max_attempts {
            match std::fs::create_dir_all(dir) {
                Ok(()) => {
                    debug!(dir = %dir.display(), "job ledger opened");
                    return Ok(Self {
                        path: dir.join("jobs.json"),
                        lock_path: dir.join("jobs.lock"),
                        counter: AtomicU64::new(0),
                    });
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "failed to open job ledger"
                    );
                    last_error = Some(e);
                    if attempt < policy.max_attempts {
                        std::thread::sleep(policy.retry_delay);
                    }
                }
            }
        }
        Err(StoreError::Open(format!(
            "could not open job ledger after {} attempts: {}",
            policy.max_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Create a new job in `Running` state
    pub fn init_job(&self) -> Result<Job, StoreError> {
        let job = Job::new(self.next_id());
        self.with_jobs_mut(|jobs| {
            jobs.push(job.clone());
        })?;
        info!(job_id = %job.id, "job created");
        Ok(job)
    }

    /// Most recently suspended job, if any.
    ///
    /// Only `Suspended` jobs qualify: a completed run must never hand a
    /// resume position to the next incremental pass.
    pub fn find_last_job(&self) -> Result<Option<Job>, StoreError> {
        let jobs = self.load()?;
        Ok(jobs
            .into_iter()
            .filter(|j| j.status == JobStatus::Suspended)
            .max_by_key(|j| j.end_date))
    }

    /// Suspend `job_id` at `team_id`.
    ///
    /// A missing job id is logged and ignored rather than failed: the run is
    /// already terminating and the fetch error it is reporting matters more.
    pub fn update_job_with_current_team(
        &self,
        job_id: &str,
        team_id: u32,
    ) -> Result<(), StoreError> {
        self.with_jobs_mut(|jobs| match jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) => {
                job.suspend(team_id);
                info!(job_id, team_id, "job suspended");
            }
            None => warn!(job_id, team_id, "job not found, suspension not recorded"),
        })
    }

    /// Mark `job_id` completed, clearing its resume position
    pub fn complete_job(&self, job_id: &str) -> Result<(), StoreError> {
        self.with_jobs_mut(|jobs| match jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) => {
                job.complete();
                info!(job_id, "job completed");
            }
            None => warn!(job_id, "job not found, completion not recorded"),
        })
    }

    fn next_id(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("job-{}-{seq:04}", chrono::Utc::now().timestamp_millis())
    }

    fn with_jobs_mut(&self, mutate: impl FnOnce(&mut Vec<Job>)) -> Result<(), StoreError> {
        let lock_file = self.open_lock_file()?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| StoreError::Lock(format!("failed to acquire write lock: {e}")))?;

        let mut jobs = self.load_unlocked()?;
        mutate(&mut jobs);
        self.save_unlocked(&jobs)
    }

    fn load(&self) -> Result<Vec<Job>, StoreError> {
        let lock_file = self.open_lock_file()?;
        let lock = RwLock::new(lock_file);
        let _guard = lock
            .read()
            .map_err(|e| StoreError::Lock(format!("failed to acquire read lock: {e}")))?;
        self.load_unlocked()
    }

    fn load_unlocked(&self) -> Result<Vec<Job>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let metadata = std::fs::metadata(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        if metadata.len() > MAX_STORE_FILE_SIZE {
            return Err(StoreError::TooLarge {
                size: metadata.len(),
                max: MAX_STORE_FILE_SIZE,
            });
        }
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    fn save_unlocked(&self, jobs: &[Job]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(jobs)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| StoreError::Io(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| StoreError::Io(format!("failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| StoreError::Io(format!("failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::Io(format!("failed to sync temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| StoreError::Io(format!("failed to persist temp file: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn open_lock_file(&self) -> Result<std::fs::File, StoreError> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StoreError::Lock(format!("failed to create lock file: {e}")))
    }
}

#[async_trait]
impl JobApi for JobLedger {
    async fn init_job(&self) -> PopulateResult<Job> {
        Ok(JobLedger::init_job(self)?)
    }

    async fn find_last_job(&self) -> PopulateResult<Option<Job>> {
        Ok(JobLedger::find_last_job(self)?)
    }

    async fn update_job_with_current_team(&self, job_id: &str, team_id: u32) -> PopulateResult<()> {
        Ok(JobLedger::update_job_with_current_team(self, job_id, team_id)?)
    }

    async fn complete_job(&self, job_id: &str) -> PopulateResult<()> {
        Ok(JobLedger::complete_job(self, job_id)?)
    }
}

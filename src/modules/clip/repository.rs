use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::model::{ClipJob, NewClipJob};
use crate::common::error::{ClipError, ClipResult};
use crate::common::fs::write_atomic;

/// Durable ledger of clip jobs.
///
/// The whole ledger is rewritten on every mutation. A mutation only becomes
/// visible in memory once the rewrite has landed on disk.
pub struct ClipRepository {
    path: PathBuf,
    jobs: Mutex<Vec<ClipJob>>,
}

impl ClipRepository {
    /// Load the ledger at `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> ClipResult<Self> {
        let path = path.as_ref().to_path_buf();

        let jobs = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ClipError::Persistence(format!("ledger {} is unreadable: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(ClipError::Persistence(format!(
                    "failed to read ledger {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        info!("📒 Loaded {} clip job(s) from {}", jobs.len(), path.display());

        Ok(Self {
            path,
            jobs: Mutex::new(jobs),
        })
    }

    pub async fn create(&self, new: NewClipJob) -> ClipResult<ClipJob> {
        let mut jobs = self.jobs.lock().await;

        let now = OffsetDateTime::now_utc();
        let millis = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        let last = jobs.iter().map(|j| j.id).max().unwrap_or(0);
        let id = millis.max(last + 1);

        let job = ClipJob {
            id,
            source_url: new.source_url,
            start_seconds: new.start_seconds,
            end_seconds: new.end_seconds,
            transcript: new.transcript,
            crop_width: new.crop_width,
            crop_height: new.crop_height,
            aspect_ratio: new.aspect_ratio,
            current_artifact: Default::default(),
            created_at: Some(now),
        };

        jobs.push(job.clone());
        if let Err(e) = self.persist(&jobs).await {
            jobs.pop();
            return Err(e);
        }

        Ok(job)
    }

    pub async fn get(&self, id: i64) -> ClipResult<ClipJob> {
        self.jobs
            .lock()
            .await
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| ClipError::not_found(format!("clip job {} not found", id)))
    }

    /// All jobs in insertion order.
    pub async fn list(&self) -> Vec<ClipJob> {
        self.jobs.lock().await.clone()
    }

    pub async fn delete(&self, id: i64) -> ClipResult<()> {
        let mut jobs = self.jobs.lock().await;
        let index = jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| ClipError::not_found(format!("clip job {} not found", id)))?;

        let removed = jobs.remove(index);
        if let Err(e) = self.persist(&jobs).await {
            jobs.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }

    /// Apply `mutate` to one job and rewrite the ledger; on a failed write the job keeps its old value.
    pub async fn update<F>(&self, id: i64, mutate: F) -> ClipResult<ClipJob>
    where
        F: FnOnce(&mut ClipJob),
    {
        let mut jobs = self.jobs.lock().await;
        let index = jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| ClipError::not_found(format!("clip job {} not found", id)))?;

        let previous = jobs[index].clone();
        mutate(&mut jobs[index]);
        // Identity fields are immutable regardless of what the mutator did.
        jobs[index].id = previous.id;

        if let Err(e) = self.persist(&jobs).await {
            jobs[index] = previous;
            return Err(e);
        }
        Ok(jobs[index].clone())
    }

    async fn persist(&self, jobs: &[ClipJob]) -> ClipResult<()> {
        let body = serde_json::to_vec_pretty(jobs)
            .map_err(|e| ClipError::Persistence(format!("failed to encode ledger: {}", e)))?;

        write_atomic(&self.path, &body).await.map_err(|e| {
            error!("Failed to write ledger {}: {}", self.path.display(), e);
            ClipError::Persistence(format!("failed to write ledger: {}", e))
        })
    }
}

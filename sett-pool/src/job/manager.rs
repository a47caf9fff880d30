//! Job bookkeeping between the template poller and the transport.
//!
//! The manager owns the live jobs for one pool: it decides whether an
//! incoming template warrants fresh work, assigns job ids, and routes share
//! submissions to the job they reference. A small tail of superseded jobs is
//! kept addressable so submissions already in flight when new work was
//! broadcast still validate instead of bouncing with a spurious stale error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::clock::Clock;
use crate::error::{ConfigurationError, ShareError};
use crate::hashing::JobHashers;
use crate::template::BlockTemplate;
use crate::worker::WorkerContext;

use super::{Job, PoolParams, ShareResult};

/// Superseded jobs kept addressable for in-flight submissions.
const JOB_TAIL_LEN: usize = 4;

/// Creates and tracks the jobs derived from incoming templates.
pub struct JobManager {
    params: PoolParams,
    hashers: JobHashers,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
    /// Newest job first.
    jobs: RwLock<VecDeque<Arc<Job>>>,
}

impl JobManager {
    /// Create a manager for one pool configuration.
    pub fn new(params: PoolParams, hashers: JobHashers, clock: Arc<dyn Clock>) -> Self {
        Self {
            params,
            hashers,
            clock,
            next_id: AtomicU64::new(1),
            jobs: RwLock::new(VecDeque::new()),
        }
    }

    /// Consider a freshly polled template.
    ///
    /// Builds and publishes a new job when the template moves to a new
    /// height, or when it reshuffles the transaction set at the current
    /// height while the current job is still unworked (no submissions yet).
    /// Returns the new job for broadcasting, or `None` when the current job
    /// already covers the template.
    pub fn update_template(
        &self,
        template: &BlockTemplate,
    ) -> Result<Option<Arc<Job>>, ConfigurationError> {
        let tx_hashes: Vec<[u8; 32]> = template
            .transactions
            .iter()
            .map(|tx| tx.txid_bytes())
            .collect::<Result<_, _>>()?;

        if let Some(current) = self.current() {
            let same_height = current.height() == template.height;
            let same_txs = current.tx_hashes() == tx_hashes.as_slice();
            if same_height && (same_txs || current.has_submissions()) {
                return Ok(None);
            }
        }

        let id = format!("{:x}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let job = Arc::new(Job::new(
            id,
            template,
            &self.params,
            self.hashers.clone(),
            self.clock.clone(),
        )?);

        let mut jobs = self.jobs.write();
        jobs.push_front(job.clone());
        jobs.truncate(JOB_TAIL_LEN);

        info!(
            job_id = %job.id(),
            height = job.height(),
            "published new job"
        );
        Ok(Some(job))
    }

    /// The job workers should currently be mining, if any.
    pub fn current(&self) -> Option<Arc<Job>> {
        self.jobs.read().front().cloned()
    }

    /// Look up a job by the id a submission references.
    pub fn get(&self, job_id: &str) -> Option<Arc<Job>> {
        self.jobs
            .read()
            .iter()
            .find(|job| job.id() == job_id)
            .cloned()
    }

    /// Validate a submission against the job it references.
    pub fn process_share(
        &self,
        job_id: &str,
        worker: &WorkerContext,
        extranonce2: &str,
        ntime: &str,
        nonce: &str,
    ) -> Result<ShareResult, ShareError> {
        let job = self
            .get(job_id)
            .ok_or_else(|| ShareError::JobNotFound(job_id.to_string()))?;
        job.process_share(worker, extranonce2, ntime, nonce)
    }
}

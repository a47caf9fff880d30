//! Per-connection worker state consumed by share validation.

use crate::types::Difficulty;

/// The validation-relevant state of a connected worker.
///
/// Owned by the connection/session layer and passed by reference into
/// [`Job::process_share`](crate::job::Job::process_share) with each
/// submission. The job never retains it; difficulty may be retuned by the
/// vardiff controller between submissions without touching any job state.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    /// Pool-assigned extranonce1, fixed-width hex.
    pub extranonce1: String,

    /// Current share-acceptance difficulty.
    pub difficulty: Difficulty,

    /// Authorized worker name, for accounting and logs.
    pub user: String,
}

impl WorkerContext {
    /// Create a worker context.
    pub fn new(extranonce1: impl Into<String>, difficulty: f64, user: impl Into<String>) -> Self {
        Self {
            extranonce1: extranonce1.into(),
            difficulty: Difficulty::new(difficulty),
            user: user.into(),
        }
    }
}

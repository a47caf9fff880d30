//! Error types for job construction and share validation.

use thiserror::Error;

/// Reasons a share submission is rejected.
///
/// Every rejection is reported to the caller; the transport layer translates
/// these into worker-facing protocol responses and decides on any punitive
/// action. The validation core never retries and, apart from the duplicate
/// tracker recording the submission, never mutates state on failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShareError {
    /// A submission parameter failed to decode or had the wrong width.
    #[error("malformed {0} parameter")]
    MalformedParameter(&'static str),

    /// The exact (extranonce1, extranonce2, ntime, nonce) tuple was
    /// already submitted against this job.
    #[error("duplicate share")]
    DuplicateShare,

    /// Submitted ntime is before the job's template time or past the
    /// allowed forward drift from the current time.
    #[error("ntime out of range")]
    NtimeOutOfRange,

    /// The header hash does not meet the worker's share target.
    #[error("low difficulty share of {0}")]
    LowDifficultyShare(f64),

    /// The referenced job id is unknown or has been retired.
    #[error("job '{0}' not found")]
    JobNotFound(String),
}

impl ShareError {
    /// Conventional stratum rejection code for this error, for the
    /// transport layer to relay in `mining.submit` error responses.
    pub fn stratum_code(&self) -> u32 {
        match self {
            ShareError::MalformedParameter(_) => 20,
            ShareError::NtimeOutOfRange => 20,
            ShareError::JobNotFound(_) => 21,
            ShareError::DuplicateShare => 22,
            ShareError::LowDifficultyShare(_) => 23,
        }
    }
}

/// Errors detected while building a job or interpreting pool configuration.
///
/// Construction either fully succeeds or fails with one of these; a job that
/// failed to build must never be published to workers.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A template field failed hex decoding or basic validation.
    #[error("invalid template field {field}: {reason}")]
    InvalidTemplateField {
        field: &'static str,
        reason: String,
    },

    /// The pool payout address could not be parsed for the configured
    /// network.
    #[error("invalid payout address: {0}")]
    InvalidPayoutAddress(String),

    /// The assembled coinbase script sig exceeds the consensus limit.
    #[error("coinbase script sig is {0} bytes, exceeds the 100 byte limit")]
    ScriptSigTooLong(usize),

    /// Extranonce widths must be 1-8 bytes each.
    #[error("invalid extranonce width: {0} bytes")]
    InvalidExtranonceWidth(usize),

    /// The extranonce1 counter ran out of values for the configured width.
    #[error("extranonce1 space exhausted for width {0}")]
    ExtranonceExhausted(usize),
}

//! Job construction and share validation for a stratum mining pool.
//!
//! This crate is the CPU-bound core of a pool server: it turns daemon block
//! templates into mineable work units and validates the proof-of-work shares
//! workers submit against them. Transport, daemon polling, persistence and
//! difficulty retuning are collaborators that live elsewhere; they feed this
//! core plain values and consume plain results.
//!
//! # Architecture
//!
//! - [`template::BlockTemplate`] - the daemon's `getblocktemplate` snapshot
//! - [`job::Job`] - one immutable work unit per template: expanded network
//!   target, split coinbase, merkle branch, header fields, plus the only
//!   piece of mutable state in the crate, the duplicate-submission tracker
//! - [`job::JobManager`] - job ids, template-change detection and share
//!   routing
//! - [`extranonce::ExtranonceProvider`] - unique per-connection extranonce1
//!   issuance
//! - [`hashing`] - pluggable hash algorithms selected per coin family
//! - [`clock`] - injectable time source for deterministic ntime validation
//!
//! # Concurrency
//!
//! Many workers mine the same job simultaneously, so
//! [`Job::process_share`](job::Job::process_share) is safe to call from any
//! number of threads against one job instance: all job fields are frozen at
//! construction and the duplicate tracker performs its check-and-insert
//! atomically. Nothing in this crate blocks on I/O.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use sett_pool::clock::FixedClock;
//! use sett_pool::hashing::JobHashers;
//! use sett_pool::job::{JobManager, PoolParams};
//! use sett_pool::template::BlockTemplate;
//! use sett_pool::worker::WorkerContext;
//! use sett_pool::ExtranonceProvider;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = PoolParams::new(
//!     bitcoin::Network::Regtest,
//!     "mjn3q42yxr9yLA3gyseHCZCHEptZC31PEh",
//!     "/sett/",
//! )?;
//! let clock = Arc::new(FixedClock::new(1508869874));
//! let manager = JobManager::new(params, JobHashers::double_sha256(), clock);
//!
//! let template: BlockTemplate = serde_json::from_str(
//!     r#"{
//!         "version": 536870912,
//!         "previousblockhash": "000000000909578519b5be7b37fdc53b2923817921c43108a907b72264da76bb",
//!         "coinbasevalue": 5000000000,
//!         "curtime": 1508869874,
//!         "bits": "207fffff",
//!         "height": 14
//!     }"#,
//! )?;
//! let job = manager.update_template(&template)?.expect("first template");
//!
//! let extranonces = ExtranonceProvider::new(4)?;
//! let worker = WorkerContext::new(extranonces.next()?, 0.5, "alice.rig1");
//! let rejected = manager.process_share(job.id(), &worker, "00000000", "59ef86f2", "00000000");
//! assert!(rejected.is_err());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod extranonce;
pub mod hashing;
pub mod job;
pub mod template;
pub mod types;
pub mod u256;
pub mod worker;

pub use clock::{Clock, SystemClock};
pub use error::{ConfigurationError, ShareError};
pub use extranonce::ExtranonceProvider;
pub use hashing::{HashAlgorithm, JobHashers};
pub use job::{Job, JobManager, NotifyParams, PoolParams, ShareResult};
pub use template::BlockTemplate;
pub use types::Difficulty;
pub use worker::WorkerContext;

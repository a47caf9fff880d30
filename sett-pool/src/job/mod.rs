//! Mineable work units and share validation.
//!
//! A [`Job`] is the pool's unit of work: built once from a daemon block
//! template, broadcast to workers, and then asked to validate every share
//! submitted against it. Construction derives everything validation needs -
//! the expanded network target, the split coinbase, the merkle branch and
//! the header fields - so that `process_share` is a pure CPU-bound pipeline
//! over immutable data. The only mutable state on a job is its
//! duplicate-submission tracker, which is internally synchronized; one job
//! instance safely serves any number of concurrent validation calls.
//!
//! [`JobManager`] layers job bookkeeping on top: job id assignment,
//! deciding when a fresh template warrants a new job, and routing
//! submissions to the job they reference.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use bitcoin::block::{Header as BlockHeader, Version};
use bitcoin::consensus::encode::{serialize, VarInt};
use bitcoin::hashes::Hash;
use bitcoin::pow::Target;
use bitcoin::{Address, Amount, BlockHash, CompactTarget, Network, ScriptBuf, TxMerkleNode};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{ConfigurationError, ShareError};
use crate::extranonce::{decode_fixed_hex, DEFAULT_EXTRANONCE1_LEN, DEFAULT_EXTRANONCE2_LEN};
use crate::hashing::JobHashers;
use crate::template::{expand_compact_target, BlockTemplate};
use crate::u256::U256;
use crate::worker::WorkerContext;

mod coinbase;
mod manager;
mod merkle;

#[cfg(test)]
mod test_templates;

pub use manager::JobManager;

/// How far ahead of the pool's clock a submitted ntime may run, in seconds.
///
/// The protocol does not pin this down; nodes accept blocks up to two hours
/// ahead of network-adjusted time, so that is the widest window a pool can
/// safely relay. Kept as an explicit constant (and a [`PoolParams`] field)
/// rather than an inferred value; the bounds are pinned by tests.
pub const DEFAULT_MAX_NTIME_DRIFT: u64 = 7200;

/// Pool-side parameters for job construction.
#[derive(Debug, Clone)]
pub struct PoolParams {
    /// Network the pool mines on.
    pub network: Network,

    /// Script every coinbase pays the block reward to.
    pub payout_script: ScriptBuf,

    /// Signature tag embedded in each coinbase script sig.
    pub coinbase_tag: String,

    /// Width of pool-assigned extranonce1 values, bytes.
    pub extranonce1_len: usize,

    /// Width of worker-rolled extranonce2 values, bytes.
    pub extranonce2_len: usize,

    /// Allowed forward drift of submitted ntime values, seconds.
    pub max_ntime_drift: u64,
}

impl PoolParams {
    /// Build params from a payout address, which must parse for `network`.
    pub fn new(
        network: Network,
        payout_address: &str,
        coinbase_tag: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let address = Address::from_str(payout_address)
            .map_err(|e| ConfigurationError::InvalidPayoutAddress(e.to_string()))?
            .require_network(network)
            .map_err(|e| ConfigurationError::InvalidPayoutAddress(e.to_string()))?;
        Ok(Self::with_payout_script(
            network,
            address.script_pubkey(),
            coinbase_tag,
        ))
    }

    /// Build params from an explicit payout script.
    pub fn with_payout_script(
        network: Network,
        payout_script: ScriptBuf,
        coinbase_tag: impl Into<String>,
    ) -> Self {
        Self {
            network,
            payout_script,
            coinbase_tag: coinbase_tag.into(),
            extranonce1_len: DEFAULT_EXTRANONCE1_LEN,
            extranonce2_len: DEFAULT_EXTRANONCE2_LEN,
            max_ntime_drift: DEFAULT_MAX_NTIME_DRIFT,
        }
    }
}

/// Outcome of a successfully validated share.
///
/// Constructed fresh per accepted share and never retained by the job; the
/// transport and accounting layers consume it.
#[derive(Debug, Clone)]
pub struct ShareResult {
    /// Whether the share's hash also meets the network target, i.e. solves
    /// a block.
    pub is_block_candidate: bool,

    /// Header hash in display (big-endian) order, hex.
    pub block_hash: String,

    /// Full serialized block, hex; populated only for block candidates,
    /// ready to hand to the daemon-submission collaborator.
    pub block_hex: Option<String>,

    /// Height of the block being mined.
    pub block_height: u64,

    /// Total coinbase payout for the block.
    pub block_reward: Amount,

    /// The worker's difficulty at the time the share was accepted.
    pub stratum_difficulty: f64,
}

/// A mineable work unit derived from one block template.
///
/// Everything set during construction is immutable afterwards, so concurrent
/// [`process_share`](Self::process_share) calls need no synchronization
/// beyond the internal duplicate tracker. Jobs are superseded, never mutated,
/// when a new template arrives.
pub struct Job {
    id: String,
    height: u64,
    block_reward: Amount,
    network_target: U256,
    version: Version,
    prev_blockhash: BlockHash,
    bits: CompactTarget,
    ntime: u32,
    created_at: u64,
    max_ntime_drift: u64,
    extranonce1_len: usize,
    extranonce2_len: usize,
    coinbase1: Vec<u8>,
    coinbase2: Vec<u8>,
    merkle_branch: Vec<TxMerkleNode>,
    tx_hashes: Vec<[u8; 32]>,
    raw_transactions: Vec<Vec<u8>>,
    hashers: JobHashers,
    clock: Arc<dyn Clock>,
    submissions: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("height", &self.height)
            .field("block_reward", &self.block_reward)
            .field("network_target", &self.network_target)
            .field("version", &self.version)
            .field("prev_blockhash", &self.prev_blockhash)
            .field("bits", &self.bits)
            .field("ntime", &self.ntime)
            .field("created_at", &self.created_at)
            .field("max_ntime_drift", &self.max_ntime_drift)
            .field("extranonce1_len", &self.extranonce1_len)
            .field("extranonce2_len", &self.extranonce2_len)
            .field("coinbase1", &self.coinbase1)
            .field("coinbase2", &self.coinbase2)
            .field("merkle_branch", &self.merkle_branch)
            .field("tx_hashes", &self.tx_hashes)
            .field("raw_transactions", &self.raw_transactions)
            .field("submissions", &self.submissions)
            .finish_non_exhaustive()
    }
}

impl Job {
    /// Construct a job from a template.
    ///
    /// Either every derived field is computed successfully or the job fails
    /// construction; there is no partial state that could be published.
    pub fn new(
        id: impl Into<String>,
        template: &BlockTemplate,
        params: &PoolParams,
        hashers: JobHashers,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();

        for width in [params.extranonce1_len, params.extranonce2_len] {
            if width == 0 || width > 8 {
                return Err(ConfigurationError::InvalidExtranonceWidth(width));
            }
        }

        let bits = template.compact_target()?;
        let network_target = expand_compact_target(bits);
        let prev_blockhash = template.prev_blockhash()?;
        let created_at = clock.now();

        let parts = coinbase::build_coinbase(
            template,
            &params.payout_script,
            &params.coinbase_tag,
            created_at,
            params.extranonce1_len + params.extranonce2_len,
        )?;

        let tx_hashes: Vec<[u8; 32]> = template
            .transactions
            .iter()
            .map(|tx| tx.txid_bytes())
            .collect::<Result<_, _>>()?;
        let raw_transactions: Vec<Vec<u8>> = template
            .transactions
            .iter()
            .map(|tx| tx.raw_bytes())
            .collect::<Result<_, _>>()?;
        let merkle_branch = merkle::merkle_branch(tx_hashes.clone());

        debug!(
            job_id = %id,
            height = template.height,
            transactions = raw_transactions.len(),
            "built job from template"
        );

        Ok(Self {
            id,
            height: template.height,
            block_reward: Amount::from_sat(template.coinbase_value),
            network_target,
            version: template.block_version(),
            prev_blockhash,
            bits,
            ntime: template.cur_time,
            created_at,
            max_ntime_drift: params.max_ntime_drift,
            extranonce1_len: params.extranonce1_len,
            extranonce2_len: params.extranonce2_len,
            coinbase1: parts.coinbase1,
            coinbase2: parts.coinbase2,
            merkle_branch,
            tx_hashes,
            raw_transactions,
            hashers,
            clock,
            submissions: Mutex::new(HashSet::new()),
        })
    }

    /// Validate one share submission against this job.
    ///
    /// Checks run in a fixed order and stop at the first failure: parameter
    /// format, duplicate submission, ntime window, then the hash pipeline
    /// and target comparisons. The duplicate key is recorded before the
    /// remaining checks, so resubmitting a rejected tuple reports
    /// [`ShareError::DuplicateShare`] rather than re-running validation.
    pub fn process_share(
        &self,
        worker: &WorkerContext,
        extranonce2: &str,
        ntime: &str,
        nonce: &str,
    ) -> Result<ShareResult, ShareError> {
        let extranonce1_bytes = decode_fixed_hex(&worker.extranonce1, self.extranonce1_len)
            .ok_or(ShareError::MalformedParameter("extranonce1"))?;
        let extranonce2_bytes = decode_fixed_hex(extranonce2, self.extranonce2_len)
            .ok_or(ShareError::MalformedParameter("extranonce2"))?;
        let ntime_bytes =
            decode_fixed_hex(ntime, 4).ok_or(ShareError::MalformedParameter("ntime"))?;
        let nonce_bytes =
            decode_fixed_hex(nonce, 4).ok_or(ShareError::MalformedParameter("nonce"))?;
        let ntime_val = u32::from_be_bytes([ntime_bytes[0], ntime_bytes[1], ntime_bytes[2], ntime_bytes[3]]);
        let nonce_val = u32::from_be_bytes([nonce_bytes[0], nonce_bytes[1], nonce_bytes[2], nonce_bytes[3]]);

        // Check-and-insert must be atomic: two concurrent submissions of the
        // same tuple race for one slot in the set.
        let key = submission_key(&worker.extranonce1, extranonce2, ntime, nonce);
        if !self.submissions.lock().insert(key) {
            return Err(ShareError::DuplicateShare);
        }

        if (ntime_val as u64) < self.ntime as u64
            || ntime_val as u64 > self.clock.now() + self.max_ntime_drift
        {
            return Err(ShareError::NtimeOutOfRange);
        }

        let mut coinbase = Vec::with_capacity(
            self.coinbase1.len()
                + extranonce1_bytes.len()
                + extranonce2_bytes.len()
                + self.coinbase2.len(),
        );
        coinbase.extend_from_slice(&self.coinbase1);
        coinbase.extend_from_slice(&extranonce1_bytes);
        coinbase.extend_from_slice(&extranonce2_bytes);
        coinbase.extend_from_slice(&self.coinbase2);

        let coinbase_hash = self.hashers.coinbase.digest(&coinbase);
        let merkle_root = merkle::fold_branch(coinbase_hash, &self.merkle_branch);

        let header = BlockHeader {
            version: self.version,
            prev_blockhash: self.prev_blockhash,
            merkle_root,
            time: ntime_val,
            bits: self.bits,
            nonce: nonce_val,
        };
        let header_bytes = serialize(&header);

        let header_hash = self.hashers.header.digest(&header_bytes);
        let hash_value = U256::from_le_bytes(header_hash);
        let block_hash = hex::encode(self.hashers.display.digest(&header_bytes));

        let share_target = worker.difficulty.to_target_value();
        if hash_value > share_target {
            let achieved = Target::from(hash_value).difficulty_float();
            debug!(
                job_id = %self.id,
                worker = %worker.user,
                achieved,
                required = worker.difficulty.as_f64(),
                "rejecting low difficulty share"
            );
            return Err(ShareError::LowDifficultyShare(achieved));
        }

        let is_block_candidate = hash_value <= self.network_target;
        let block_hex = is_block_candidate.then(|| self.serialize_block(&header_bytes, &coinbase));
        if is_block_candidate {
            info!(
                job_id = %self.id,
                height = self.height,
                block_hash = %block_hash,
                worker = %worker.user,
                "share solves a block"
            );
        }

        Ok(ShareResult {
            is_block_candidate,
            block_hash,
            block_hex,
            block_height: self.height,
            block_reward: self.block_reward,
            stratum_difficulty: worker.difficulty.as_f64(),
        })
    }

    /// Serialize the full block: header, transaction count, coinbase, then
    /// the template transactions in their original order.
    fn serialize_block(&self, header_bytes: &[u8], coinbase: &[u8]) -> String {
        let tx_total: usize = self.raw_transactions.iter().map(Vec::len).sum();
        let mut block =
            Vec::with_capacity(header_bytes.len() + 9 + coinbase.len() + tx_total);
        block.extend_from_slice(header_bytes);
        block.extend_from_slice(&serialize(&VarInt(1 + self.raw_transactions.len() as u64)));
        block.extend_from_slice(coinbase);
        for tx in &self.raw_transactions {
            block.extend_from_slice(tx);
        }
        hex::encode(block)
    }

    /// The stratum `mining.notify` parameters announcing this job.
    pub fn notify_params(&self, clean_jobs: bool) -> NotifyParams {
        NotifyParams {
            job_id: self.id.clone(),
            prev_hash: stratum_prev_hash(&self.prev_blockhash),
            coinbase1: hex::encode(&self.coinbase1),
            coinbase2: hex::encode(&self.coinbase2),
            merkle_branch: self
                .merkle_branch
                .iter()
                .map(|node| hex::encode(node.to_byte_array()))
                .collect(),
            version: format!("{:08x}", self.version.to_consensus()),
            nbits: format!("{:08x}", self.bits.to_consensus()),
            ntime: format!("{:08x}", self.ntime),
            clean_jobs,
        }
    }

    /// Job identifier workers reference in submissions.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Height of the block this job mines.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The expanded network target; hashes at or below it solve a block.
    pub fn network_target(&self) -> U256 {
        self.network_target
    }

    /// Template timestamp; submitted ntime values may not precede it.
    pub fn ntime(&self) -> u32 {
        self.ntime
    }

    /// Clock reading taken at construction.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Whether any submission (accepted or not) was recorded on this job.
    pub fn has_submissions(&self) -> bool {
        !self.submissions.lock().is_empty()
    }

    /// First coinbase half, ending at the extranonce placeholder.
    pub fn coinbase1(&self) -> &[u8] {
        &self.coinbase1
    }

    /// Second coinbase half, starting right after the extranonce bytes.
    pub fn coinbase2(&self) -> &[u8] {
        &self.coinbase2
    }

    /// Txids of this job's template transactions, internal byte order.
    pub(crate) fn tx_hashes(&self) -> &[[u8; 32]] {
        &self.tx_hashes
    }
}

/// Parameters for a stratum `mining.notify` broadcast.
#[derive(Debug, Clone)]
pub struct NotifyParams {
    pub job_id: String,
    /// Previous block hash in stratum's word-swapped hex form.
    pub prev_hash: String,
    pub coinbase1: String,
    pub coinbase2: String,
    /// Branch hashes in internal byte order, hex.
    pub merkle_branch: Vec<String>,
    pub version: String,
    pub nbits: String,
    pub ntime: String,
    pub clean_jobs: bool,
}

fn submission_key(extranonce1: &str, extranonce2: &str, ntime: &str, nonce: &str) -> String {
    format!("{extranonce1}:{extranonce2}:{ntime}:{nonce}").to_lowercase()
}

/// Encode a block hash the way stratum v1 transmits it: internal byte
/// order, but with the bytes of every 32-bit word reversed.
fn stratum_prev_hash(hash: &BlockHash) -> String {
    let mut bytes = hash.to_byte_array();
    for word in bytes.chunks_mut(4) {
        word.reverse();
    }
    hex::encode(bytes)
}

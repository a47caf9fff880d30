//! Pluggable hash algorithms for job and share processing.
//!
//! Different coin families hash the coinbase and the block header with
//! different functions, and present the final hash in different byte orders.
//! Rather than hard-coding double SHA-256 everywhere, the job is constructed
//! with a small set of hash capabilities selected by pool configuration:
//!
//! - [`Sha256d`] - double SHA-256, the Bitcoin-family default
//! - [`Sha256`] - single SHA-256, used by some altcoin families
//! - [`DigestReverser`] - adapter that reverses another algorithm's output,
//!   producing the big-endian display form of a hash

use std::sync::Arc;

use bitcoin::hashes::{sha256, sha256d, Hash};

/// A one-way hash function producing a 256-bit digest.
///
/// Implementations must be stateless and cheap to share; the job invokes
/// them concurrently from many share-validation calls.
pub trait HashAlgorithm: Send + Sync {
    /// Hash `data`, returning the 32-byte digest.
    fn digest(&self, data: &[u8]) -> [u8; 32];
}

/// Double SHA-256 (`SHA256(SHA256(data))`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256d;

impl HashAlgorithm for Sha256d {
    fn digest(&self, data: &[u8]) -> [u8; 32] {
        sha256d::Hash::hash(data).to_byte_array()
    }
}

/// Single SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl HashAlgorithm for Sha256 {
    fn digest(&self, data: &[u8]) -> [u8; 32] {
        sha256::Hash::hash(data).to_byte_array()
    }
}

/// Reverses the byte order of an inner algorithm's digest.
///
/// Hash functions emit digests in wire order (little-endian when interpreted
/// as a number); block explorers and target comparisons use the reversed,
/// big-endian form. Wrapping an algorithm in this adapter yields that
/// canonical display form directly.
pub struct DigestReverser<H: HashAlgorithm>(pub H);

impl<H: HashAlgorithm> HashAlgorithm for DigestReverser<H> {
    fn digest(&self, data: &[u8]) -> [u8; 32] {
        let mut out = self.0.digest(data);
        out.reverse();
        out
    }
}

/// The hash algorithms a job uses, as selected by pool configuration.
#[derive(Clone)]
pub struct JobHashers {
    /// Hashes the assembled coinbase transaction.
    pub coinbase: Arc<dyn HashAlgorithm>,

    /// Hashes the 80-byte block header.
    pub header: Arc<dyn HashAlgorithm>,

    /// Produces the display-order (big-endian) header hash, used for the
    /// target comparison value and the reported block hash.
    pub display: Arc<dyn HashAlgorithm>,
}

impl JobHashers {
    /// The Bitcoin-family selection: double SHA-256 for coinbase and
    /// header, with the display form being the reversed header hash.
    pub fn double_sha256() -> Self {
        Self {
            coinbase: Arc::new(Sha256d),
            header: Arc::new(Sha256d),
            display: Arc::new(DigestReverser(Sha256d)),
        }
    }
}

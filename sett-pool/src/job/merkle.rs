//! Merkle branch computation and folding.
//!
//! The pool cannot know the coinbase hash ahead of time (the worker's
//! extranonce2 changes it), so instead of a merkle root the job stores a
//! *branch*: the sequence of sibling hashes the coinbase hash must be folded
//! through, bottom-up, to reach the root. The branch depends only on the
//! template's transaction list and is computed once per job.

use bitcoin::hashes::{sha256d, Hash};
use bitcoin::TxMerkleNode;

/// Compute the merkle branch for a template's non-coinbase transactions.
///
/// `tx_hashes` are the txids in template order, internal byte order. At each
/// tree level the first hash is the sibling the coinbase side pairs with and
/// becomes the next branch element; the remaining hashes are pair-combined
/// (duplicating an odd trailing element, per standard merkle convention) to
/// form the level above. An empty transaction list yields an empty branch.
pub(crate) fn merkle_branch(tx_hashes: Vec<[u8; 32]>) -> Vec<TxMerkleNode> {
    let mut branch = Vec::new();
    let mut level = tx_hashes;

    while !level.is_empty() {
        branch.push(TxMerkleNode::from_byte_array(level[0]));

        let rest = &level[1..];
        if rest.is_empty() {
            break;
        }

        let mut parents = Vec::with_capacity(rest.len().div_ceil(2));
        for pair in rest.chunks(2) {
            let left = pair[0];
            let right = pair.get(1).copied().unwrap_or(left);
            parents.push(combine(left, right));
        }
        level = parents;
    }

    branch
}

/// Fold a coinbase hash up through a merkle branch to the merkle root.
///
/// At every step the running hash is the left operand and the branch element
/// the right, matching the order fixed by [`merkle_branch`]. With an empty
/// branch the coinbase hash is already the root.
pub(crate) fn fold_branch(coinbase_hash: [u8; 32], branch: &[TxMerkleNode]) -> TxMerkleNode {
    let mut current = coinbase_hash;
    for node in branch {
        current = combine(current, node.to_byte_array());
    }
    TxMerkleNode::from_byte_array(current)
}

fn combine(left: [u8; 32], right: [u8; 32]) -> [u8; 32] {
    let mut concat = [0u8; 64];
    concat[..32].copy_from_slice(&left);
    concat[32..].copy_from_slice(&right);
    sha256d::Hash::hash(&concat).to_byte_array()
}

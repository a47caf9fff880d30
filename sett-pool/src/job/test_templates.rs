//! Golden template and share data for validation tests.
//!
//! Job construction and share validation are exact byte games: a single
//! misplaced length marker or swapped word produces a block the network
//! rejects. The fixtures here pin every intermediate artifact - coinbase
//! halves, stratum encodings, the full block - so tests can assert the
//! pipeline byte for byte rather than only end to end.

/// Regtest block at height 14.
///
/// A known-good solo regtest block originally solved through a
/// MiningCore-based pool, which makes it a useful cross-implementation
/// vector: an independent codebase arrived at exactly these bytes from the
/// same template, worker difficulty and submission tuple. The template has
/// no transactions besides the coinbase, so the merkle branch is empty and
/// any divergence points straight at coinbase or header assembly.
pub mod regtest_block_14 {
    /// The daemon's `getblocktemplate` response.
    pub const TEMPLATE_JSON: &str = r#"{
        "version": 536870912,
        "previousblockhash": "000000000909578519b5be7b37fdc53b2923817921c43108a907b72264da76bb",
        "coinbasevalue": 5000000000,
        "target": "7fffff0000000000000000000000000000000000000000000000000000000000",
        "curtime": 1508869874,
        "bits": "207fffff",
        "height": 14,
        "transactions": [],
        "coinbaseaux": {"flags": "0b2f454231362f414431322f"},
        "default_witness_commitment": null
    }"#;

    /// Pool payout address (regtest P2PKH).
    pub const POOL_ADDRESS: &str = "mjn3q42yxr9yLA3gyseHCZCHEptZC31PEh";

    /// Coinbase signature tag the solving pool was configured with.
    pub const COINBASE_TAG: &str = "/MiningCore/";

    /// Extranonce1 assigned to the solving worker.
    pub const EXTRANONCE1: &str = "01000058";

    /// The worker's share difficulty at submission time.
    pub const WORKER_DIFFICULTY: f64 = 0.5;

    /// Pool clock at job construction (equals the template's curtime).
    pub const CREATED_AT: u64 = 1508869874;

    /// Pool clock when the winning share arrived.
    pub const SUBMITTED_AT: u64 = 1508869907;

    // The winning submission tuple.
    pub const EXTRANONCE2: &str = "01000000";
    pub const NTIME: &str = "59ef86f2";
    pub const NONCE: &str = "8d84ae6a";

    /// First coinbase half: tx version, null-outpoint input, script length,
    /// height push (OP_PUSHNUM_14), aux flags push, timestamp push, and the
    /// 8-byte extranonce placeholder marker.
    pub const COINBASE1_HEX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff295e0c0b2f454231362f414431322f04f286ef5908";

    /// Second coinbase half: signature tag push, sequence, the single
    /// payout output, and locktime.
    pub const COINBASE2_HEX: &str = "0c2f4d696e696e67436f72652f000000000100f2052a010000001976a9142ebb5cccf9a6bb927661d2953655c43c04accc3788ac00000000";

    /// The template's previous block hash in stratum's word-swapped form.
    pub const STRATUM_PREV_HASH: &str =
        "64da76bba907b72221c431082923817937fdc53b19b5be7b0909578500000000";

    /// Display-order hash of the solved block.
    pub const BLOCK_HASH: &str =
        "000000000fccf11cd0b7d9057441e430c320384b95b034bd28092c4553594b4a";

    /// The complete serialized block as submitted to the daemon.
    pub const BLOCK_HEX: &str = "00000020bb76da6422b707a90831c421798123293bc5fd377bbeb51985570909000000008677145722cbe6f1ebec19fecc724cab5487f3292a69f6908bd512f645bb0635f286ef59ffff7f206aae848d0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff295e0c0b2f454231362f414431322f04f286ef590801000058010000000c2f4d696e696e67436f72652f000000000100f2052a010000001976a9142ebb5cccf9a6bb927661d2953655c43c04accc3788ac00000000";
}

//! Block template received from the daemon.
//!
//! The template-polling collaborator deserializes the daemon's
//! `getblocktemplate` response into [`BlockTemplate`] and hands it to the
//! job layer. Fields stay in the daemon's wire form (hex strings, sat
//! amounts); the typed accessors below convert them on demand and surface
//! malformed values as configuration errors, so a broken template can never
//! become a published job.

use std::str::FromStr;

use bitcoin::block::Version;
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, CompactTarget, Txid};
use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::hashing::{HashAlgorithm, Sha256d};
use crate::u256::U256;

/// A candidate block description from `getblocktemplate`.
///
/// Immutable once received; jobs derive everything they need from it at
/// construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockTemplate {
    /// Block version bits.
    pub version: u32,

    /// Hash of the chain tip this template extends, display order.
    #[serde(rename = "previousblockhash")]
    pub previous_blockhash: String,

    /// Total coinbase payout in satoshis (subsidy plus fees).
    #[serde(rename = "coinbasevalue")]
    pub coinbase_value: u64,

    /// Expanded network target, display order. Informational; the `bits`
    /// field is authoritative.
    #[serde(default)]
    pub target: Option<String>,

    /// Minimum timestamp for the new block.
    #[serde(rename = "curtime")]
    pub cur_time: u32,

    /// Compact-encoded network target.
    pub bits: String,

    /// Height of the block being mined.
    pub height: u64,

    /// Transactions selected by the daemon, coinbase excluded.
    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,

    /// Data the daemon asks to be carried in the coinbase script.
    #[serde(rename = "coinbaseaux", default)]
    pub coinbase_aux: CoinbaseAux,

    /// Witness commitment script for the coinbase, present when the
    /// template contains segwit transactions.
    #[serde(rename = "default_witness_commitment", default)]
    pub default_witness_commitment: Option<String>,
}

/// One non-coinbase transaction in a template.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateTransaction {
    /// Raw transaction, hex encoded.
    pub data: String,

    /// Transaction id, display order.
    #[serde(default)]
    pub txid: Option<String>,

    /// Transaction hash including witness data, display order.
    #[serde(default)]
    pub hash: Option<String>,

    /// Fee in satoshis.
    #[serde(default)]
    pub fee: Option<u64>,
}

/// Extra coinbase script data requested by the daemon.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinbaseAux {
    /// Hex bytes to push into the coinbase script sig.
    #[serde(default)]
    pub flags: Option<String>,
}

impl BlockTemplate {
    /// Previous block hash as a typed value.
    pub fn prev_blockhash(&self) -> Result<BlockHash, ConfigurationError> {
        BlockHash::from_str(&self.previous_blockhash).map_err(|e| {
            ConfigurationError::InvalidTemplateField {
                field: "previousblockhash",
                reason: e.to_string(),
            }
        })
    }

    /// Compact network target as a typed value.
    pub fn compact_target(&self) -> Result<CompactTarget, ConfigurationError> {
        let bits = u32::from_str_radix(&self.bits, 16).map_err(|e| {
            ConfigurationError::InvalidTemplateField {
                field: "bits",
                reason: e.to_string(),
            }
        })?;
        Ok(CompactTarget::from_consensus(bits))
    }

    /// Block version as a typed value.
    pub fn block_version(&self) -> Version {
        Version::from_consensus(self.version as i32)
    }

    /// Coinbase aux flags as raw bytes; empty when the daemon sent none.
    pub fn aux_flags(&self) -> Result<Vec<u8>, ConfigurationError> {
        match self.coinbase_aux.flags.as_deref() {
            None | Some("") => Ok(Vec::new()),
            Some(flags) => {
                hex::decode(flags).map_err(|e| ConfigurationError::InvalidTemplateField {
                    field: "coinbaseaux.flags",
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Witness commitment script bytes, if the template carries one.
    pub fn witness_commitment(&self) -> Result<Option<Vec<u8>>, ConfigurationError> {
        match self.default_witness_commitment.as_deref() {
            None | Some("") => Ok(None),
            Some(commitment) => hex::decode(commitment).map(Some).map_err(|e| {
                ConfigurationError::InvalidTemplateField {
                    field: "default_witness_commitment",
                    reason: e.to_string(),
                }
            }),
        }
    }
}

impl TemplateTransaction {
    /// Raw transaction bytes.
    pub fn raw_bytes(&self) -> Result<Vec<u8>, ConfigurationError> {
        hex::decode(&self.data).map_err(|e| ConfigurationError::InvalidTemplateField {
            field: "transactions.data",
            reason: e.to_string(),
        })
    }

    /// Transaction id in internal byte order, for merkle computation.
    ///
    /// Prefers the daemon-supplied txid; falls back to hashing the raw
    /// transaction when the daemon omitted it (pre-segwit daemons).
    pub fn txid_bytes(&self) -> Result<[u8; 32], ConfigurationError> {
        if let Some(txid) = self.txid.as_deref().or(self.hash.as_deref()) {
            let txid =
                Txid::from_str(txid).map_err(|e| ConfigurationError::InvalidTemplateField {
                    field: "transactions.txid",
                    reason: e.to_string(),
                })?;
            return Ok(txid.to_byte_array());
        }

        let raw = self.raw_bytes()?;
        Ok(Sha256d.digest(&raw))
    }
}

/// Expand a compact target into its full 256-bit form.
///
/// This is the standard exponent/mantissa expansion: the low 23 bits are the
/// mantissa and the high byte counts the total significand width in bytes.
pub fn expand_compact_target(bits: CompactTarget) -> U256 {
    U256::from(bitcoin::pow::Target::from_compact(bits))
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;

    use super::*;

    const TEMPLATE_JSON: &str = r#"{
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

    #[test]
    fn test_deserialize_daemon_response() {
        let template: BlockTemplate = serde_json::from_str(TEMPLATE_JSON).unwrap();
        assert_eq!(template.height, 14);
        assert_eq!(template.coinbase_value, 5_000_000_000);
        assert_eq!(template.cur_time, 1508869874);
        assert!(template.transactions.is_empty());
        assert_eq!(template.witness_commitment().unwrap(), None);
        assert_eq!(template.aux_flags().unwrap().len(), 12);
    }

    #[test]
    fn test_typed_accessors() {
        let template: BlockTemplate = serde_json::from_str(TEMPLATE_JSON).unwrap();
        assert_eq!(
            template.prev_blockhash().unwrap().to_string(),
            template.previous_blockhash
        );
        assert_eq!(
            template.compact_target().unwrap(),
            CompactTarget::from_consensus(0x207fffff)
        );
        assert_eq!(template.block_version().to_consensus(), 0x20000000);
    }

    #[test]
    fn test_compact_expansion_matches_template_target() {
        let template: BlockTemplate = serde_json::from_str(TEMPLATE_JSON).unwrap();
        let expanded = expand_compact_target(template.compact_target().unwrap());
        assert_eq!(expanded.to_string(), template.target.unwrap());
    }

    #[test]
    fn test_malformed_fields_are_rejected() {
        let mut template: BlockTemplate = serde_json::from_str(TEMPLATE_JSON).unwrap();
        template.bits = "xyz".into();
        assert!(template.compact_target().is_err());

        template.previous_blockhash = "1234".into();
        assert!(template.prev_blockhash().is_err());

        template.coinbase_aux.flags = Some("0b2f".into());
        assert_eq!(template.aux_flags().unwrap(), vec![0x0b, 0x2f]);
        template.coinbase_aux.flags = Some("not-hex".into());
        assert!(template.aux_flags().is_err());
    }

    #[test]
    fn test_txid_fallback_hashes_raw_data() {
        // A transaction with no daemon-supplied txid hashes its raw bytes
        let tx = TemplateTransaction {
            data: "00".repeat(60),
            txid: None,
            hash: None,
            fee: None,
        };
        let expected = bitcoin::hashes::sha256d::Hash::hash(&[0u8; 60]).to_byte_array();
        assert_eq!(tx.txid_bytes().unwrap(), expected);
    }
}

//! Coinbase transaction assembly.
//!
//! The pool serializes the coinbase in two halves split around the
//! extranonce placeholder, so that a share submission can be reassembled as
//! `coinbase1 + extranonce1 + extranonce2 + coinbase2` without re-encoding
//! anything. `coinbase1` ends exactly at the placeholder push; everything
//! after the extranonce bytes lives in `coinbase2`.

use bitcoin::consensus::encode::{serialize, VarInt};
use bitcoin::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::{Amount, TxOut};

use crate::error::ConfigurationError;
use crate::template::BlockTemplate;

/// Consensus limit on the coinbase script sig length.
pub(crate) const MAX_SCRIPT_SIG_LEN: usize = 100;

/// Coinbase transaction version.
const TX_VERSION: u32 = 1;

/// The two coinbase halves surrounding the extranonce placeholder.
#[derive(Debug, Clone)]
pub(crate) struct CoinbaseParts {
    pub coinbase1: Vec<u8>,
    pub coinbase2: Vec<u8>,
}

/// Build the split coinbase for a template.
///
/// `coinbase1` carries the transaction version, the single null-outpoint
/// input, the script-sig prefix (height push, daemon aux flags, job creation
/// timestamp) and the placeholder length marker. `coinbase2` carries the
/// pool signature tag, the input sequence, the outputs and the locktime.
pub(crate) fn build_coinbase(
    template: &BlockTemplate,
    payout_script: &ScriptBuf,
    signature_tag: &str,
    created_at: u64,
    extranonce_len: usize,
) -> Result<CoinbaseParts, ConfigurationError> {
    let prefix = script_sig_prefix(template, created_at)?;
    let tag = push_bytes(signature_tag.as_bytes())?;
    let tag_push = Builder::new().push_slice(&tag).into_script().into_bytes();

    // placeholder length marker + extranonce bytes sit between the halves
    let script_sig_len = prefix.len() + 1 + extranonce_len + tag_push.len();
    if script_sig_len > MAX_SCRIPT_SIG_LEN || extranonce_len > 75 {
        return Err(ConfigurationError::ScriptSigTooLong(script_sig_len));
    }

    let mut coinbase1 = Vec::with_capacity(47 + prefix.len());
    coinbase1.extend_from_slice(&TX_VERSION.to_le_bytes());
    coinbase1.extend_from_slice(&serialize(&VarInt(1))); // input count
    coinbase1.extend_from_slice(&[0u8; 32]); // null prevout hash
    coinbase1.extend_from_slice(&u32::MAX.to_le_bytes()); // null prevout index
    coinbase1.extend_from_slice(&serialize(&VarInt(script_sig_len as u64)));
    coinbase1.extend_from_slice(&prefix);
    coinbase1.push(extranonce_len as u8); // direct push of the extranonce

    let outputs = build_outputs(template, payout_script)?;
    let mut coinbase2 = Vec::with_capacity(tag_push.len() + 13 + outputs.len() * 34);
    coinbase2.extend_from_slice(&tag_push);
    coinbase2.extend_from_slice(&0u32.to_le_bytes()); // sequence
    coinbase2.extend_from_slice(&serialize(&VarInt(outputs.len() as u64)));
    for output in &outputs {
        coinbase2.extend_from_slice(&serialize(output));
    }
    coinbase2.extend_from_slice(&0u32.to_le_bytes()); // locktime

    Ok(CoinbaseParts {
        coinbase1,
        coinbase2,
    })
}

/// Script-sig bytes preceding the extranonce placeholder: the block height
/// (BIP34), the daemon's aux flags when present, and the job creation time.
fn script_sig_prefix(
    template: &BlockTemplate,
    created_at: u64,
) -> Result<Vec<u8>, ConfigurationError> {
    let mut builder = Builder::new().push_int(template.height as i64);

    let flags = template.aux_flags()?;
    if !flags.is_empty() {
        builder = builder.push_slice(&push_bytes(&flags)?);
    }

    builder = builder.push_int(created_at as i64);
    Ok(builder.into_script().into_bytes())
}

fn build_outputs(
    template: &BlockTemplate,
    payout_script: &ScriptBuf,
) -> Result<Vec<TxOut>, ConfigurationError> {
    let mut outputs = vec![TxOut {
        value: Amount::from_sat(template.coinbase_value),
        script_pubkey: payout_script.clone(),
    }];

    if let Some(commitment) = template.witness_commitment()? {
        outputs.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::from_bytes(commitment),
        });
    }

    Ok(outputs)
}

fn push_bytes(data: &[u8]) -> Result<PushBytesBuf, ConfigurationError> {
    PushBytesBuf::try_from(data.to_vec()).map_err(|_| {
        ConfigurationError::InvalidTemplateField {
            field: "coinbase script data",
            reason: "push too large".into(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(height: u64, flags: Option<&str>, commitment: Option<&str>) -> BlockTemplate {
        BlockTemplate {
            version: 0x2000_0000,
            previous_blockhash: "00".repeat(32),
            coinbase_value: 5_000_000_000,
            target: None,
            cur_time: 1_508_869_874,
            bits: "207fffff".into(),
            height,
            transactions: Vec::new(),
            coinbase_aux: crate::template::CoinbaseAux {
                flags: flags.map(Into::into),
            },
            default_witness_commitment: commitment.map(Into::into),
        }
    }

    fn payout_script() -> ScriptBuf {
        // Arbitrary P2PKH script
        ScriptBuf::from_bytes(
            hex::decode("76a9142ebb5cccf9a6bb927661d2953655c43c04accc3788ac").unwrap(),
        )
    }

    #[test]
    fn test_small_height_uses_pushnum_opcode() {
        let parts =
            build_coinbase(&template(14, None, None), &payout_script(), "/sett/", 0, 8).unwrap();
        // script sig starts right after version(4) + in-count(1) + outpoint(36) + len(1)
        assert_eq!(parts.coinbase1[42], 0x5e); // OP_PUSHNUM_14
    }

    #[test]
    fn test_large_height_uses_minimal_script_number() {
        let parts = build_coinbase(
            &template(881_423, None, None),
            &payout_script(),
            "/sett/",
            0,
            8,
        )
        .unwrap();
        // 881423 = 0x0d_73_0f, little-endian push of 3 bytes
        assert_eq!(&parts.coinbase1[42..46], &[0x03, 0x0f, 0x73, 0x0d]);
    }

    #[test]
    fn test_halves_reassemble_into_decodable_transaction() {
        let parts = build_coinbase(
            &template(100, Some("0b2f454231362f414431322f"), None),
            &payout_script(),
            "/sett/",
            1_508_869_874,
            8,
        )
        .unwrap();

        let mut raw = parts.coinbase1.clone();
        raw.extend_from_slice(&[0xaa; 8]); // extranonce1 + extranonce2
        raw.extend_from_slice(&parts.coinbase2);

        let tx: bitcoin::Transaction = bitcoin::consensus::deserialize(&raw).unwrap();
        assert!(tx.is_coinbase());
        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.output[0].value.to_sat(), 5_000_000_000);
        assert_eq!(tx.output[0].script_pubkey, payout_script());
    }

    #[test]
    fn test_witness_commitment_adds_zero_value_output() {
        let commitment = format!("6a24aa21a9ed{}", "11".repeat(32));
        let parts = build_coinbase(
            &template(100, None, Some(&commitment)),
            &payout_script(),
            "/sett/",
            1_508_869_874,
            8,
        )
        .unwrap();

        let mut raw = parts.coinbase1.clone();
        raw.extend_from_slice(&[0u8; 8]);
        raw.extend_from_slice(&parts.coinbase2);

        let tx: bitcoin::Transaction = bitcoin::consensus::deserialize(&raw).unwrap();
        assert_eq!(tx.output.len(), 2);
        assert_eq!(tx.output[1].value, Amount::ZERO);
        assert_eq!(hex::encode(tx.output[1].script_pubkey.as_bytes()), commitment);
    }

    #[test]
    fn test_oversized_tag_is_rejected() {
        let tag = "x".repeat(120);
        let err = build_coinbase(&template(100, None, None), &payout_script(), &tag, 0, 8)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::ScriptSigTooLong(_)));
    }
}

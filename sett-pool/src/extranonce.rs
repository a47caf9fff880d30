//! Extranonce issuance and parsing.
//!
//! The coinbase transaction carries an extranonce placeholder that splits
//! into two parts:
//!
//! - **Extranonce1** - assigned by the pool, one per connection, embedded in
//!   every share the worker submits. Diversifies the search space between
//!   workers so they never grind the same coinbase.
//! - **Extranonce2** - rolled freely by the worker within its fixed width,
//!   submitted back with each share.
//!
//! [`ExtranonceProvider`] issues extranonce1 values from a process-wide
//! counter. Issuance must be race-free: two concurrently connecting workers
//! must never receive the same value.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ConfigurationError;

/// Default extranonce1 width in bytes.
pub const DEFAULT_EXTRANONCE1_LEN: usize = 4;

/// Default extranonce2 width in bytes.
pub const DEFAULT_EXTRANONCE2_LEN: usize = 4;

/// Issues unique, fixed-width extranonce1 values.
///
/// Values come from a monotonically increasing counter starting at 1,
/// serialized big-endian to the configured width and handed out as hex.
/// The counter is atomic, so concurrent connection handlers can draw from
/// one shared provider. Once the width's address space is exhausted the
/// provider fails rather than wrapping; at the default 4-byte width that
/// is four billion connections, which no pool process reaches in practice.
#[derive(Debug)]
pub struct ExtranonceProvider {
    width: usize,
    counter: AtomicU64,
}

impl ExtranonceProvider {
    /// Create a provider issuing values of `width` bytes (1-8).
    pub fn new(width: usize) -> Result<Self, ConfigurationError> {
        if width == 0 || width > 8 {
            return Err(ConfigurationError::InvalidExtranonceWidth(width));
        }
        Ok(Self {
            width,
            counter: AtomicU64::new(1),
        })
    }

    /// The configured extranonce1 width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Issue the next extranonce1 as a fixed-width hex string.
    pub fn next(&self) -> Result<String, ConfigurationError> {
        let value = self.counter.fetch_add(1, Ordering::Relaxed);
        if value > max_for_width(self.width) {
            return Err(ConfigurationError::ExtranonceExhausted(self.width));
        }
        Ok(hex::encode(&value.to_be_bytes()[8 - self.width..]))
    }
}

impl Default for ExtranonceProvider {
    fn default() -> Self {
        Self {
            width: DEFAULT_EXTRANONCE1_LEN,
            counter: AtomicU64::new(1),
        }
    }
}

fn max_for_width(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// Decode a hex parameter that must be exactly `width` bytes.
///
/// Share submissions carry extranonce2, ntime and nonce as fixed-width hex
/// strings; anything else is a malformed submission.
pub(crate) fn decode_fixed_hex(value: &str, width: usize) -> Option<Vec<u8>> {
    let bytes = hex::decode(value).ok()?;
    (bytes.len() == width).then_some(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_values_are_sequential_and_fixed_width() {
        let provider = ExtranonceProvider::new(4).unwrap();
        assert_eq!(provider.next().unwrap(), "00000001");
        assert_eq!(provider.next().unwrap(), "00000002");
        assert_eq!(provider.next().unwrap(), "00000003");

        let narrow = ExtranonceProvider::new(2).unwrap();
        assert_eq!(narrow.next().unwrap(), "0001");
    }

    #[test]
    fn test_invalid_widths_rejected() {
        assert!(matches!(
            ExtranonceProvider::new(0),
            Err(ConfigurationError::InvalidExtranonceWidth(0))
        ));
        assert!(matches!(
            ExtranonceProvider::new(9),
            Err(ConfigurationError::InvalidExtranonceWidth(9))
        ));
    }

    #[test]
    fn test_exhaustion_fails_instead_of_wrapping() {
        let provider = ExtranonceProvider::new(1).unwrap();
        for _ in 0..255 {
            provider.next().unwrap();
        }
        assert!(matches!(
            provider.next(),
            Err(ConfigurationError::ExtranonceExhausted(1))
        ));
        // and stays failed
        assert!(provider.next().is_err());
    }

    #[test]
    fn test_concurrent_issuance_never_repeats() {
        let provider = Arc::new(ExtranonceProvider::new(4).unwrap());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let provider = provider.clone();
            handles.push(std::thread::spawn(move || {
                (0..500)
                    .map(|_| provider.next().unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "extranonce1 issued twice");
            }
        }
        assert_eq!(seen.len(), 8 * 500);
    }

    #[test]
    fn test_decode_fixed_hex() {
        assert_eq!(decode_fixed_hex("01000000", 4), Some(vec![1, 0, 0, 0]));
        assert_eq!(decode_fixed_hex("0100", 4), None);
        assert_eq!(decode_fixed_hex("0100000000", 4), None);
        assert_eq!(decode_fixed_hex("zz000000", 4), None);
        assert_eq!(decode_fixed_hex("010", 2), None);
    }
}

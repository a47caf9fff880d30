//! 256-bit unsigned integer arithmetic.
//!
//! Wraps `ruint::aliases::U256` to provide a stable interface for target and
//! difficulty math. This adapter module exists so we can swap the underlying
//! library or implement our own arithmetic without changing callers.

use std::fmt;
use std::ops::{Div, Shl, Shr};

use bitcoin::pow::Target;
use ruint::aliases::U256 as Ruint256;

/// A 256-bit unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct U256(Ruint256);

impl U256 {
    /// Zero constant.
    pub const ZERO: Self = Self(Ruint256::ZERO);

    /// Maximum value (2^256 - 1).
    pub const MAX: Self = Self(Ruint256::MAX);

    /// Create from little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(Ruint256::from_le_bytes(bytes))
    }

    /// Create from big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(Ruint256::from_be_bytes(bytes))
    }

    /// Convert to little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; 32] {
        self.0.to_le_bytes()
    }

    /// Convert to big-endian bytes.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Number of leading zero bits.
    pub fn leading_zeros(self) -> usize {
        self.0.leading_zeros()
    }

    /// Left shift that saturates to `U256::MAX` instead of discarding
    /// high bits. Target arithmetic wants a clamped "easiest possible"
    /// value rather than a silently wrapped one.
    pub fn saturating_shl(self, shift: usize) -> Self {
        if self == Self::ZERO {
            return self;
        }
        if shift >= 256 || self.leading_zeros() < shift {
            return Self::MAX;
        }
        Self(self.0 << shift)
    }
}

impl Div<u64> for U256 {
    type Output = Self;

    fn div(self, rhs: u64) -> Self::Output {
        Self(self.0 / Ruint256::from(rhs))
    }
}

impl Shl<usize> for U256 {
    type Output = Self;

    fn shl(self, rhs: usize) -> Self::Output {
        Self(self.0 << rhs)
    }
}

impl Shr<usize> for U256 {
    type Output = Self;

    fn shr(self, rhs: usize) -> Self::Output {
        Self(self.0 >> rhs)
    }
}

impl From<Target> for U256 {
    fn from(target: Target) -> Self {
        Self::from_le_bytes(target.to_le_bytes())
    }
}

impl From<U256> for Target {
    fn from(value: U256) -> Self {
        Target::from_le_bytes(value.to_le_bytes())
    }
}

impl fmt::Display for U256 {
    /// Big-endian hex, zero-padded to 64 digits (target notation).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_be_bytes()))
    }
}

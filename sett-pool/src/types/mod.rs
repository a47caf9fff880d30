//! Core types for the pool engine.
//!
//! This module provides a unified location for type definitions used
//! throughout the crate. It re-exports commonly used types from rust-bitcoin
//! and defines pool-specific types.

mod difficulty;

// Re-export frequently used bitcoin types for convenience
pub use bitcoin::block::Header as BlockHeader;
pub use bitcoin::{Amount, BlockHash, CompactTarget, Network, ScriptBuf, Target, Txid};
pub use difficulty::Difficulty;

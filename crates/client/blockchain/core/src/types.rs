//! Common types for ledger interactions.

use std::fmt;

use fhevm::CiphertextHandle;
use serde::{Deserialize, Serialize};

/// Transaction identifier returned by a mutating call.
///
/// Holding a `TxId` proves nothing about inclusion; pass it to
/// `wait_for_inclusion` before performing any dependent read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Proof of durable inclusion for a previously submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_id: TxId,
    pub block_height: u64,
    /// Ledger block timestamp, seconds.
    pub block_time: u64,
}

/// One append-only game record as stored by the history contract.
///
/// The final HP and potion count are re-encrypted snapshots: independent
/// handles from the gameplay contract's, addressed to the history contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub final_hp_handle: CiphertextHandle,
    pub final_potion_count_handle: CiphertextHandle,
    pub rooms_explored: u32,
    pub final_position: u32,
    pub timestamp: u64,
    pub exists: bool,
}

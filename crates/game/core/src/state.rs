//! Plaintext game state vocabulary.

use serde::{Deserialize, Serialize};
use strum::FromRepr;

/// Move direction, encoded on-chain as `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Forward = 0,
    Back = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Wire encoding expected by the contract.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Snapshot of the non-confidential per-player counters held by the ledger.
///
/// These are plain storage reads (no decryption involved) and are refreshed
/// together after every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerCounters {
    pub position: u32,
    pub current_room: u32,
    pub max_depth_reached: u32,
    pub rooms_explored: u32,
    pub has_won: bool,
}

//! Numeric contracts of the dungeon.
//!
//! These mirror the on-chain game rules. The client never enforces them
//! (the contract does), but the pipeline samples heal amounts locally and the
//! test doubles replay the same numbers, so they live in one place.

use std::ops::RangeInclusive;

/// HP granted to a freshly created (or reset) player.
pub const INITIAL_HP: u8 = 100;

/// Potions granted to a freshly created (or reset) player.
pub const INITIAL_POTIONS: u8 = 3;

/// Upper HP bound; every mutation clamps into `[0, MAX_HP]` on-chain.
pub const MAX_HP: u8 = 100;

/// Flat HP cost of moving between rooms.
pub const MOVE_HP_COST: u8 = 5;

/// Damage band rolled by the contract when the player attacks.
pub const ATTACK_DAMAGE: RangeInclusive<u8> = 10..=20;

/// Reduced damage band when the player defends instead.
pub const DEFEND_DAMAGE: RangeInclusive<u8> = 5..=10;

/// Heal band sampled client-side and submitted as an encrypted input.
pub const HEAL_AMOUNT: RangeInclusive<u8> = 20..=40;

/// Depth a player must reach for the victory flag to flip on-chain.
pub const VICTORY_DEPTH: u32 = 10;

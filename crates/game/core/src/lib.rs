//! Shared domain types for the Fuzzy Survival client.
//!
//! `game-core` defines the plaintext game vocabulary every other crate speaks:
//! move directions, the on-chain counter snapshot, the fuzzy feedback table
//! and the numeric contracts of the dungeon (initial stats, damage bands,
//! heal band). Everything here is pure data: no I/O, no async, no crypto.
pub mod feedback;
pub mod rules;
pub mod state;

pub use feedback::{FEEDBACK_TEXTS, GameFeedback, NEUTRAL_FEEDBACK_INDEX, clamp_feedback_index};
pub use rules::{
    ATTACK_DAMAGE, DEFEND_DAMAGE, HEAL_AMOUNT, INITIAL_HP, INITIAL_POTIONS, MAX_HP, MOVE_HP_COST,
    VICTORY_DEPTH,
};
pub use state::{Direction, PlayerCounters};

//! Fuzzy feedback: the only window the player gets into their hidden HP.
//!
//! The contract keeps HP encrypted and instead exposes a confidential index
//! into a fixed five-entry narrative table. The index is monotonically tied
//! to HP bands on-chain, but the client treats it as an opaque 0..=4 value
//! and never derives HP from it.

use serde::Serialize;

/// Narrative table, ordered from full strength (0) to near death (4).
pub const FEEDBACK_TEXTS: [&str; 5] = [
    "You feel energetic and alert.",
    "You feel slightly tired, but still strong.",
    "Your breathing becomes heavier. Something feels off.",
    "Your vision starts to blur. Your hands tremble slightly...",
    "Darkness creeps at the edges of your vision. Every step is a struggle...",
];

/// Index substituted whenever feedback decryption fails.
///
/// Single definition site: every degraded path in the pipeline falls back to
/// this middle-of-the-road narrative rather than a scattered literal.
pub const NEUTRAL_FEEDBACK_INDEX: u8 = 2;

/// Clamp a raw decrypted value into the valid feedback range.
///
/// Decryption returns an untrusted `u64`; an out-of-range value would mean a
/// contract or decryption bug, so the client clamps instead of panicking or
/// indexing out of bounds.
pub fn clamp_feedback_index(raw: u64) -> u8 {
    raw.min(4) as u8
}

/// A decoded feedback narrative, recomputed after every action.
///
/// Purely a client artifact; never persisted on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameFeedback {
    pub text: &'static str,
    pub index: u8,
}

impl GameFeedback {
    /// Build feedback from a raw decrypted index, clamping into `[0, 4]`.
    pub fn from_raw_index(raw: u64) -> Self {
        let index = clamp_feedback_index(raw);
        Self {
            text: FEEDBACK_TEXTS[index as usize],
            index,
        }
    }

    /// The fallback narrative shown when decryption is unavailable.
    pub fn neutral() -> Self {
        Self::from_raw_index(NEUTRAL_FEEDBACK_INDEX as u64)
    }
}

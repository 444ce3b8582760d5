//! Game-over / victory detection.
//!
//! A pure function of freshly decrypted HP and freshly read counters,
//! invoked after every HP refresh. The pipeline owns the phase transitions;
//! this module only decides whether one is due.

use game_core::PlayerCounters;

use crate::state::{GamePhase, TerminalEvent};

/// Decide whether a terminal transition is due.
///
/// Returns `None` while HP is unknown (locked) unless the victory flag is
/// set: death can only be concluded from an actual decrypted zero, never
/// from a failed decryption. Once the phase is already terminal, further
/// refreshes are no-ops, which makes duplicate HP=0 reads harmless.
pub fn evaluate(
    hp: Option<u64>,
    counters: &PlayerCounters,
    phase: GamePhase,
) -> Option<TerminalEvent> {
    if phase != GamePhase::Active {
        return None;
    }
    if hp == Some(0) {
        return Some(TerminalEvent::Died);
    }
    if counters.has_won {
        return Some(TerminalEvent::Won);
    }
    None
}

//! Local mirror of on-chain state, with explicit finite-state phases.
//!
//! The one-shot flags of a naive client (is-initialized, is-game-over,
//! has-submitted-history) are modeled here as two small state machines
//! transitioned only by named events, with the pipeline as their single
//! writer.

use game_core::PlayerCounters;

/// Client-side mirror of the player's on-chain state.
///
/// Rebuilt after every successful on-chain read. Optional fields stay `None`
/// until their decryption (or read) succeeds, which the UI renders as a
/// locked 🔒 value, distinct from a known zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameStateView {
    pub has_player: bool,
    pub position: u32,
    pub current_room: u32,
    pub potion_count: Option<u8>,
    pub max_depth_reached: Option<u32>,
    pub rooms_explored: Option<u32>,
    pub has_won: Option<bool>,
}

impl GameStateView {
    /// Assemble a view from freshly read counters and an optional decrypted
    /// potion count.
    pub fn from_counters(counters: &PlayerCounters, potion_count: Option<u8>) -> Self {
        Self {
            has_player: true,
            position: counters.position,
            current_room: counters.current_room,
            potion_count,
            max_depth_reached: Some(counters.max_depth_reached),
            rooms_explored: Some(counters.rooms_explored),
            has_won: Some(counters.has_won),
        }
    }
}

/// Lifecycle of one play session.
///
/// `Uninitialized → Active → (GameOver | Victory)`; `Active` is re-entrant
/// across in-game actions, the terminal states are mutually exclusive and
/// entered exactly once. Only [`TerminalEvent`]s and an explicit reset move
/// the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Uninitialized,
    Active,
    GameOver,
    Victory,
}

impl GamePhase {
    /// Whether the player may still take in-game actions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// One-shot history submission state, re-armed only by a game reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPhase {
    /// No record submitted for the current game.
    Idle,
    /// A record was durably submitted; further triggers are no-ops.
    Submitted,
}

/// Terminal condition detected from freshly decrypted HP and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Decrypted HP reached 0.
    Died,
    /// The contract reported the victory flag.
    Won,
}

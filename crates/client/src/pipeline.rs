//! The encrypted-action pipeline.
//!
//! One instance per player session. Every operation follows the same
//! three-phase shape:
//!
//! 1. **mutate**: submit the state-changing transaction (building an
//!    encrypted input first if the action carries a secret parameter);
//! 2. **re-authorize + read**: wait for durable inclusion, then fetch the
//!    ciphertext handles the mutation just authorized, plus the plaintext
//!    counters;
//! 3. **decrypt + reconcile**: decrypt with the cached signature, clamp,
//!    rebuild the local mirror, and evaluate the terminal detector.
//!
//! Decryption of a post-action handle is only permitted once the contract
//! has authorized the caller for that specific handle value, which happens
//! as a side effect of the mutating call; the inclusion wait in phase 2 is
//! therefore a hard ordering barrier, never an optimization.

use std::sync::Arc;

use fhevm::{Address, CiphertextHandle, DecryptRequest, EncryptedInput, EncryptedInputBuilder};
use game_core::{
    Direction, GameFeedback, HEAL_AMOUNT, INITIAL_HP, INITIAL_POTIONS, PlayerCounters,
};
use rand::Rng;

use crate::error::ActionError;
use crate::session::{SessionContext, SessionSnapshot};
use crate::state::{GamePhase, GameStateView, HistoryPhase, TerminalEvent};
use crate::terminal;

/// Per-player orchestrator and single writer of the local game state.
pub struct ActionPipeline {
    ctx: Arc<SessionContext>,
    phase: GamePhase,
    history_phase: HistoryPhase,
    state: Option<GameStateView>,
    last_feedback: Option<GameFeedback>,
    last_error: Option<String>,
}

impl ActionPipeline {
    pub fn new(ctx: Arc<SessionContext>) -> Self {
        Self {
            ctx,
            phase: GamePhase::Uninitialized,
            history_phase: HistoryPhase::Idle,
            state: None,
            last_feedback: None,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn history_phase(&self) -> HistoryPhase {
        self.history_phase
    }

    pub fn state(&self) -> Option<&GameStateView> {
        self.state.as_ref()
    }

    pub fn last_feedback(&self) -> Option<&GameFeedback> {
        self.last_feedback.as_ref()
    }

    /// The current user-facing error, overwritten by each attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Create the player if absent, then derive the initial local state.
    ///
    /// Idempotent: a no-op once the session left `Uninitialized`.
    pub async fn initialize(&mut self) -> Result<(), ActionError> {
        if self.phase != GamePhase::Uninitialized {
            tracing::debug!(phase = ?self.phase, "initialize skipped, already done");
            return Ok(());
        }

        self.last_error = None;
        let result = self.initialize_inner().await;
        self.note_outcome("initialize", result)
    }

    async fn initialize_inner(&mut self) -> Result<(), ActionError> {
        let snapshot = self.ctx.snapshot();
        let player = self.ctx.player();
        let survival = Arc::clone(self.ctx.survival());

        if !survival.has_player(player).await? {
            let enc_hp = self.encrypt_u8(survival.address(), INITIAL_HP).await?;
            let enc_potions = self.encrypt_u8(survival.address(), INITIAL_POTIONS).await?;
            let tx = survival.create_player(player, enc_hp, enc_potions).await?;
            survival.wait_for_inclusion(&tx).await?;
            tracing::info!(%player, %tx, "player created");
        }

        let counters = self.read_counters().await?;
        let hp = self.refresh_hp().await;
        let potion_count = self.refresh_potion_count().await;

        // A fresh player starts at full strength, so the init-time decrypt
        // failure default is index 0, not the mid-game neutral.
        let feedback = self
            .decrypt_feedback()
            .await
            .unwrap_or_else(|| GameFeedback::from_raw_index(0));

        if !self.ctx.is_current(&snapshot) {
            return Err(ActionError::StaleSession);
        }

        self.state = Some(GameStateView::from_counters(&counters, potion_count));
        self.last_feedback = Some(feedback);
        self.phase = GamePhase::Active;
        tracing::info!(%player, room = counters.current_room, "game initialized");

        self.apply_terminal(hp, &counters).await;
        Ok(())
    }

    /// Move in a direction; the contract charges a fixed HP cost.
    pub async fn move_to(&mut self, direction: Direction) -> Result<GameFeedback, ActionError> {
        self.last_error = None;
        let snapshot = self.ctx.snapshot();
        let result = async {
            let tx = self
                .ctx
                .survival()
                .submit_move(self.ctx.player(), direction)
                .await?;
            self.ctx.survival().wait_for_inclusion(&tx).await?;
            self.finish_action(snapshot).await
        }
        .await;
        self.note_outcome("move", result)
    }

    /// Attack the current room's encounter (random loss in the attack band).
    pub async fn attack(&mut self) -> Result<GameFeedback, ActionError> {
        self.last_error = None;
        let snapshot = self.ctx.snapshot();
        let result = async {
            let tx = self.ctx.survival().submit_attack(self.ctx.player()).await?;
            self.ctx.survival().wait_for_inclusion(&tx).await?;
            self.finish_action(snapshot).await
        }
        .await;
        self.note_outcome("attack", result)
    }

    /// Defend (reduced random loss).
    pub async fn defend(&mut self) -> Result<GameFeedback, ActionError> {
        self.last_error = None;
        let snapshot = self.ctx.snapshot();
        let result = async {
            let tx = self.ctx.survival().submit_defend(self.ctx.player()).await?;
            self.ctx.survival().wait_for_inclusion(&tx).await?;
            self.finish_action(snapshot).await
        }
        .await;
        self.note_outcome("defend", result)
    }

    /// Drink a potion: sample a heal amount locally, submit it encrypted.
    pub async fn use_potion(&mut self) -> Result<GameFeedback, ActionError> {
        self.last_error = None;
        let snapshot = self.ctx.snapshot();
        let result = async {
            let heal = rand::thread_rng().gen_range(HEAL_AMOUNT);
            let survival_address = self.ctx.survival().address();
            let enc_heal = self.encrypt_u8(survival_address, heal).await?;

            let tx = self
                .ctx
                .survival()
                .use_potion(self.ctx.player(), enc_heal)
                .await?;
            self.ctx.survival().wait_for_inclusion(&tx).await?;
            self.finish_action(snapshot).await
        }
        .await;
        self.note_outcome("use potion", result)
    }

    /// Restart an existing player with fresh encrypted initial state.
    ///
    /// A no-op (leaving local state untouched) when no player exists. Clears
    /// every terminal flag and re-arms the one-shot history submission, then
    /// rebuilds state from direct reads without the feedback authorization
    /// dance.
    pub async fn reset(&mut self) -> Result<(), ActionError> {
        self.last_error = None;
        let result = self.reset_inner().await;
        self.note_outcome("reset", result)
    }

    async fn reset_inner(&mut self) -> Result<(), ActionError> {
        let snapshot = self.ctx.snapshot();
        let player = self.ctx.player();
        let survival = Arc::clone(self.ctx.survival());

        if !survival.has_player(player).await? {
            tracing::warn!(%player, "reset skipped: player does not exist");
            return Ok(());
        }

        let enc_hp = self.encrypt_u8(survival.address(), INITIAL_HP).await?;
        let enc_potions = self.encrypt_u8(survival.address(), INITIAL_POTIONS).await?;
        let tx = survival.reset_player(player, enc_hp, enc_potions).await?;
        survival.wait_for_inclusion(&tx).await?;

        if !self.ctx.is_current(&snapshot) {
            return Err(ActionError::StaleSession);
        }

        // GameReset: back to a clean slate before re-deriving state.
        self.phase = GamePhase::Uninitialized;
        self.history_phase = HistoryPhase::Idle;
        self.state = None;
        self.last_feedback = None;
        tracing::info!(%player, "player reset");

        let counters = self.read_counters().await?;
        self.refresh_hp().await;
        let potion_count = self.refresh_potion_count().await;

        if !self.ctx.is_current(&snapshot) {
            return Err(ActionError::StaleSession);
        }

        self.state = Some(GameStateView::from_counters(&counters, potion_count));
        self.phase = GamePhase::Active;
        Ok(())
    }

    /// Submit the one-time confidential summary of a completed game.
    ///
    /// Guarded by the one-shot [`HistoryPhase`], which is set only after a
    /// successful submission and re-armed by [`reset`](Self::reset). The
    /// final HP and potion count are re-encrypted for the history contract;
    /// decrypting the current potion count needs a gameplay-scoped
    /// signature, while the record itself is addressed to the history
    /// contract's separate authorization scope.
    pub async fn submit_history(
        &mut self,
        final_hp: u64,
        rooms_explored: u32,
        final_position: u32,
    ) -> Result<(), ActionError> {
        if self.history_phase == HistoryPhase::Submitted {
            tracing::debug!("history already submitted for this game, skipping");
            return Ok(());
        }

        let player = self.ctx.player();
        let history = Arc::clone(self.ctx.history());
        if history.address().is_zero() {
            return Err(ActionError::Unavailable(
                "history contract not deployed on this chain".into(),
            ));
        }

        let Some(final_potions) = self.refresh_potion_count().await else {
            return Err(ActionError::Unavailable(
                "final potion count is locked, cannot build record".into(),
            ));
        };

        let enc_hp = self
            .encrypt_u8(history.address(), final_hp.min(255) as u8)
            .await?;
        let enc_potions = self.encrypt_u8(history.address(), final_potions).await?;

        tracing::info!(
            %player,
            final_hp,
            final_potions,
            rooms_explored,
            final_position,
            "submitting game record"
        );
        let tx = history
            .submit_game_record(player, enc_hp, enc_potions, rooms_explored, final_position)
            .await?;
        history.wait_for_inclusion(&tx).await?;

        // HistorySubmitted: only a durably included record arms the guard.
        self.history_phase = HistoryPhase::Submitted;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared read / decrypt / reconcile tail
    // ------------------------------------------------------------------

    /// Phases 2 and 3, shared by every post-mutation path.
    async fn finish_action(
        &mut self,
        snapshot: SessionSnapshot,
    ) -> Result<GameFeedback, ActionError> {
        let feedback = self.decrypt_feedback().await.unwrap_or_else(|| {
            tracing::warn!("feedback decryption unavailable, using neutral fallback");
            GameFeedback::neutral()
        });

        let counters = self.read_counters().await?;
        let potion_count = self.refresh_potion_count().await;

        // HP is re-fetched and logged regardless of feedback-decrypt success.
        let hp = self.refresh_hp().await;

        if !self.ctx.is_current(&snapshot) {
            return Err(ActionError::StaleSession);
        }

        self.state = Some(GameStateView::from_counters(&counters, potion_count));
        self.last_feedback = Some(feedback.clone());

        self.apply_terminal(hp, &counters).await;
        Ok(feedback)
    }

    /// Run the terminal detector and apply at most one transition.
    ///
    /// The history snapshot (HP, rooms, position) is captured from the
    /// values decoded in this very refresh, not from state that a later
    /// operation might have overwritten.
    async fn apply_terminal(&mut self, hp: Option<u64>, counters: &PlayerCounters) {
        let Some(event) = terminal::evaluate(hp, counters, self.phase) else {
            return;
        };

        match event {
            TerminalEvent::Died => {
                self.phase = GamePhase::GameOver;
                tracing::info!("HP reached 0, game over");
                if let Err(err) = self
                    .submit_history(0, counters.rooms_explored, counters.position)
                    .await
                {
                    tracing::warn!(%err, "failed to submit game-over record");
                }
            }
            TerminalEvent::Won => {
                self.phase = GamePhase::Victory;
                tracing::info!(
                    depth = counters.max_depth_reached,
                    rooms = counters.rooms_explored,
                    "victory"
                );
                match hp {
                    Some(final_hp) => {
                        if let Err(err) = self
                            .submit_history(final_hp, counters.rooms_explored, counters.position)
                            .await
                        {
                            tracing::warn!(%err, "failed to submit victory record");
                        }
                    }
                    None => {
                        tracing::warn!("final HP is locked, victory record not submitted");
                    }
                }
            }
        }
    }

    /// Read the full plaintext counter set in one pass.
    async fn read_counters(&self) -> Result<PlayerCounters, ActionError> {
        let survival = self.ctx.survival();
        let player = self.ctx.player();
        Ok(PlayerCounters {
            position: survival.position(player).await?,
            current_room: survival.current_room(player).await?,
            max_depth_reached: survival.max_depth_reached(player).await?,
            rooms_explored: survival.rooms_explored(player).await?,
            has_won: survival.has_won(player).await?,
        })
    }

    /// Always-attempted HP refresh: fetch, decrypt, log. Never fails the
    /// surrounding action; `None` means "locked".
    pub async fn refresh_hp(&self) -> Option<u64> {
        let handle = match self.ctx.survival().hp_handle(self.ctx.player()).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(%err, "failed to fetch HP handle");
                return None;
            }
        };

        let hp = self.try_decrypt_gameplay(handle).await?;
        tracing::info!(hp, "current HP");
        Some(hp)
    }

    /// Best-effort potion count refresh; `None` means "locked".
    pub async fn refresh_potion_count(&self) -> Option<u8> {
        let handle = match self
            .ctx
            .survival()
            .potion_count_handle(self.ctx.player())
            .await
        {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(%err, "failed to fetch potion count handle");
                return None;
            }
        };

        self.try_decrypt_gameplay(handle)
            .await
            .map(|count| count.min(255) as u8)
    }

    async fn decrypt_feedback(&self) -> Option<GameFeedback> {
        let handle = match self
            .ctx
            .survival()
            .feedback_index_handle(self.ctx.player())
            .await
        {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(%err, "failed to fetch feedback handle");
                return None;
            }
        };

        let raw = self.try_decrypt_gameplay(handle).await?;
        let feedback = GameFeedback::from_raw_index(raw);
        tracing::debug!(index = feedback.index, "decrypted feedback");
        Some(feedback)
    }

    /// Decrypt one gameplay-scoped handle, degrading to `None` on any
    /// failure (zero handle, rejected signature, authorization, decode).
    async fn try_decrypt_gameplay(&self, handle: CiphertextHandle) -> Option<u64> {
        if handle.is_zero() {
            return None;
        }
        let contract = self.ctx.survival().address();

        let signature = match self
            .ctx
            .signatures()
            .load_or_sign(&[contract], self.ctx.signer())
            .await
        {
            Ok(signature) => signature,
            Err(err) => {
                tracing::warn!(%err, "decryption signature unavailable");
                return None;
            }
        };

        let results = match self
            .ctx
            .gateway()
            .user_decrypt(&[DecryptRequest { handle, contract }], &signature)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(%err, %handle, "user decryption failed");
                return None;
            }
        };

        results.get(&handle).copied()
    }

    async fn encrypt_u8(
        &self,
        contract: Address,
        value: u8,
    ) -> Result<EncryptedInput, ActionError> {
        let input = EncryptedInputBuilder::new(
            Arc::clone(self.ctx.gateway()),
            contract,
            self.ctx.player(),
        )
        .add8(value)
        .encrypt()
        .await?;
        Ok(input)
    }

    /// Record the outcome: stale sessions are discarded silently, anything
    /// else lands in the single current-error slot.
    fn note_outcome<T>(
        &mut self,
        label: &str,
        result: Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        if let Err(err) = &result {
            match err {
                ActionError::StaleSession => {
                    tracing::debug!(label, "stale session, result discarded");
                }
                _ => {
                    tracing::error!(label, %err, "action failed");
                    self.last_error = Some(format!("{label} failed: {err}"));
                }
            }
        }
        result
    }
}

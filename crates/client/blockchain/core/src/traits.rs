//! Contract surface traits.
//!
//! Both surfaces follow the two-phase mutation protocol: every state-changing
//! method returns a [`TxId`] only, and `wait_for_inclusion` is the sole way
//! to learn that its effects (including freshly authorized ciphertext
//! handles) are durably visible.

use async_trait::async_trait;
use fhevm::{Address, CiphertextHandle, EncryptedInput};
use game_core::Direction;

use crate::types::{GameRecord, TxId, TxReceipt};

/// Errors surfaced by the contract layer.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// Contract has no deployment (zero address) on the current chain.
    #[error("contract not deployed on this chain")]
    NotDeployed,

    /// On-chain execution reverted (e.g. duplicate player creation).
    #[error("contract reverted: {0}")]
    Reverted(String),

    /// The confidential input or its proof was rejected.
    #[error("invalid encrypted input: {0}")]
    InvalidInput(String),

    /// Transport-level failure reaching the ledger.
    #[error("network error: {0}")]
    Network(String),
}

/// Gameplay contract: encrypted player state plus plaintext exploration
/// counters.
///
/// Reads returning a [`CiphertextHandle`] yield [`CiphertextHandle::ZERO`]
/// when the value is unset; callers must treat zero as "absent", never
/// attempt decryption of it.
#[async_trait]
pub trait SurvivalContract: Send + Sync {
    /// Address the contract is bound to (used for decryption scoping).
    fn address(&self) -> Address;

    // ------------------------------------------------------------------
    // Mutations (phase 1): submit and receive a TxId
    // ------------------------------------------------------------------

    /// Create a player with encrypted initial HP and potion count.
    /// Reverts if the caller already has a player.
    async fn create_player(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
    ) -> Result<TxId, ContractError>;

    /// Move in a direction; costs a fixed amount of HP on-chain.
    async fn submit_move(&self, from: Address, direction: Direction) -> Result<TxId, ContractError>;

    /// Attack the room's encounter; the contract rolls damage in its band.
    async fn submit_attack(&self, from: Address) -> Result<TxId, ContractError>;

    /// Defend; reduced damage band.
    async fn submit_defend(&self, from: Address) -> Result<TxId, ContractError>;

    /// Consume a potion, healing by the encrypted amount (clamped on-chain).
    async fn use_potion(
        &self,
        from: Address,
        enc_heal: EncryptedInput,
    ) -> Result<TxId, ContractError>;

    /// Reassign fresh encrypted initial state to an existing player.
    /// Reverts if the caller has no player.
    async fn reset_player(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
    ) -> Result<TxId, ContractError>;

    // ------------------------------------------------------------------
    // Phase 2: inclusion barrier
    // ------------------------------------------------------------------

    /// Wait until the transaction is durably included.
    ///
    /// Handle authorizations emitted by the mutation become effective only
    /// at this point; decrypting a post-mutation handle before this call
    /// returns is a protocol violation and will fail authorization.
    async fn wait_for_inclusion(&self, tx: &TxId) -> Result<TxReceipt, ContractError>;

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    async fn has_player(&self, player: Address) -> Result<bool, ContractError>;
    async fn hp_handle(&self, player: Address) -> Result<CiphertextHandle, ContractError>;
    async fn potion_count_handle(&self, player: Address)
    -> Result<CiphertextHandle, ContractError>;
    async fn position(&self, player: Address) -> Result<u32, ContractError>;
    async fn current_room(&self, player: Address) -> Result<u32, ContractError>;
    async fn max_depth_reached(&self, player: Address) -> Result<u32, ContractError>;
    async fn rooms_explored(&self, player: Address) -> Result<u32, ContractError>;
    async fn has_won(&self, player: Address) -> Result<bool, ContractError>;

    /// Handle of the confidential feedback index for the player's last
    /// action. Only valid post-inclusion of that action's transaction.
    async fn feedback_index_handle(
        &self,
        player: Address,
    ) -> Result<CiphertextHandle, ContractError>;
}

/// History contract: append-only confidential game summaries.
#[async_trait]
pub trait HistoryContract: Send + Sync {
    fn address(&self) -> Address;

    /// Append a game record; final HP and potion count arrive re-encrypted
    /// for this contract, the exploration counters in plaintext.
    async fn submit_game_record(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
        rooms_explored: u32,
        final_position: u32,
    ) -> Result<TxId, ContractError>;

    /// Wait until the transaction is durably included.
    async fn wait_for_inclusion(&self, tx: &TxId) -> Result<TxReceipt, ContractError>;

    async fn game_count(&self, player: Address) -> Result<u64, ContractError>;

    async fn game_record(&self, player: Address, index: u64) -> Result<GameRecord, ContractError>;
}

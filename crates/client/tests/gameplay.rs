//! End-to-end pipeline scenarios over the mock world.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use client_blockchain_core::{
    ContractError, MockSurvivalContract, SurvivalContract, TxId, TxReceipt,
};
use dungeon_client::{ActionError, ActionPipeline, GamePhase, HistoryPhase, SessionContext};
use fhevm::{Address, CiphertextHandle, DecryptRequest, EncryptedInput, FhevmGateway};
use game_core::{Direction, NEUTRAL_FEEDBACK_INDEX};

use common::TestWorld;

#[tokio::test]
async fn initialize_creates_player_with_initial_stats() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();

    pipeline.initialize().await.unwrap();

    assert_eq!(pipeline.phase(), GamePhase::Active);
    let state = pipeline.state().unwrap();
    assert!(state.has_player);
    assert_eq!(state.current_room, 1);
    assert_eq!(state.potion_count, Some(3));
    assert_eq!(state.has_won, Some(false));

    // Full HP decrypts to 100 and maps to the strongest narrative.
    assert_eq!(pipeline.refresh_hp().await, Some(100));
    assert_eq!(pipeline.last_feedback().unwrap().index, 0);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();

    pipeline.initialize().await.unwrap();
    let state_before = pipeline.state().cloned();

    // A second call is a no-op, not a duplicate createPlayer revert.
    pipeline.initialize().await.unwrap();
    assert_eq!(pipeline.state().cloned(), state_before);
    assert!(pipeline.last_error().is_none());
}

#[tokio::test]
async fn move_consumes_hp_and_refreshes_counters() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();

    let feedback = pipeline.move_to(Direction::Forward).await.unwrap();
    assert!(feedback.index <= 4);

    let state = pipeline.state().unwrap();
    assert_eq!(state.current_room, 2);
    assert_eq!(state.rooms_explored, Some(2));
    assert_eq!(pipeline.refresh_hp().await, Some(95));
}

#[tokio::test]
async fn attack_and_defend_stay_in_their_damage_bands() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();

    pipeline.attack().await.unwrap();
    let hp = pipeline.refresh_hp().await.unwrap();
    assert!((80..=90).contains(&hp), "attack from 100 left hp {hp}");

    pipeline.defend().await.unwrap();
    let hp_after = pipeline.refresh_hp().await.unwrap();
    assert!(
        (hp - 10..=hp - 5).contains(&hp_after),
        "defend from {hp} left hp {hp_after}"
    );
}

#[tokio::test]
async fn hp_never_leaves_valid_range_under_repeated_actions() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();

    for _ in 0..12 {
        pipeline.attack().await.unwrap();
        if let Some(hp) = pipeline.refresh_hp().await {
            assert!(hp <= 100, "hp {hp} out of range");
        }
        if pipeline.phase() == GamePhase::GameOver {
            break;
        }
    }
    assert_eq!(pipeline.phase(), GamePhase::GameOver);
}

#[tokio::test]
async fn potion_heals_clamped_at_max_hp() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();
    world.survival.set_hp(world.player, 95);

    pipeline.use_potion().await.unwrap();

    // Any heal in [20, 40] from 95 clamps at 100.
    assert_eq!(pipeline.refresh_hp().await, Some(100));
    assert_eq!(pipeline.state().unwrap().potion_count, Some(2));
}

#[tokio::test]
async fn death_flips_game_over_and_submits_exactly_one_record() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();
    world.survival.set_hp(world.player, 3);

    pipeline.move_to(Direction::Forward).await.unwrap();

    assert_eq!(pipeline.phase(), GamePhase::GameOver);
    assert_eq!(pipeline.history_phase(), HistoryPhase::Submitted);
    assert_eq!(world.history.total_submissions(), 1);

    // A duplicate HP=0 refresh path adds nothing: the phase is terminal.
    pipeline.attack().await.unwrap();
    assert_eq!(world.history.total_submissions(), 1);

    let mut entries = world.browser().load_records().await.unwrap();
    assert_eq!(entries.len(), 1);
    world.browser().decrypt_entry(&mut entries[0]).await.unwrap();
    assert_eq!(entries[0].final_hp, Some(0));
}

#[tokio::test]
async fn victory_flag_flips_phase_and_records_final_hp() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();
    world.survival.force_win(world.player);

    pipeline.move_to(Direction::Forward).await.unwrap();

    assert_eq!(pipeline.phase(), GamePhase::Victory);
    assert_eq!(world.history.total_submissions(), 1);

    let mut entries = world.browser().load_records().await.unwrap();
    world.browser().decrypt_entry(&mut entries[0]).await.unwrap();
    assert_eq!(entries[0].final_hp, Some(95));
}

#[tokio::test]
async fn reset_rearms_history_and_restores_initial_state() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();
    world.survival.set_hp(world.player, 3);
    pipeline.move_to(Direction::Forward).await.unwrap();
    assert_eq!(pipeline.phase(), GamePhase::GameOver);

    pipeline.reset().await.unwrap();

    assert_eq!(pipeline.phase(), GamePhase::Active);
    assert_eq!(pipeline.history_phase(), HistoryPhase::Idle);
    assert_eq!(pipeline.refresh_hp().await, Some(100));
    assert_eq!(pipeline.state().unwrap().potion_count, Some(3));
    assert!(pipeline.last_feedback().is_none());

    // Dying again after the reset produces a second, independent record.
    world.survival.set_hp(world.player, 3);
    pipeline.move_to(Direction::Forward).await.unwrap();
    assert_eq!(world.history.total_submissions(), 2);
}

#[tokio::test]
async fn reset_without_player_is_a_noop() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();

    pipeline.reset().await.unwrap();

    assert_eq!(pipeline.phase(), GamePhase::Uninitialized);
    assert!(pipeline.state().is_none());
    assert!(pipeline.last_error().is_none());
}

#[tokio::test]
async fn gameplay_decrypts_share_one_signing_prompt() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();

    pipeline.initialize().await.unwrap();
    pipeline.move_to(Direction::Forward).await.unwrap();
    pipeline.attack().await.unwrap();
    pipeline.refresh_hp().await.unwrap();

    // Every decrypt so far is gameplay-scoped: one prompt total.
    assert_eq!(world.signer.prompt_count(), 1);
}

#[tokio::test]
async fn signer_rejection_degrades_to_locked_fields() {
    let world = TestWorld::new();
    world.signer.set_reject(true);
    let mut pipeline = world.pipeline();

    pipeline.initialize().await.unwrap();

    // Counters commit; confidential fields stay locked.
    let state = pipeline.state().unwrap();
    assert!(state.has_player);
    assert_eq!(state.potion_count, None);
    assert_eq!(pipeline.refresh_hp().await, None);

    let feedback = pipeline.move_to(Direction::Forward).await.unwrap();
    assert_eq!(feedback.index, NEUTRAL_FEEDBACK_INDEX);
    assert_eq!(pipeline.state().unwrap().current_room, 2);
}

#[tokio::test]
async fn duplicate_player_creation_surfaces_contract_revert() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();

    // Bypass the pipeline's has_player check to force the revert path.
    let enc_hp = world
        .copro
        .encrypt(common::SURVIVAL_ADDRESS, world.player, &[100])
        .await
        .unwrap();
    let enc_potions = world
        .copro
        .encrypt(common::SURVIVAL_ADDRESS, world.player, &[3])
        .await
        .unwrap();
    let err = world
        .survival
        .create_player(world.player, enc_hp, enc_potions)
        .await
        .unwrap_err();
    assert!(matches!(err, ContractError::Reverted(_)));
}

#[tokio::test]
async fn decrypting_before_inclusion_fails_authorization() {
    let world = TestWorld::new();
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();

    // Submit a mutation but do not wait for inclusion.
    let tx = world
        .survival
        .submit_move(world.player, Direction::Forward)
        .await
        .unwrap();

    let handle = world.survival.hp_handle(world.player).await.unwrap();
    let signature = world
        .ctx
        .signatures()
        .load_or_sign(&[common::SURVIVAL_ADDRESS], world.ctx.signer())
        .await
        .unwrap();
    let request = [DecryptRequest {
        handle,
        contract: common::SURVIVAL_ADDRESS,
    }];

    // The fresh handle's grant is not yet effective.
    assert!(world.copro.user_decrypt(&request, &signature).await.is_err());

    world.survival.wait_for_inclusion(&tx).await.unwrap();
    let results = world.copro.user_decrypt(&request, &signature).await.unwrap();
    assert_eq!(results[&handle], 95);
}

// ---------------------------------------------------------------------------
// Stale-session guard
// ---------------------------------------------------------------------------

/// Delegating contract that invalidates the session during the inclusion
/// wait, simulating a chain/signer switch mid-action.
struct SwitchDuringInclusion {
    inner: Arc<MockSurvivalContract>,
    ctx: std::sync::Mutex<Option<Arc<SessionContext>>>,
    armed: AtomicBool,
}

impl SwitchDuringInclusion {
    fn new(inner: Arc<MockSurvivalContract>) -> Self {
        Self {
            inner,
            ctx: std::sync::Mutex::new(None),
            armed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SurvivalContract for SwitchDuringInclusion {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn create_player(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
    ) -> Result<TxId, ContractError> {
        self.inner.create_player(from, enc_hp, enc_potions).await
    }

    async fn submit_move(&self, from: Address, direction: Direction) -> Result<TxId, ContractError> {
        self.inner.submit_move(from, direction).await
    }

    async fn submit_attack(&self, from: Address) -> Result<TxId, ContractError> {
        self.inner.submit_attack(from).await
    }

    async fn submit_defend(&self, from: Address) -> Result<TxId, ContractError> {
        self.inner.submit_defend(from).await
    }

    async fn use_potion(
        &self,
        from: Address,
        enc_heal: EncryptedInput,
    ) -> Result<TxId, ContractError> {
        self.inner.use_potion(from, enc_heal).await
    }

    async fn reset_player(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
    ) -> Result<TxId, ContractError> {
        self.inner.reset_player(from, enc_hp, enc_potions).await
    }

    async fn wait_for_inclusion(&self, tx: &TxId) -> Result<TxReceipt, ContractError> {
        let receipt = self.inner.wait_for_inclusion(tx).await?;
        if self.armed.load(Ordering::SeqCst) {
            if let Some(ctx) = self.ctx.lock().unwrap().as_ref() {
                ctx.invalidate();
            }
        }
        Ok(receipt)
    }

    async fn has_player(&self, player: Address) -> Result<bool, ContractError> {
        self.inner.has_player(player).await
    }

    async fn hp_handle(&self, player: Address) -> Result<CiphertextHandle, ContractError> {
        self.inner.hp_handle(player).await
    }

    async fn potion_count_handle(
        &self,
        player: Address,
    ) -> Result<CiphertextHandle, ContractError> {
        self.inner.potion_count_handle(player).await
    }

    async fn position(&self, player: Address) -> Result<u32, ContractError> {
        self.inner.position(player).await
    }

    async fn current_room(&self, player: Address) -> Result<u32, ContractError> {
        self.inner.current_room(player).await
    }

    async fn max_depth_reached(&self, player: Address) -> Result<u32, ContractError> {
        self.inner.max_depth_reached(player).await
    }

    async fn rooms_explored(&self, player: Address) -> Result<u32, ContractError> {
        self.inner.rooms_explored(player).await
    }

    async fn has_won(&self, player: Address) -> Result<bool, ContractError> {
        self.inner.has_won(player).await
    }

    async fn feedback_index_handle(
        &self,
        player: Address,
    ) -> Result<CiphertextHandle, ContractError> {
        self.inner.feedback_index_handle(player).await
    }
}

#[tokio::test]
async fn chain_switch_mid_action_discards_results_silently() {
    use fhevm::mock::MockCoprocessor;
    use fhevm::{ChainId, SignatureCache};

    let player = Address::from_low_u64(1);
    let copro = Arc::new(MockCoprocessor::new());
    let survival = Arc::new(MockSurvivalContract::new(
        common::SURVIVAL_ADDRESS,
        copro.clone(),
    ));
    let switching = Arc::new(SwitchDuringInclusion::new(survival.clone()));
    let history = Arc::new(client_blockchain_core::MockHistoryContract::new(
        common::HISTORY_ADDRESS,
        copro.clone(),
    ));
    let signer = Arc::new(common::TestSigner::new(player));

    let ctx = Arc::new(SessionContext::new(
        ChainId(31337),
        signer,
        copro,
        switching.clone(),
        history,
        Arc::new(SignatureCache::new()),
    ));
    *switching.ctx.lock().unwrap() = Some(ctx.clone());

    let mut pipeline = ActionPipeline::new(ctx);
    pipeline.initialize().await.unwrap();
    let state_before = pipeline.state().cloned();

    // The next inclusion wait simulates the signer/chain changing mid-flight.
    switching.armed.store(true, Ordering::SeqCst);
    let err = pipeline.move_to(Direction::Forward).await.unwrap_err();
    assert!(matches!(err, ActionError::StaleSession));

    // Discarded silently: no state write, no user-facing error string.
    assert_eq!(pipeline.state().cloned(), state_before);
    assert!(pipeline.last_error().is_none());
}

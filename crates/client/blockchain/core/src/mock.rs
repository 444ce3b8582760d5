//! In-memory contracts for testing without a network.
//!
//! `MockSurvivalContract` and `MockHistoryContract` replay the on-chain
//! rules (move cost, damage bands, HP clamping, FHE-select potion semantics,
//! fuzzy feedback bands, victory depth) over a shared
//! [`MockCoprocessor`], including the authorization subtlety the pipeline is
//! built around: handle grants emitted by a mutation become effective only at
//! `wait_for_inclusion`, so a speculative pre-inclusion decrypt fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fhevm::mock::MockCoprocessor;
use fhevm::{Address, CiphertextHandle, EncryptedInput, GatewayError};
use game_core::{
    ATTACK_DAMAGE, DEFEND_DAMAGE, Direction, MAX_HP, MOVE_HP_COST, PlayerCounters, VICTORY_DEPTH,
};
use rand::Rng;

use crate::traits::{ContractError, HistoryContract, SurvivalContract};
use crate::types::{GameRecord, TxId, TxReceipt};

/// Mock genesis timestamp; blocks advance 12 seconds apart.
const GENESIS_TIME: u64 = 1_700_000_000;
const BLOCK_INTERVAL: u64 = 12;

fn feedback_index_for_hp(hp: u64) -> u64 {
    match hp {
        80.. => 0,
        60..=79 => 1,
        40..=59 => 2,
        20..=39 => 3,
        _ => 4,
    }
}

impl From<GatewayError> for ContractError {
    fn from(err: GatewayError) -> Self {
        ContractError::InvalidInput(err.to_string())
    }
}

struct PlayerRecord {
    hp: u64,
    potions: u64,
    counters: PlayerCounters,
    hp_handle: CiphertextHandle,
    potion_handle: CiphertextHandle,
    feedback_handle: CiphertextHandle,
}

#[derive(Default)]
struct MockChain {
    next_tx: u64,
    height: u64,
    pending_grants: HashMap<TxId, Vec<(CiphertextHandle, Address)>>,
}

impl MockChain {
    fn submit(&mut self, grants: Vec<(CiphertextHandle, Address)>) -> TxId {
        let tx = TxId(self.next_tx);
        self.next_tx += 1;
        self.pending_grants.insert(tx, grants);
        tx
    }

    fn include(
        &mut self,
        tx: &TxId,
        copro: &MockCoprocessor,
        contract: Address,
    ) -> Result<TxReceipt, ContractError> {
        if tx.0 >= self.next_tx {
            return Err(ContractError::Network(format!("unknown transaction {tx}")));
        }
        if let Some(grants) = self.pending_grants.remove(tx) {
            for (handle, user) in grants {
                copro.grant(handle, contract, user);
            }
            self.height += 1;
        }
        Ok(TxReceipt {
            tx_id: *tx,
            block_height: self.height,
            block_time: GENESIS_TIME + self.height * BLOCK_INTERVAL,
        })
    }
}

struct SurvivalState {
    players: HashMap<Address, PlayerRecord>,
    chain: MockChain,
    forced_damage: Option<u8>,
}

/// In-memory gameplay contract.
pub struct MockSurvivalContract {
    address: Address,
    copro: Arc<MockCoprocessor>,
    state: Mutex<SurvivalState>,
}

impl MockSurvivalContract {
    pub fn new(address: Address, copro: Arc<MockCoprocessor>) -> Self {
        Self {
            address,
            copro,
            state: Mutex::new(SurvivalState {
                players: HashMap::new(),
                chain: MockChain::default(),
                forced_damage: None,
            }),
        }
    }

    /// Pin the next damage rolls to a fixed value for deterministic tests.
    pub fn set_forced_damage(&self, damage: Option<u8>) {
        self.state.lock().expect("mock poisoned").forced_damage = damage;
    }

    /// Test hook: overwrite a player's HP, minting and granting a fresh
    /// handle immediately (as if a prior action had set it).
    pub fn set_hp(&self, player: Address, hp: u64) {
        let mut state = self.state.lock().expect("mock poisoned");
        if let Some(record) = state.players.get_mut(&player) {
            record.hp = hp;
            record.hp_handle = self.copro.mint(hp);
            self.copro.grant(record.hp_handle, self.address, player);
        }
    }

    /// Test hook: flip the on-chain victory flag as if the depth objective
    /// had been reached.
    pub fn force_win(&self, player: Address) {
        let mut state = self.state.lock().expect("mock poisoned");
        if let Some(record) = state.players.get_mut(&player) {
            record.counters.max_depth_reached = VICTORY_DEPTH;
            record.counters.has_won = true;
        }
    }

    fn with_player<T>(
        &self,
        player: Address,
        f: impl FnOnce(&PlayerRecord) -> T,
    ) -> Result<T, ContractError> {
        let state = self.state.lock().expect("mock poisoned");
        state
            .players
            .get(&player)
            .map(f)
            .ok_or_else(|| ContractError::Reverted("player does not exist".into()))
    }

    /// Apply a damage roll, clamp HP, refresh the HP and feedback handles,
    /// and queue their grants.
    fn apply_hp_change(
        copro: &MockCoprocessor,
        record: &mut PlayerRecord,
        player: Address,
        new_hp: u64,
        grants: &mut Vec<(CiphertextHandle, Address)>,
    ) {
        record.hp = new_hp.min(u64::from(MAX_HP));
        record.hp_handle = copro.mint(record.hp);
        record.feedback_handle = copro.mint(feedback_index_for_hp(record.hp));
        grants.push((record.hp_handle, player));
        grants.push((record.feedback_handle, player));
    }

    fn roll_damage(forced: Option<u8>, band: std::ops::RangeInclusive<u8>) -> u64 {
        match forced {
            Some(dmg) => u64::from(dmg),
            None => u64::from(rand::thread_rng().gen_range(band)),
        }
    }
}

#[async_trait]
impl SurvivalContract for MockSurvivalContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn create_player(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
    ) -> Result<TxId, ContractError> {
        let hp_values = self.copro.redeem_proof(&enc_hp, self.address, from)?;
        let potion_values = self.copro.redeem_proof(&enc_potions, self.address, from)?;

        let mut state = self.state.lock().expect("mock poisoned");
        if state.players.contains_key(&from) {
            return Err(ContractError::Reverted("player already exists".into()));
        }

        let hp = hp_values[0].min(u64::from(MAX_HP));
        let potions = potion_values[0];

        let record = PlayerRecord {
            hp,
            potions,
            counters: PlayerCounters {
                position: 0,
                current_room: 1,
                max_depth_reached: 1,
                rooms_explored: 1,
                has_won: false,
            },
            hp_handle: self.copro.mint(hp),
            potion_handle: self.copro.mint(potions),
            feedback_handle: self.copro.mint(feedback_index_for_hp(hp)),
        };

        let grants = vec![
            (record.hp_handle, from),
            (record.potion_handle, from),
            (record.feedback_handle, from),
        ];
        state.players.insert(from, record);
        Ok(state.chain.submit(grants))
    }

    async fn submit_move(
        &self,
        from: Address,
        direction: Direction,
    ) -> Result<TxId, ContractError> {
        let mut state = self.state.lock().expect("mock poisoned");
        let state = &mut *state;
        let record = state
            .players
            .get_mut(&from)
            .ok_or_else(|| ContractError::Reverted("player does not exist".into()))?;

        match direction {
            Direction::Forward => {
                record.counters.current_room += 1;
                record.counters.max_depth_reached = record
                    .counters
                    .max_depth_reached
                    .max(record.counters.current_room);
            }
            Direction::Back => {
                record.counters.current_room = record.counters.current_room.saturating_sub(1).max(1);
            }
            Direction::Left => {
                record.counters.position = record.counters.position.saturating_sub(1);
            }
            Direction::Right => {
                record.counters.position += 1;
            }
        }
        record.counters.rooms_explored += 1;
        if record.counters.max_depth_reached >= VICTORY_DEPTH {
            record.counters.has_won = true;
        }

        let mut grants = Vec::new();
        let new_hp = record.hp.saturating_sub(u64::from(MOVE_HP_COST));
        Self::apply_hp_change(&self.copro, record, from, new_hp, &mut grants);

        Ok(state.chain.submit(grants))
    }

    async fn submit_attack(&self, from: Address) -> Result<TxId, ContractError> {
        let mut state = self.state.lock().expect("mock poisoned");
        let forced = state.forced_damage;
        let state = &mut *state;
        let record = state
            .players
            .get_mut(&from)
            .ok_or_else(|| ContractError::Reverted("player does not exist".into()))?;

        let damage = Self::roll_damage(forced, ATTACK_DAMAGE);
        let mut grants = Vec::new();
        let new_hp = record.hp.saturating_sub(damage);
        Self::apply_hp_change(&self.copro, record, from, new_hp, &mut grants);

        Ok(state.chain.submit(grants))
    }

    async fn submit_defend(&self, from: Address) -> Result<TxId, ContractError> {
        let mut state = self.state.lock().expect("mock poisoned");
        let forced = state.forced_damage;
        let state = &mut *state;
        let record = state
            .players
            .get_mut(&from)
            .ok_or_else(|| ContractError::Reverted("player does not exist".into()))?;

        let damage = Self::roll_damage(forced, DEFEND_DAMAGE);
        let mut grants = Vec::new();
        let new_hp = record.hp.saturating_sub(damage);
        Self::apply_hp_change(&self.copro, record, from, new_hp, &mut grants);

        Ok(state.chain.submit(grants))
    }

    async fn use_potion(
        &self,
        from: Address,
        enc_heal: EncryptedInput,
    ) -> Result<TxId, ContractError> {
        let heal_values = self.copro.redeem_proof(&enc_heal, self.address, from)?;
        let heal = heal_values[0];

        let mut state = self.state.lock().expect("mock poisoned");
        let state = &mut *state;
        let record = state
            .players
            .get_mut(&from)
            .ok_or_else(|| ContractError::Reverted("player does not exist".into()))?;

        // FHE-select semantics: with zero potions the heal silently no-ops,
        // the count never goes below zero.
        let mut grants = Vec::new();
        if record.potions > 0 {
            record.potions -= 1;
            let new_hp = record.hp + heal;
            Self::apply_hp_change(&self.copro, record, from, new_hp, &mut grants);
        } else {
            let hp = record.hp;
            Self::apply_hp_change(&self.copro, record, from, hp, &mut grants);
        }
        record.potion_handle = self.copro.mint(record.potions);
        grants.push((record.potion_handle, from));

        Ok(state.chain.submit(grants))
    }

    async fn reset_player(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
    ) -> Result<TxId, ContractError> {
        let hp_values = self.copro.redeem_proof(&enc_hp, self.address, from)?;
        let potion_values = self.copro.redeem_proof(&enc_potions, self.address, from)?;

        let mut state = self.state.lock().expect("mock poisoned");
        let state = &mut *state;
        let record = state
            .players
            .get_mut(&from)
            .ok_or_else(|| ContractError::Reverted("player does not exist".into()))?;

        record.hp = hp_values[0].min(u64::from(MAX_HP));
        record.potions = potion_values[0];
        record.counters = PlayerCounters {
            position: 0,
            current_room: 1,
            max_depth_reached: 1,
            rooms_explored: 1,
            has_won: false,
        };
        record.hp_handle = self.copro.mint(record.hp);
        record.potion_handle = self.copro.mint(record.potions);
        record.feedback_handle = self.copro.mint(feedback_index_for_hp(record.hp));

        let grants = vec![
            (record.hp_handle, from),
            (record.potion_handle, from),
            (record.feedback_handle, from),
        ];
        Ok(state.chain.submit(grants))
    }

    async fn wait_for_inclusion(&self, tx: &TxId) -> Result<TxReceipt, ContractError> {
        let mut state = self.state.lock().expect("mock poisoned");
        let state = &mut *state;
        state.chain.include(tx, &self.copro, self.address)
    }

    async fn has_player(&self, player: Address) -> Result<bool, ContractError> {
        let state = self.state.lock().expect("mock poisoned");
        Ok(state.players.contains_key(&player))
    }

    async fn hp_handle(&self, player: Address) -> Result<CiphertextHandle, ContractError> {
        self.with_player(player, |p| p.hp_handle)
    }

    async fn potion_count_handle(
        &self,
        player: Address,
    ) -> Result<CiphertextHandle, ContractError> {
        self.with_player(player, |p| p.potion_handle)
    }

    async fn position(&self, player: Address) -> Result<u32, ContractError> {
        self.with_player(player, |p| p.counters.position)
    }

    async fn current_room(&self, player: Address) -> Result<u32, ContractError> {
        self.with_player(player, |p| p.counters.current_room)
    }

    async fn max_depth_reached(&self, player: Address) -> Result<u32, ContractError> {
        self.with_player(player, |p| p.counters.max_depth_reached)
    }

    async fn rooms_explored(&self, player: Address) -> Result<u32, ContractError> {
        self.with_player(player, |p| p.counters.rooms_explored)
    }

    async fn has_won(&self, player: Address) -> Result<bool, ContractError> {
        self.with_player(player, |p| p.counters.has_won)
    }

    async fn feedback_index_handle(
        &self,
        player: Address,
    ) -> Result<CiphertextHandle, ContractError> {
        self.with_player(player, |p| p.feedback_handle)
    }
}

struct HistoryState {
    records: HashMap<Address, Vec<GameRecord>>,
    chain: MockChain,
}

/// In-memory history contract.
pub struct MockHistoryContract {
    address: Address,
    copro: Arc<MockCoprocessor>,
    state: Mutex<HistoryState>,
}

impl MockHistoryContract {
    pub fn new(address: Address, copro: Arc<MockCoprocessor>) -> Self {
        Self {
            address,
            copro,
            state: Mutex::new(HistoryState {
                records: HashMap::new(),
                chain: MockChain::default(),
            }),
        }
    }

    /// Total record submissions across all players (test assertion hook).
    pub fn total_submissions(&self) -> usize {
        let state = self.state.lock().expect("mock poisoned");
        state.records.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl HistoryContract for MockHistoryContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn submit_game_record(
        &self,
        from: Address,
        enc_hp: EncryptedInput,
        enc_potions: EncryptedInput,
        rooms_explored: u32,
        final_position: u32,
    ) -> Result<TxId, ContractError> {
        // Redemption enforces the re-encryption requirement: proofs must be
        // addressed to this contract, not recycled from the gameplay one.
        self.copro.redeem_proof(&enc_hp, self.address, from)?;
        self.copro.redeem_proof(&enc_potions, self.address, from)?;

        let final_hp_handle = enc_hp.single_handle()?;
        let final_potion_count_handle = enc_potions.single_handle()?;

        let mut state = self.state.lock().expect("mock poisoned");
        let timestamp = GENESIS_TIME + (state.chain.height + 1) * BLOCK_INTERVAL;

        let records = state.records.entry(from).or_default();
        let game_index = records.len() as u64;
        records.push(GameRecord {
            final_hp_handle,
            final_potion_count_handle,
            rooms_explored,
            final_position,
            timestamp,
            exists: true,
        });

        tracing::info!(
            player = %from,
            game_index,
            timestamp,
            "GameRecordSubmitted"
        );

        let grants = vec![(final_hp_handle, from), (final_potion_count_handle, from)];
        Ok(state.chain.submit(grants))
    }

    async fn wait_for_inclusion(&self, tx: &TxId) -> Result<TxReceipt, ContractError> {
        let mut state = self.state.lock().expect("mock poisoned");
        let state = &mut *state;
        state.chain.include(tx, &self.copro, self.address)
    }

    async fn game_count(&self, player: Address) -> Result<u64, ContractError> {
        let state = self.state.lock().expect("mock poisoned");
        Ok(state.records.get(&player).map_or(0, |r| r.len() as u64))
    }

    async fn game_record(&self, player: Address, index: u64) -> Result<GameRecord, ContractError> {
        let state = self.state.lock().expect("mock poisoned");
        state
            .records
            .get(&player)
            .and_then(|r| r.get(index as usize))
            .cloned()
            .ok_or_else(|| ContractError::Reverted("record does not exist".into()))
    }
}

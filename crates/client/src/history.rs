//! Browsing past game records.
//!
//! Records live on the history contract, a different address and therefore
//! a different decryption authorization scope, than the gameplay contract.
//! The browser shares the session's signature cache, so one history-scoped
//! signature covers every record decrypt for the rest of its validity
//! window.

use std::sync::Arc;

use client_blockchain_core::GameRecord;
use fhevm::DecryptRequest;

use crate::error::ActionError;
use crate::session::SessionContext;

/// One loaded record, with its confidential fields decrypted on demand.
///
/// `final_hp` / `final_potion_count` stay `None` ("locked") until
/// [`HistoryBrowser::decrypt_entry`] succeeds for this entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub game_index: u64,
    pub record: GameRecord,
    pub final_hp: Option<u64>,
    pub final_potion_count: Option<u64>,
}

/// Read-only view over the caller's append-only game history.
pub struct HistoryBrowser {
    ctx: Arc<SessionContext>,
}

impl HistoryBrowser {
    pub fn new(ctx: Arc<SessionContext>) -> Self {
        Self { ctx }
    }

    /// Number of completed games recorded for the session's player.
    pub async fn game_count(&self) -> Result<u64, ActionError> {
        Ok(self.ctx.history().game_count(self.ctx.player()).await?)
    }

    /// Load every record without decryption, newest first.
    pub async fn load_records(&self) -> Result<Vec<HistoryEntry>, ActionError> {
        let player = self.ctx.player();
        let history = self.ctx.history();
        let count = history.game_count(player).await?;

        let mut entries = Vec::with_capacity(count as usize);
        for game_index in (0..count).rev() {
            let record = history.game_record(player, game_index).await?;
            if !record.exists {
                continue;
            }
            entries.push(HistoryEntry {
                game_index,
                record,
                final_hp: None,
                final_potion_count: None,
            });
        }
        Ok(entries)
    }

    /// Decrypt an entry's confidential fields with a history-scoped
    /// signature, obtained (or reused) through the shared cache.
    ///
    /// Unset handles and authorization failures leave the fields locked;
    /// only signer-independent errors propagate.
    pub async fn decrypt_entry(&self, entry: &mut HistoryEntry) -> Result<(), ActionError> {
        let contract = self.ctx.history().address();

        let requests: Vec<DecryptRequest> = [
            entry.record.final_hp_handle,
            entry.record.final_potion_count_handle,
        ]
        .into_iter()
        .filter(|handle| !handle.is_zero())
        .map(|handle| DecryptRequest { handle, contract })
        .collect();

        if requests.is_empty() {
            return Ok(());
        }

        let signature = match self
            .ctx
            .signatures()
            .load_or_sign(&[contract], self.ctx.signer())
            .await
        {
            Ok(signature) => signature,
            Err(err) => {
                tracing::warn!(%err, "history decryption signature unavailable");
                return Ok(());
            }
        };

        match self.ctx.gateway().user_decrypt(&requests, &signature).await {
            Ok(results) => {
                entry.final_hp = results.get(&entry.record.final_hp_handle).copied();
                entry.final_potion_count = results
                    .get(&entry.record.final_potion_count_handle)
                    .copied();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, game_index = entry.game_index, "record decryption failed");
                Ok(())
            }
        }
    }
}

//! Session-scoped context: the explicit replacement for ambient globals.
//!
//! Everything a pipeline operation needs (chain id, signer, gateway, the
//! two contract bindings, and the shared signature cache) travels in one
//! [`SessionContext`] constructed per wallet connection. Nothing is looked up
//! from module-level state, so two sessions can never leak into each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use client_blockchain_core::{HistoryContract, SurvivalContract};
use fhevm::{Address, ChainId, DecryptionSigner, FhevmGateway, SignatureCache};

/// Immutable bundle of session collaborators plus a change epoch.
///
/// The epoch is the same-chain/same-signer guard: whoever owns the session
/// calls [`invalidate`](SessionContext::invalidate) when the chain or signer
/// changes underneath it, and in-flight operations compare their entry
/// [`SessionSnapshot`] before committing any local state.
pub struct SessionContext {
    chain_id: ChainId,
    signer: Arc<dyn DecryptionSigner>,
    gateway: Arc<dyn FhevmGateway>,
    survival: Arc<dyn SurvivalContract>,
    history: Arc<dyn HistoryContract>,
    signatures: Arc<SignatureCache>,
    epoch: AtomicU64,
}

impl SessionContext {
    pub fn new(
        chain_id: ChainId,
        signer: Arc<dyn DecryptionSigner>,
        gateway: Arc<dyn FhevmGateway>,
        survival: Arc<dyn SurvivalContract>,
        history: Arc<dyn HistoryContract>,
        signatures: Arc<SignatureCache>,
    ) -> Self {
        Self {
            chain_id,
            signer,
            gateway,
            survival,
            history,
            signatures,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The wallet address all contract calls and decryptions act for.
    pub fn player(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &dyn DecryptionSigner {
        self.signer.as_ref()
    }

    pub fn gateway(&self) -> &Arc<dyn FhevmGateway> {
        &self.gateway
    }

    pub fn survival(&self) -> &Arc<dyn SurvivalContract> {
        &self.survival
    }

    pub fn history(&self) -> &Arc<dyn HistoryContract> {
        &self.history
    }

    pub fn signatures(&self) -> &Arc<SignatureCache> {
        &self.signatures
    }

    /// Capture the current epoch at operation entry.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            epoch: self.epoch.load(Ordering::Acquire),
        }
    }

    /// Whether the session is unchanged since the snapshot was taken.
    pub fn is_current(&self, snapshot: &SessionSnapshot) -> bool {
        self.epoch.load(Ordering::Acquire) == snapshot.epoch
    }

    /// Mark the session stale: the chain or signer changed. Every in-flight
    /// operation holding an older snapshot will discard its write-back.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(chain = %self.chain_id, "session invalidated");
    }
}

/// Epoch captured at operation entry; checked before committing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    epoch: u64,
}

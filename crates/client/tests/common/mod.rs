//! Shared test fixture: a full mock world (coprocessor, contracts, signer).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use client_blockchain_core::{MockHistoryContract, MockSurvivalContract};
use dungeon_client::{ActionPipeline, HistoryBrowser, SessionContext};
use fhevm::mock::MockCoprocessor;
use fhevm::{
    Address, ChainId, DecryptionAuthorization, DecryptionSigner, SignatureCache, SignerError,
};

pub const SURVIVAL_ADDRESS: Address = Address([0x10; 20]);
pub const HISTORY_ADDRESS: Address = Address([0x20; 20]);

/// Opt-in test logging, driven by `RUST_LOG` (e.g. `RUST_LOG=debug`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wallet stub that counts signing prompts and can be told to reject.
pub struct TestSigner {
    address: Address,
    prompts: AtomicUsize,
    reject: AtomicBool,
}

impl TestSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            prompts: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl DecryptionSigner for TestSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_authorization(
        &self,
        _authorization: &DecryptionAuthorization,
    ) -> Result<Vec<u8>, SignerError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(SignerError::Rejected);
        }
        Ok(vec![0x5a; 65])
    }
}

/// Everything a scenario needs, with concrete mock handles kept around for
/// test hooks (forced damage, HP override, submission counts).
pub struct TestWorld {
    pub copro: Arc<MockCoprocessor>,
    pub survival: Arc<MockSurvivalContract>,
    pub history: Arc<MockHistoryContract>,
    pub signer: Arc<TestSigner>,
    pub ctx: Arc<SessionContext>,
    pub player: Address,
}

impl TestWorld {
    pub fn new() -> Self {
        init_tracing();
        let player = Address::from_low_u64(1);
        let copro = Arc::new(MockCoprocessor::new());
        let survival = Arc::new(MockSurvivalContract::new(SURVIVAL_ADDRESS, copro.clone()));
        let history = Arc::new(MockHistoryContract::new(HISTORY_ADDRESS, copro.clone()));
        let signer = Arc::new(TestSigner::new(player));

        let ctx = Arc::new(SessionContext::new(
            ChainId(31337),
            signer.clone(),
            copro.clone(),
            survival.clone(),
            history.clone(),
            Arc::new(SignatureCache::new()),
        ));

        Self {
            copro,
            survival,
            history,
            signer,
            ctx,
            player,
        }
    }

    pub fn pipeline(&self) -> ActionPipeline {
        ActionPipeline::new(self.ctx.clone())
    }

    pub fn browser(&self) -> HistoryBrowser {
        HistoryBrowser::new(self.ctx.clone())
    }
}

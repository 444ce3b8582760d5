//! Decryption authorization: the signed capability that unlocks handles.
//!
//! Decrypting a handle off-chain requires an EIP-712-style statement binding
//! an ephemeral key pair to a contract address set and a validity window,
//! signed by the wallet. Each signature is a live wallet prompt, so the
//! [`SignatureCache`] makes re-signing structurally impossible while a valid
//! signature for the same scope exists.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Address;

/// Default validity window for a freshly signed authorization.
const DEFAULT_DURATION_DAYS: u64 = 365;

const SECONDS_PER_DAY: u64 = 86_400;

/// Errors from the wallet-facing signer.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The user declined the signing prompt. Callers degrade to "locked"
    /// fields rather than failing the surrounding action.
    #[error("signature request rejected by user")]
    Rejected,

    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// The statement presented to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionAuthorization {
    pub public_key: [u8; 32],
    pub contract_addresses: Vec<Address>,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

/// Wallet abstraction: an account that can approve decryption authorizations.
#[async_trait]
pub trait DecryptionSigner: Send + Sync {
    /// The account the authorization is issued for.
    fn address(&self) -> Address;

    /// Sign an authorization, presenting a prompt to the user.
    async fn sign_authorization(
        &self,
        authorization: &DecryptionAuthorization,
    ) -> Result<Vec<u8>, SignerError>;
}

/// A reusable capability proving the holder may decrypt handles from the
/// listed contracts on behalf of `user_address`, within the validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionSignature {
    pub private_key: [u8; 32],
    pub public_key: [u8; 32],
    pub signature: Vec<u8>,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl DecryptionSignature {
    /// Whether the validity window covers the current wall-clock time.
    pub fn is_valid_now(&self) -> bool {
        let now = unix_now();
        now >= self.start_timestamp
            && now < self.start_timestamp + self.duration_days * SECONDS_PER_DAY
    }

    /// Whether this signature's scope covers the given contract.
    pub fn covers(&self, contract: &Address) -> bool {
        self.contract_addresses.contains(contract)
    }
}

/// Process-wide cache of decryption signatures, keyed by exact scope.
///
/// Scope is the sorted contract address set plus the signing user; a
/// gameplay-scoped signature never satisfies a history-scoped lookup. The
/// cache is read-mostly (one write on first sign per scope) and shared as
/// `Arc<SignatureCache>` across the pipeline, history recorder, and record
/// browser.
#[derive(Default)]
pub struct SignatureCache {
    entries: RwLock<HashMap<String, DecryptionSignature>>,
}

impl SignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a cached, unexpired signature for the exact
    /// `(contracts, signer)` scope, or obtain one fresh signature from the
    /// wallet and cache it.
    ///
    /// Cache hits involve no signer interaction.
    ///
    /// # Errors
    ///
    /// Propagates [`SignerError::Rejected`] when the user declines; callers
    /// must treat pending decryptions as unavailable, not fatal.
    pub async fn load_or_sign(
        &self,
        contracts: &[Address],
        signer: &dyn DecryptionSigner,
    ) -> Result<DecryptionSignature, SignerError> {
        let mut scope: Vec<Address> = contracts.to_vec();
        scope.sort();
        scope.dedup();
        let key = scope_key(&scope, signer.address());

        {
            let entries = self.entries.read().expect("signature cache poisoned");
            if let Some(existing) = entries.get(&key) {
                if existing.is_valid_now() {
                    tracing::debug!(scope = %key, "reusing cached decryption signature");
                    return Ok(existing.clone());
                }
            }
        }

        // Expired or missing: evict and sign once.
        let (private_key, public_key) = generate_keypair();
        let authorization = DecryptionAuthorization {
            public_key,
            contract_addresses: scope.clone(),
            start_timestamp: unix_now(),
            duration_days: DEFAULT_DURATION_DAYS,
        };

        tracing::info!(scope = %key, "requesting decryption signature from wallet");
        let signature = signer.sign_authorization(&authorization).await?;

        let entry = DecryptionSignature {
            private_key,
            public_key,
            signature,
            contract_addresses: scope,
            user_address: signer.address(),
            start_timestamp: authorization.start_timestamp,
            duration_days: authorization.duration_days,
        };

        let mut entries = self.entries.write().expect("signature cache poisoned");
        // A concurrent cold-cache call for the same scope may have signed
        // while this one was waiting on the wallet; its entry wins so both
        // callers end up holding the same capability.
        if let Some(existing) = entries.get(&key) {
            if existing.is_valid_now() {
                tracing::debug!(scope = %key, "concurrent signature won, discarding this one");
                return Ok(existing.clone());
            }
        }
        entries.insert(key, entry.clone());
        Ok(entry)
    }

    /// Drop every cached signature (e.g. on wallet disconnect).
    pub fn clear(&self) {
        self.entries
            .write()
            .expect("signature cache poisoned")
            .clear();
    }
}

fn scope_key(contracts: &[Address], user: Address) -> String {
    let addresses: Vec<String> = contracts.iter().map(|a| a.to_string()).collect();
    format!("{}:{}", user, addresses.join(","))
}

fn generate_keypair() -> ([u8; 32], [u8; 32]) {
    let mut private_key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut private_key);
    // Ephemeral NaCl-style keys in the real SDK; a hash-derived public half
    // is sufficient for the capability plumbing modeled here.
    let public_key: [u8; 32] = Sha256::digest(private_key).into();
    (private_key, public_key)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

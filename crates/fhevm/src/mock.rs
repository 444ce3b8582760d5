//! In-memory coprocessor for tests.
//!
//! Simulates the FHE network faithfully enough to exercise the full client
//! pipeline: handles map to plaintexts, decryption requires a per-handle ACL
//! grant for the exact `(handle, contract, user)` triple, and input proofs are
//! single-use and bound to one destination. Contract mocks drive the same
//! store through [`MockCoprocessor::mint`], [`value_of`](MockCoprocessor::value_of)
//! and [`grant`](MockCoprocessor::grant).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::gateway::{DecryptRequest, FhevmGateway, GatewayError};
use crate::input::{EncryptedInput, InputProof};
use crate::signature::DecryptionSignature;
use crate::types::{Address, CiphertextHandle};

struct ProofRecord {
    contract: Address,
    submitter: Address,
    handles: Vec<CiphertextHandle>,
    consumed: bool,
}

#[derive(Default)]
struct CoprocessorState {
    plaintexts: HashMap<CiphertextHandle, u64>,
    acl: HashSet<(CiphertextHandle, Address, Address)>,
    proofs: HashMap<InputProof, ProofRecord>,
    counter: u64,
}

/// Shared in-memory stand-in for the FHE coprocessor and its ACL.
#[derive(Default)]
pub struct MockCoprocessor {
    state: Mutex<CoprocessorState>,
}

impl MockCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a plaintext and mint a fresh, unique handle for it.
    pub fn mint(&self, value: u64) -> CiphertextHandle {
        let mut state = self.state.lock().expect("coprocessor poisoned");
        state.counter += 1;
        let mut hasher = Sha256::new();
        hasher.update(state.counter.to_be_bytes());
        hasher.update(value.to_be_bytes());
        let handle = CiphertextHandle(hasher.finalize().into());
        state.plaintexts.insert(handle, value);
        handle
    }

    /// Plaintext behind a handle, bypassing authorization (contract-side use).
    pub fn value_of(&self, handle: &CiphertextHandle) -> Option<u64> {
        self.state
            .lock()
            .expect("coprocessor poisoned")
            .plaintexts
            .get(handle)
            .copied()
    }

    /// Authorize `user` to decrypt `handle` in the scope of `contract`.
    pub fn grant(&self, handle: CiphertextHandle, contract: Address, user: Address) {
        self.state
            .lock()
            .expect("coprocessor poisoned")
            .acl
            .insert((handle, contract, user));
    }

    /// Redeem an input proof at a destination, yielding the plaintexts.
    ///
    /// Consumes the proof: a second redemption, or redemption at a contract
    /// or by a submitter other than the ones the proof was created for, fails
    /// with [`GatewayError::InvalidProof`].
    pub fn redeem_proof(
        &self,
        input: &EncryptedInput,
        contract: Address,
        submitter: Address,
    ) -> Result<Vec<u64>, GatewayError> {
        let mut state = self.state.lock().expect("coprocessor poisoned");

        let record = state
            .proofs
            .get_mut(&input.proof)
            .ok_or_else(|| GatewayError::InvalidProof("unknown proof".into()))?;

        if record.consumed {
            return Err(GatewayError::InvalidProof("proof already redeemed".into()));
        }
        if record.contract != contract || record.submitter != submitter {
            return Err(GatewayError::InvalidProof(
                "proof bound to a different destination".into(),
            ));
        }
        if record.handles != input.handles {
            return Err(GatewayError::InvalidProof(
                "proof does not cover this handle set".into(),
            ));
        }
        record.consumed = true;

        let handles = record.handles.clone();
        handles
            .iter()
            .map(|h| {
                state
                    .plaintexts
                    .get(h)
                    .copied()
                    .ok_or(GatewayError::UnknownHandle(*h))
            })
            .collect()
    }
}

#[async_trait]
impl FhevmGateway for MockCoprocessor {
    async fn encrypt(
        &self,
        contract: Address,
        submitter: Address,
        values: &[u8],
    ) -> Result<EncryptedInput, GatewayError> {
        let handles: Vec<CiphertextHandle> =
            values.iter().map(|v| self.mint(u64::from(*v))).collect();

        let mut state = self.state.lock().expect("coprocessor poisoned");
        state.counter += 1;
        let mut hasher = Sha256::new();
        hasher.update(b"proof");
        hasher.update(state.counter.to_be_bytes());
        let proof = InputProof(hasher.finalize().into());

        state.proofs.insert(
            proof,
            ProofRecord {
                contract,
                submitter,
                handles: handles.clone(),
                consumed: false,
            },
        );

        Ok(EncryptedInput { handles, proof })
    }

    async fn user_decrypt(
        &self,
        requests: &[DecryptRequest],
        signature: &DecryptionSignature,
    ) -> Result<HashMap<CiphertextHandle, u64>, GatewayError> {
        if !signature.is_valid_now() {
            return Err(GatewayError::InvalidSignature(
                "validity window elapsed".into(),
            ));
        }

        let state = self.state.lock().expect("coprocessor poisoned");
        let mut results = HashMap::with_capacity(requests.len());

        for request in requests {
            if !signature.covers(&request.contract) {
                return Err(GatewayError::InvalidSignature(format!(
                    "signature does not cover contract {}",
                    request.contract
                )));
            }

            let authorized = state.acl.contains(&(
                request.handle,
                request.contract,
                signature.user_address,
            ));
            if !authorized {
                return Err(GatewayError::NotAuthorized(request.handle));
            }

            let value = state
                .plaintexts
                .get(&request.handle)
                .copied()
                .ok_or(GatewayError::UnknownHandle(request.handle))?;
            results.insert(request.handle, value);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::input::EncryptedInputBuilder;

    fn test_signature(user: Address, contracts: Vec<Address>) -> DecryptionSignature {
        DecryptionSignature {
            private_key: [1u8; 32],
            public_key: [2u8; 32],
            signature: vec![0xab; 65],
            contract_addresses: contracts,
            user_address: user,
            start_timestamp: 0,
            duration_days: u64::MAX / 86_400,
        }
    }

    #[tokio::test]
    async fn encrypt_then_redeem_round_trip() {
        let copro = MockCoprocessor::new();
        let contract = Address::from_low_u64(10);
        let submitter = Address::from_low_u64(1);

        let input = copro.encrypt(contract, submitter, &[100, 3]).await.unwrap();
        assert_eq!(input.handles.len(), 2);

        let values = copro.redeem_proof(&input, contract, submitter).unwrap();
        assert_eq!(values, vec![100, 3]);
    }

    #[tokio::test]
    async fn proof_is_single_use_and_destination_bound() {
        let copro = MockCoprocessor::new();
        let contract = Address::from_low_u64(10);
        let other = Address::from_low_u64(11);
        let submitter = Address::from_low_u64(1);

        let input = copro.encrypt(contract, submitter, &[42]).await.unwrap();

        // Wrong destination is rejected without consuming the proof.
        assert!(copro.redeem_proof(&input, other, submitter).is_err());

        copro.redeem_proof(&input, contract, submitter).unwrap();
        let replay = copro.redeem_proof(&input, contract, submitter);
        assert!(matches!(replay, Err(GatewayError::InvalidProof(_))));
    }

    #[tokio::test]
    async fn decrypt_requires_grant() {
        let copro = MockCoprocessor::new();
        let contract = Address::from_low_u64(10);
        let user = Address::from_low_u64(1);
        let handle = copro.mint(77);
        let sig = test_signature(user, vec![contract]);
        let request = [DecryptRequest { handle, contract }];

        let denied = copro.user_decrypt(&request, &sig).await;
        assert!(matches!(denied, Err(GatewayError::NotAuthorized(_))));

        copro.grant(handle, contract, user);
        let results = copro.user_decrypt(&request, &sig).await.unwrap();
        assert_eq!(results[&handle], 77);
    }

    #[tokio::test]
    async fn decrypt_rejects_uncovered_contract() {
        let copro = MockCoprocessor::new();
        let contract = Address::from_low_u64(10);
        let user = Address::from_low_u64(1);
        let handle = copro.mint(5);
        copro.grant(handle, contract, user);

        let sig = test_signature(user, vec![Address::from_low_u64(99)]);
        let denied = copro
            .user_decrypt(&[DecryptRequest { handle, contract }], &sig)
            .await;
        assert!(matches!(denied, Err(GatewayError::InvalidSignature(_))));
    }

    #[tokio::test]
    async fn builder_produces_one_handle_per_value() {
        let copro: Arc<dyn FhevmGateway> = Arc::new(MockCoprocessor::new());
        let input = EncryptedInputBuilder::new(
            copro,
            Address::from_low_u64(10),
            Address::from_low_u64(1),
        )
        .add8(100)
        .add8(3)
        .encrypt()
        .await
        .unwrap();

        assert_eq!(input.handles.len(), 2);
        assert_ne!(input.handles[0], input.handles[1]);
    }
}

//! The gateway trait: the client's only door into the FHE network.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::input::EncryptedInput;
use crate::signature::DecryptionSignature;
use crate::types::{Address, CiphertextHandle};

/// Errors crossing the confidential-computation boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("decryption not authorized for handle {0}")]
    NotAuthorized(CiphertextHandle),

    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(CiphertextHandle),

    #[error("decryption signature expired or malformed: {0}")]
    InvalidSignature(String),

    #[error("input proof rejected: {0}")]
    InvalidProof(String),

    #[error("network error: {0}")]
    Network(String),
}

/// One handle to decrypt, scoped to the contract that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptRequest {
    pub handle: CiphertextHandle,
    pub contract: Address,
}

/// Opaque FHE network operations: encrypt inputs, decrypt authorized handles.
///
/// Implementations are the real relayer SDK in production and
/// [`mock::MockCoprocessor`](crate::mock::MockCoprocessor) in tests.
#[async_trait]
pub trait FhevmGateway: Send + Sync {
    /// Encrypt 8-bit plaintexts into one handle per value plus a single
    /// validity proof bound to exactly this `(contract, submitter)` pair.
    ///
    /// The proof is single-use: it redeems once, for the handle set it was
    /// created with, at the destination it was created for.
    async fn encrypt(
        &self,
        contract: Address,
        submitter: Address,
        values: &[u8],
    ) -> Result<EncryptedInput, GatewayError>;

    /// Decrypt a batch of authorized handles for the signing user.
    ///
    /// Fails with [`GatewayError::NotAuthorized`] for any handle the owning
    /// contract has not explicitly granted to `signature.user_address`, and
    /// with [`GatewayError::InvalidSignature`] when the signature is expired
    /// or does not cover a request's contract.
    async fn user_decrypt(
        &self,
        requests: &[DecryptRequest],
        signature: &DecryptionSignature,
    ) -> Result<HashMap<CiphertextHandle, u64>, GatewayError>;
}

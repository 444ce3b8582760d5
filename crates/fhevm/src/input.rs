//! Encrypted input construction.
//!
//! Mirrors the relayer SDK's builder shape: `create_input(...).add8(v).add8(w)
//! .encrypt().await` yields one ciphertext handle per value and one proof
//! covering all of them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::gateway::{FhevmGateway, GatewayError};
use crate::types::{Address, CiphertextHandle};

/// Zero-knowledge-style well-formedness proof for a batch of inputs.
///
/// Opaque to the client; bound by the coprocessor to one destination contract
/// and one submitter, and consumed on first redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputProof(pub [u8; 32]);

impl fmt::Display for InputProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Ciphertext handles plus the single proof that vouches for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handles: Vec<CiphertextHandle>,
    pub proof: InputProof,
}

impl EncryptedInput {
    /// The sole handle of a single-value input.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidProof`] if the input does not carry
    /// exactly one handle.
    pub fn single_handle(&self) -> Result<CiphertextHandle, GatewayError> {
        match self.handles.as_slice() {
            [handle] => Ok(*handle),
            other => Err(GatewayError::InvalidProof(format!(
                "expected exactly one handle, got {}",
                other.len()
            ))),
        }
    }
}

/// Builder accumulating 8-bit plaintexts for one destination.
pub struct EncryptedInputBuilder {
    gateway: Arc<dyn FhevmGateway>,
    contract: Address,
    submitter: Address,
    values: Vec<u8>,
}

impl EncryptedInputBuilder {
    pub fn new(gateway: Arc<dyn FhevmGateway>, contract: Address, submitter: Address) -> Self {
        Self {
            gateway,
            contract,
            submitter,
            values: Vec::new(),
        }
    }

    /// Append an 8-bit plaintext value.
    pub fn add8(mut self, value: u8) -> Self {
        self.values.push(value);
        self
    }

    /// Encrypt all accumulated values in one round-trip.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidProof`] for an empty builder, or any
    /// error the gateway reports.
    pub async fn encrypt(self) -> Result<EncryptedInput, GatewayError> {
        if self.values.is_empty() {
            return Err(GatewayError::InvalidProof(
                "encrypted input must carry at least one value".into(),
            ));
        }

        tracing::debug!(
            contract = %self.contract,
            submitter = %self.submitter,
            count = self.values.len(),
            "encrypting input batch"
        );

        self.gateway
            .encrypt(self.contract, self.submitter, &self.values)
            .await
    }
}

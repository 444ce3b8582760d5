//! Confidential-computation boundary for the Fuzzy Survival client.
//!
//! This crate models the FHE network as an opaque service reachable through
//! the [`FhevmGateway`] trait: plaintext bytes go in as confidential
//! input/proof pairs, ciphertext handles come back, and handles are only
//! decryptable with a signed, time-bounded [`DecryptionSignature`].
//!
//! # Architecture
//!
//! ```text
//! EncryptedInputBuilder ──▶ FhevmGateway::encrypt ──▶ EncryptedInput
//!                                                       (handles + proof)
//!
//! SignatureCache::load_or_sign ──▶ DecryptionSignature
//!                                       │
//! FhevmGateway::user_decrypt ◀──────────┘  (handle, contract) → plaintext
//! ```
//!
//! The `mock` module provides an in-memory coprocessor implementing the same
//! authorization rules (per-handle ACL grants, single-use input proofs) for
//! tests that need the full pipeline without a network.
pub mod gateway;
pub mod input;
pub mod mock;
pub mod signature;
pub mod types;

pub use gateway::{DecryptRequest, FhevmGateway, GatewayError};
pub use input::{EncryptedInput, EncryptedInputBuilder, InputProof};
pub use signature::{
    DecryptionAuthorization, DecryptionSignature, DecryptionSigner, SignatureCache, SignerError,
};
pub use types::{Address, ChainId, CiphertextHandle};

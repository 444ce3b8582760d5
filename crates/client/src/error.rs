//! Pipeline error taxonomy.

use client_blockchain_core::ContractError;
use fhevm::GatewayError;

/// Errors a pipeline operation can surface to its caller.
///
/// Authorization and decode failures never appear here: those degrade to
/// locked fields and neutral feedback inside the pipeline (see the crate
/// docs). What remains is what the user genuinely needs to see.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// No usable chain, signer, or deployment for this operation.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The ledger rejected the transaction (e.g. duplicate player creation).
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Building a confidential input failed before submission.
    #[error("encryption failed: {0}")]
    Encryption(#[from] GatewayError),

    /// The chain or signer changed while the operation was in flight; its
    /// results were discarded without touching local state.
    #[error("chain or signer changed mid-action; results discarded")]
    StaleSession,
}

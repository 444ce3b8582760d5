//! Ledger abstraction layer for the Fuzzy Survival client.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: Domain Traits (confidential game concepts)
//!          ├── SurvivalContract  (gameplay surface)
//!          └── HistoryContract   (append-only game records)
//!
//! Layer 0: Two-phase mutation protocol
//!          submit (TxId) ──▶ wait_for_inclusion (TxReceipt) ──▶ reads
//! ```
//!
//! # Design Philosophy
//!
//! - **Mutations return only a `TxId`**: the returned value of a mutating
//!   call is never recovered by replaying it. Reads that depend on a
//!   mutation's side effects (freshly authorized ciphertext handles) are
//!   valid only after `wait_for_inclusion` confirms durable inclusion.
//! - **No game knowledge leaks downward**: contract traits speak in
//!   `fhevm` handles and `game-core` plaintext types only.
//! - **Testability**: `mock` provides in-memory contracts implementing the
//!   full on-chain rules against a shared mock coprocessor.
pub mod deployment;
pub mod mock;
pub mod traits;
pub mod types;

pub use deployment::Deployment;
pub use traits::{ContractError, HistoryContract, SurvivalContract};
pub use types::{GameRecord, TxId, TxReceipt};

pub use mock::{MockHistoryContract, MockSurvivalContract};

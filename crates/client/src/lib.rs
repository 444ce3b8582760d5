//! Client-side orchestration for the Fuzzy Survival dungeon.
//!
//! # Architecture
//!
//! ```text
//! ActionPipeline (per-player state machine)
//!   ├─→ SessionContext (chain/signer snapshot, contract bindings, caches)
//!   ├─→ fhevm (encrypted inputs, signature cache, user decryption)
//!   ├─→ client-blockchain-core (two-phase contract surfaces)
//!   └─→ terminal detector ──▶ one-shot history submission
//! ```
//!
//! Every player action follows the same three-phase shape: **mutate**
//! (submit a transaction), **re-authorize + read** (wait for inclusion, then
//! fetch the freshly authorized ciphertext handles), **decrypt + reconcile**
//! (decrypt with a cached signature, clamp, rebuild the local mirror). The
//! pipeline is the single writer of its local state; operations that detect a
//! chain or signer change mid-flight discard their results without writing.
//!
//! # Degradation policy
//!
//! Decryption is best-effort everywhere: a rejected signature or unset handle
//! leaves the affected fields "locked" (`None`) and substitutes the neutral
//! feedback narrative, while the plaintext counters that could be read are
//! still committed. Only contract reverts and connectivity failures surface
//! as errors.
pub mod error;
pub mod history;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod terminal;

pub use error::ActionError;
pub use history::{HistoryBrowser, HistoryEntry};
pub use pipeline::ActionPipeline;
pub use session::{SessionContext, SessionSnapshot};
pub use state::{GamePhase, GameStateView, HistoryPhase, TerminalEvent};

//! Per-network deployment lookup.
//!
//! Deployment addresses are resolved by chain id, with environment variables
//! taking precedence over the built-in table:
//! - `SURVIVAL_CONTRACT_ADDRESS` - gameplay contract address
//! - `HISTORY_CONTRACT_ADDRESS` - history contract address
//!
//! A zero address means "not deployed on this chain": callers surface
//! [`ContractError::NotDeployed`] instead of attempting calls.

use std::env;

use fhevm::{Address, ChainId};

use crate::traits::ContractError;

/// Known networks. Addresses are populated after deployment via the
/// environment; the table itself only pins the chain names.
const KNOWN_CHAINS: &[(u64, &str)] = &[
    (31337, "hardhat"),
    (11155111, "sepolia"),
];

/// Resolved contract addresses for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub chain_id: ChainId,
    pub chain_name: &'static str,
    pub survival: Address,
    pub history: Address,
}

impl Deployment {
    /// Look up the deployment for a chain id.
    ///
    /// Returns `None` for unknown chains. Known chains always resolve, but
    /// individual addresses may still be zero (absent contract).
    pub fn for_chain(chain_id: ChainId) -> Option<Self> {
        let (_, chain_name) = KNOWN_CHAINS.iter().find(|(id, _)| *id == chain_id.0)?;

        Some(Self {
            chain_id,
            chain_name,
            survival: address_from_env("SURVIVAL_CONTRACT_ADDRESS"),
            history: address_from_env("HISTORY_CONTRACT_ADDRESS"),
        })
    }

    /// The gameplay contract address, or [`ContractError::NotDeployed`] if
    /// absent on this chain.
    pub fn survival_address(&self) -> Result<Address, ContractError> {
        require_deployed(self.survival)
    }

    /// The history contract address, or [`ContractError::NotDeployed`] if
    /// absent on this chain.
    pub fn history_address(&self) -> Result<Address, ContractError> {
        require_deployed(self.history)
    }
}

fn require_deployed(address: Address) -> Result<Address, ContractError> {
    if address.is_zero() {
        Err(ContractError::NotDeployed)
    } else {
        Ok(address)
    }
}

fn address_from_env(var: &str) -> Address {
    match env::var(var) {
        Ok(raw) => Address::from_hex(&raw).unwrap_or_else(|_| {
            tracing::warn!(var, raw, "malformed address in environment, treating as absent");
            Address::ZERO
        }),
        Err(_) => Address::ZERO,
    }
}

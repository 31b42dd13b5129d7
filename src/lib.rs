//! Staked Vault Strategy for Casper (Odra)
//!
//! This crate routes an asset into a CEP-4626 vault and stakes the vault
//! shares in a reward-paying staking facility.
//! - StakedVaultStrategy: strategy contract with roles, reward registry and sweep
//! - staking: share accounting across the vault and the staking facility
//! - mocks / tokens: deployable collaborators for tests and livenet demos

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod access;
pub mod capability;
pub mod errors;
pub mod external;
pub mod mocks;
pub mod rewards;
pub mod staking;
pub mod strategy;
pub mod tokens;

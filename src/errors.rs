//! Error codes reverted by the staked vault strategy.

use odra::prelude::*;

/// Errors for strategy operations
///
/// Codes are stable: keepers decode them to pick a retry or alerting policy.
#[odra::odra_error]
pub enum StrategyError {
    // Caller lacks the role the entry point requires
    Unauthorized = 1,
    // Target is the underlying asset or the vault share token
    ProtectedToken = 2,
    // Staking facility does not accept the vault share token
    TokenMismatch = 3,
    // Unstake requested more than the facility holds for the strategy
    InsufficientStakedBalance = 4,
    // Vault is not denominated in the strategy asset
    AssetMismatch = 5,
    ZeroAmount = 6,
    InsufficientIdleAsset = 7,
    StrategyShutdown = 8,
    NotShutdown = 9,
    NoPendingManagement = 10,
    // Storage read before init
    NotInitialized = 11,
}

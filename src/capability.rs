//! Capabilities the staking core composes over.
//!
//! The strategy module implements these with contract references; unit tests
//! implement them with in-memory ledgers.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::errors::StrategyError;
use crate::external::{
    Cep4626VaultContractRef, StakingRewardsContractRef, TradeFactoryContractRef,
};

/// Vault position: share balances and the vault's own ceilings
pub trait VaultPosition {
    fn share_balance_of(&self, owner: Address) -> U256;
    fn max_deposit_for(&self, receiver: Address) -> U256;
    fn max_redeem_for(&self, owner: Address) -> U256;
    fn convert_shares_to_assets(&self, shares: U256) -> U256;
    fn shares_for_withdraw(&self, assets: U256) -> U256;
    fn deposit(&mut self, assets: U256, receiver: Address) -> U256;
    fn withdraw(&mut self, assets: U256, holder: Address) -> U256;
}

/// Staking facility custodying vault shares
pub trait StakingFacility {
    fn staking_token_address(&self) -> Address;
    fn balance_of(&self, account: Address) -> U256;
    fn stake(&mut self, shares: U256);
    /// Fails with `InsufficientStakedBalance` when `shares` exceeds the stake.
    fn withdraw(&mut self, shares: U256) -> Result<(), StrategyError>;
    fn claim_reward(&mut self);
}

/// Trading collaborator notified of reward token membership
pub trait RewardTrading {
    fn enable(&mut self, token: Address, target: Address);
    fn disable(&mut self, token: Address, target: Address);
}

impl VaultPosition for Cep4626VaultContractRef {
    fn share_balance_of(&self, owner: Address) -> U256 {
        self.balance_of(owner)
    }

    fn max_deposit_for(&self, receiver: Address) -> U256 {
        self.max_deposit(receiver)
    }

    fn max_redeem_for(&self, owner: Address) -> U256 {
        self.max_redeem(owner)
    }

    fn convert_shares_to_assets(&self, shares: U256) -> U256 {
        self.convert_to_assets(shares)
    }

    fn shares_for_withdraw(&self, assets: U256) -> U256 {
        self.preview_withdraw(assets)
    }

    fn deposit(&mut self, assets: U256, receiver: Address) -> U256 {
        Cep4626VaultContractRef::deposit(self, assets, receiver)
    }

    fn withdraw(&mut self, assets: U256, holder: Address) -> U256 {
        Cep4626VaultContractRef::withdraw(self, assets, holder, holder)
    }
}

impl StakingFacility for StakingRewardsContractRef {
    fn staking_token_address(&self) -> Address {
        self.staking_token()
    }

    fn balance_of(&self, account: Address) -> U256 {
        StakingRewardsContractRef::balance_of(self, account)
    }

    fn stake(&mut self, shares: U256) {
        StakingRewardsContractRef::stake(self, shares)
    }

    // A facility revert aborts the whole call, so success is the only
    // outcome observable here.
    fn withdraw(&mut self, shares: U256) -> Result<(), StrategyError> {
        StakingRewardsContractRef::withdraw(self, shares);
        Ok(())
    }

    fn claim_reward(&mut self) {
        self.get_reward()
    }
}

impl RewardTrading for TradeFactoryContractRef {
    fn enable(&mut self, token: Address, target: Address) {
        TradeFactoryContractRef::enable(self, token, target)
    }

    fn disable(&mut self, token: Address, target: Address) {
        TradeFactoryContractRef::disable(self, token, target)
    }
}

//! Deployable collaborators for tests and livenet demos.
//!
//! - MockVault: CEP-4626 vault that is also its own CEP-18 share token,
//!   with adjustable deposit and redemption ceilings
//! - MockStakingRewards: staking facility paying a single reward token
//! - MockTradeFactory: records which reward tokens are enabled for sale

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

use crate::external::cep18_ref;

/// Errors for mock collaborators
#[odra::odra_error]
pub enum MockError {
    InsufficientStakedBalance = 101,
    CannotStakeZero = 102,
    DepositLimitExceeded = 103,
    RedeemLimitExceeded = 104,
    NotShareOwner = 105,
    NotInitialized = 106,
}

// ==========================================
// Vault
// ==========================================

#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom
    ],
    errors = MockError
)]
pub struct MockVault {
    shares: SubModule<Cep18>,
    asset: Var<Address>,
    deposit_limit: Var<U256>,
    redeem_limits: Mapping<Address, Option<U256>>,
}

#[odra::module]
impl MockVault {
    pub fn init(&mut self, asset: Address, symbol: String, name: String) {
        self.shares.init(symbol, name, 18u8, U256::zero());
        self.asset.set(asset);
        self.deposit_limit.set(U256::MAX);
    }

    pub fn asset(&self) -> Address {
        self.asset_address()
    }

    /// Assets held by the vault; donations raise the share price
    pub fn total_assets(&self) -> U256 {
        let asset = cep18_ref(self.env(), self.asset_address());
        asset.balance_of(self.env().self_address())
    }

    pub fn total_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.shares.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.shares.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.shares.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.shares.approve(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.shares.transfer_from(&owner, &recipient, &amount);
    }

    pub fn max_deposit(&self, receiver: Address) -> U256 {
        let _ = receiver;
        self.deposit_limit.get_or_default()
    }

    /// Configured ceiling for `owner`, else its full share balance
    pub fn max_redeem(&self, owner: Address) -> U256 {
        self.redeem_limits
            .get(&owner)
            .flatten()
            .unwrap_or_else(|| self.shares.balance_of(&owner))
    }

    pub fn convert_to_shares(&self, assets: U256) -> U256 {
        let supply = self.shares.total_supply();
        let total_assets = self.total_assets();
        if supply.is_zero() || total_assets.is_zero() {
            return assets;
        }
        assets * supply / total_assets
    }

    pub fn convert_to_assets(&self, shares: U256) -> U256 {
        let supply = self.shares.total_supply();
        if supply.is_zero() {
            return shares;
        }
        shares * self.total_assets() / supply
    }

    pub fn preview_withdraw(&self, assets: U256) -> U256 {
        let supply = self.shares.total_supply();
        let total_assets = self.total_assets();
        if supply.is_zero() || total_assets.is_zero() {
            return assets;
        }
        (assets * supply + total_assets - U256::one()) / total_assets
    }

    pub fn deposit(&mut self, assets: U256, receiver: Address) -> U256 {
        if assets > self.deposit_limit.get_or_default() {
            self.env().revert(MockError::DepositLimitExceeded);
        }
        let minted = self.convert_to_shares(assets);
        let mut asset = cep18_ref(self.env(), self.asset_address());
        asset.transfer_from(self.env().caller(), self.env().self_address(), assets);
        self.shares.raw_mint(&receiver, &minted);
        minted
    }

    pub fn withdraw(&mut self, assets: U256, receiver: Address, owner: Address) -> U256 {
        if self.env().caller() != owner {
            self.env().revert(MockError::NotShareOwner);
        }
        let burned = self.preview_withdraw(assets);
        if burned > self.max_redeem(owner) {
            self.env().revert(MockError::RedeemLimitExceeded);
        }
        self.shares.raw_burn(&owner, &burned);
        let mut asset = cep18_ref(self.env(), self.asset_address());
        asset.transfer(receiver, assets);
        burned
    }

    pub fn set_deposit_limit(&mut self, limit: U256) {
        self.deposit_limit.set(limit);
    }

    /// Overrides the redemption ceiling of `owner`; `None` restores the default
    pub fn set_redeem_limit(&mut self, owner: Address, limit: Option<U256>) {
        self.redeem_limits.set(&owner, limit);
    }

    fn asset_address(&self) -> Address {
        self.asset.get_or_revert_with(MockError::NotInitialized)
    }
}

// ==========================================
// Staking facility
// ==========================================

#[odra::module(errors = MockError)]
pub struct MockStakingRewards {
    staking_token: Var<Address>,
    reward_token: Var<Address>,
    balances: Mapping<Address, U256>,
    total_staked: Var<U256>,
    earned: Mapping<Address, U256>,
}

#[odra::module]
impl MockStakingRewards {
    pub fn init(&mut self, staking_token: Address, reward_token: Address) {
        self.staking_token.set(staking_token);
        self.reward_token.set(reward_token);
        self.total_staked.set(U256::zero());
    }

    pub fn staking_token(&self) -> Address {
        self.staking_token.get_or_revert_with(MockError::NotInitialized)
    }

    pub fn reward_token(&self) -> Address {
        self.reward_token.get_or_revert_with(MockError::NotInitialized)
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or_default()
    }

    pub fn total_staked(&self) -> U256 {
        self.total_staked.get_or_default()
    }

    pub fn earned(&self, account: Address) -> U256 {
        self.earned.get(&account).unwrap_or_default()
    }

    pub fn stake(&mut self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(MockError::CannotStakeZero);
        }
        let caller = self.env().caller();
        let mut token = cep18_ref(self.env(), self.staking_token());
        token.transfer_from(caller, self.env().self_address(), amount);
        let balance = self.balance_of(caller);
        let total = self.total_staked();
        self.balances.set(&caller, balance + amount);
        self.total_staked.set(total + amount);
    }

    pub fn withdraw(&mut self, amount: U256) {
        let caller = self.env().caller();
        let balance = self.balance_of(caller);
        if amount > balance {
            self.env().revert(MockError::InsufficientStakedBalance);
        }
        let total = self.total_staked();
        self.balances.set(&caller, balance - amount);
        self.total_staked.set(total - amount);
        let mut token = cep18_ref(self.env(), self.staking_token());
        token.transfer(caller, amount);
    }

    /// Pays accrued rewards; a claim with nothing accrued does nothing
    pub fn get_reward(&mut self) {
        let caller = self.env().caller();
        let reward = self.earned(caller);
        if reward.is_zero() {
            return;
        }
        self.earned.set(&caller, U256::zero());
        let mut token = cep18_ref(self.env(), self.reward_token());
        token.transfer(caller, reward);
    }

    /// Credits `amount` of reward to `account`. The facility must already
    /// hold the reward tokens.
    pub fn notify_reward(&mut self, account: Address, amount: U256) {
        let earned = self.earned(account);
        self.earned.set(&account, earned + amount);
    }

    /// Writes down a stake without moving tokens
    pub fn slash(&mut self, account: Address, amount: U256) {
        let balance = self.balance_of(account);
        let slashed = amount.min(balance);
        let total = self.total_staked();
        self.balances.set(&account, balance - slashed);
        self.total_staked.set(total - slashed);
    }
}

// ==========================================
// Trade factory
// ==========================================

#[odra::module]
pub struct MockTradeFactory {
    enabled: Mapping<(Address, Address), bool>,
}

#[odra::module]
impl MockTradeFactory {
    pub fn enable(&mut self, token_in: Address, token_out: Address) {
        self.enabled.set(&(token_in, token_out), true);
    }

    pub fn disable(&mut self, token_in: Address, token_out: Address) {
        self.enabled.set(&(token_in, token_out), false);
    }

    pub fn is_enabled(&self, token_in: Address, token_out: Address) -> bool {
        self.enabled.get(&(token_in, token_out)).unwrap_or_default()
    }
}

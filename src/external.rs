//! External Contract Interfaces
//!
//! Collaborators the strategy calls but does not implement:
//! - CEP-18 tokens (asset, reward tokens, stray tokens)
//! - CEP-4626 vault whose share token the strategy holds
//! - Staking facility that custodies vault shares and pays rewards
//! - Trade factory that auctions reward tokens

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

/// Minimal CEP-18 surface used for approvals, balances and sweeps
#[odra::external_contract]
pub trait Cep18Token {
    fn balance_of(&self, owner: Address) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn approve(&mut self, spender: Address, amount: U256);
}

/// CEP-4626 vault. The vault contract is also the CEP-18 share token.
#[odra::external_contract]
pub trait Cep4626Vault {
    /// Underlying token the vault is denominated in
    fn asset(&self) -> Address;

    /// Share balance of `owner`
    fn balance_of(&self, owner: Address) -> U256;

    /// Maximum assets `receiver` may deposit right now
    fn max_deposit(&self, receiver: Address) -> U256;

    /// Maximum shares `owner` may redeem right now
    fn max_redeem(&self, owner: Address) -> U256;

    /// Assets worth `shares`, rounded down
    fn convert_to_assets(&self, shares: U256) -> U256;

    /// Shares burned by a withdrawal of `assets`, rounded up
    fn preview_withdraw(&self, assets: U256) -> U256;

    fn deposit(&mut self, assets: U256, receiver: Address) -> U256;

    fn withdraw(&mut self, assets: U256, receiver: Address, owner: Address) -> U256;

    fn approve(&mut self, spender: Address, amount: U256);
}

/// Staking facility holding vault shares on behalf of stakers
#[odra::external_contract]
pub trait StakingRewards {
    /// Token the facility accepts for staking
    fn staking_token(&self) -> Address;
    fn balance_of(&self, account: Address) -> U256;
    fn stake(&mut self, amount: U256);
    fn withdraw(&mut self, amount: U256);
    /// Pays every accrued reward to the caller. Zero rewards is not an error.
    fn get_reward(&mut self);
}

/// Auction collaborator that sells reward tokens
#[odra::external_contract]
pub trait TradeFactory {
    fn enable(&mut self, token_in: Address, token_out: Address);
    fn disable(&mut self, token_in: Address, token_out: Address);
}

/// Helper to create a CEP-18 reference
pub fn cep18_ref(env: Rc<ContractEnv>, token: Address) -> Cep18TokenContractRef {
    Cep18TokenContractRef::new(env, token)
}

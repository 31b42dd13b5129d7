//! Staked Vault Strategy Contract
//!
//! Routes a single asset into a CEP-4626 vault and locks the vault shares in
//! a staking facility that pays reward tokens.
//! - Idle asset -> vault shares -> staked shares, and back
//! - Withdrawal ceilings bounded by the least liquid layer
//! - Reward tokens registered for auction by an external trade factory
//! - Governance can sweep stray tokens, never the asset or vault shares
//!
//! ## Roles
//! - governance: fixed at init; trade factory and sweeps
//! - management: two-step transfer; reward registry, keeper, shutdown
//! - keeper: unstake, fund movements, reports
//!
//! ## Staking mode
//! Deployed without a staking facility the strategy runs unstaked: shares
//! stay loose and every staking call is a no-op.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;
use alloc::vec::Vec;

use crate::access::{ensure_any_role, ensure_role, ProtectedTokens};
use crate::capability::RewardTrading;
use crate::errors::StrategyError;
use crate::external::{
    cep18_ref, Cep4626VaultContractRef, StakingRewardsContractRef, TradeFactoryContractRef,
};
use crate::rewards::{self, RewardTokenSet};
use crate::staking::{Staking, StakingAdapter};

type LiveAdapter = StakingAdapter<Cep4626VaultContractRef, StakingRewardsContractRef>;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct StrategyInitialized {
        pub asset: Address,
        pub vault: Address,
        pub staking: Option<Address>,
        pub governance: Address,
        pub management: Address,
    }

    #[odra::event]
    pub struct IdleStaked {
        pub shares: U256,
    }

    #[odra::event]
    pub struct Unstaked {
        pub shares: U256,
    }

    #[odra::event]
    pub struct RewardsClaimed {
        pub by: Address,
    }

    #[odra::event]
    pub struct RewardTokenAdded {
        pub token: Address,
    }

    #[odra::event]
    pub struct RewardTokenRemoved {
        pub token: Address,
    }

    #[odra::event]
    pub struct TradeFactorySet {
        pub previous: Option<Address>,
        pub current: Option<Address>,
    }

    #[odra::event]
    pub struct Swept {
        pub token: Address,
        pub amount: U256,
        pub to: Address,
    }

    #[odra::event]
    pub struct FundsDeployed {
        pub assets: U256,
        pub shares: U256,
    }

    #[odra::event]
    pub struct FundsFreed {
        pub assets: U256,
        pub shares: U256,
    }

    #[odra::event]
    pub struct Reported {
        pub total_assets: U256,
    }

    #[odra::event]
    pub struct KeeperSet {
        pub keeper: Address,
    }

    #[odra::event]
    pub struct ManagementTransferInitiated {
        pub current: Address,
        pub pending: Address,
    }

    #[odra::event]
    pub struct ManagementTransferred {
        pub previous: Option<Address>,
        pub current: Address,
    }

    #[odra::event]
    pub struct ShutdownTriggered {
        pub by: Address,
    }

    #[odra::event]
    pub struct EmergencyWithdrawn {
        pub assets: U256,
    }
}

// ==========================================
// Types
// ==========================================

/// Token the trade factory buys with sold rewards
#[odra::odra_type]
#[derive(Default)]
pub enum SwapTarget {
    #[default]
    VaultShare = 0,
    Asset = 1,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::StrategyInitialized,
        events::IdleStaked,
        events::Unstaked,
        events::RewardsClaimed,
        events::RewardTokenAdded,
        events::RewardTokenRemoved,
        events::TradeFactorySet,
        events::Swept,
        events::FundsDeployed,
        events::FundsFreed,
        events::Reported,
        events::KeeperSet,
        events::ManagementTransferInitiated,
        events::ManagementTransferred,
        events::ShutdownTriggered,
        events::EmergencyWithdrawn
    ],
    errors = StrategyError
)]
pub struct StakedVaultStrategy {
    // Principal tokens
    asset: Var<Address>,
    vault: Var<Address>,

    // None when deployed unstaked; never changes after init
    staking: Var<Option<Address>>,

    // Roles
    governance: Var<Address>,
    management: Var<Address>,
    pending_management: Var<Option<Address>>,
    keeper: Var<Address>,

    // Reward auctioning
    reward_tokens: Var<Vec<Address>>,
    trade_factory: Var<Option<Address>>,
    swap_target: Var<SwapTarget>,

    shutdown: Var<bool>,
}

#[odra::module]
impl StakedVaultStrategy {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the strategy. The caller becomes management and keeper.
    ///
    /// Reverts with `AssetMismatch` if the vault is not denominated in
    /// `asset`, and with `TokenMismatch` if the staking facility does not
    /// stake the vault share token.
    pub fn init(
        &mut self,
        asset: Address,
        vault: Address,
        staking: Option<Address>,
        governance: Address,
        swap_target: SwapTarget,
    ) {
        let env = self.env();
        let caller = env.caller();

        let vault_ref = Cep4626VaultContractRef::new(env.clone(), vault);
        if vault_ref.asset() != asset {
            env.revert(StrategyError::AssetMismatch);
        }
        let adapter = StakingAdapter::new(
            env.self_address(),
            vault_ref,
            Staking::from_config(staking, |address| {
                StakingRewardsContractRef::new(env.clone(), address)
            }),
        );
        self.or_revert(adapter.ensure_staking_token(&vault));

        self.asset.set(asset);
        self.vault.set(vault);
        self.staking.set(staking);
        self.governance.set(governance);
        self.management.set(caller);
        self.pending_management.set(None);
        self.keeper.set(caller);
        self.reward_tokens.set(Vec::new());
        self.trade_factory.set(None);
        self.swap_target.set(swap_target);
        self.shutdown.set(false);

        // Allowances are granted once, unlimited
        cep18_ref(env.clone(), asset).approve(vault, U256::MAX);
        if let Some(staking) = staking {
            Cep4626VaultContractRef::new(env.clone(), vault).approve(staking, U256::MAX);
        }

        env.emit_event(events::StrategyInitialized {
            asset,
            vault,
            staking,
            governance,
            management: caller,
        });
    }

    // ==========================================
    // Staking
    // ==========================================

    /// Stake every loose vault share. No-op when unstaked or nothing is loose.
    pub fn stake_idle(&mut self) {
        let staked = self.adapter().stake_idle();
        if !staked.is_zero() {
            self.env().emit_event(events::IdleStaked { shares: staked });
        }
    }

    /// Unstake `shares` vault shares back to loose custody (keeper or management)
    pub fn unstake(&mut self, shares: U256) {
        self.require_keeper_or_management();
        let unstaked = self.or_revert(self.adapter().unstake(shares));
        if !unstaked.is_zero() {
            self.env().emit_event(events::Unstaked { shares: unstaked });
        }
    }

    /// Claim accrued staking rewards into the strategy
    pub fn claim_rewards(&mut self) {
        if self.adapter().claim_rewards() {
            self.env().emit_event(events::RewardsClaimed {
                by: self.env().caller(),
            });
        }
    }

    /// Vault shares held by the staking facility for this strategy
    pub fn staked_balance(&self) -> U256 {
        self.adapter().staked_balance()
    }

    /// Vault shares held directly by this strategy
    pub fn loose_shares(&self) -> U256 {
        self.adapter().loose_shares()
    }

    pub fn total_vault_shares(&self) -> U256 {
        self.adapter().total_shares()
    }

    /// Asset amount redeemable right now out of staked shares
    pub fn max_withdrawable(&self) -> U256 {
        self.adapter().max_withdrawable()
    }

    /// Asset amount the vault accepts from this strategy right now
    pub fn available_deposit_capacity(&self) -> U256 {
        self.adapter().available_deposit_capacity()
    }

    // ==========================================
    // Position
    // ==========================================

    /// Asset held by the strategy outside the vault
    pub fn idle_assets(&self) -> U256 {
        let asset = cep18_ref(self.env(), self.asset_address());
        asset.balance_of(self.env().self_address())
    }

    /// Idle asset plus the value of every vault share owned
    pub fn estimated_total_assets(&self) -> U256 {
        self.idle_assets() + self.adapter().value_of_vault()
    }

    /// Asset amount that can leave the strategy right now.
    ///
    /// Sums the per-layer ceilings. Against a vault that pools redemption
    /// liquidity across holders this is an upper bound.
    pub fn available_withdraw_limit(&self) -> U256 {
        let adapter = self.adapter();
        self.idle_assets() + adapter.loose_withdrawable() + adapter.max_withdrawable()
    }

    /// Deposit `amount` of idle asset into the vault and stake the shares
    pub fn deploy_funds(&mut self, amount: U256) {
        self.require_keeper_or_management();
        self.require_not_shutdown();
        if amount.is_zero() {
            self.env().revert(StrategyError::ZeroAmount);
        }
        if amount > self.idle_assets() {
            self.env().revert(StrategyError::InsufficientIdleAsset);
        }

        let shares = self.adapter().deploy(amount);
        self.env().emit_event(events::FundsDeployed {
            assets: amount,
            shares,
        });
    }

    /// Withdraw `amount` of asset from the vault back to idle
    pub fn free_funds(&mut self, amount: U256) {
        self.require_keeper_or_management();
        if amount.is_zero() {
            self.env().revert(StrategyError::ZeroAmount);
        }

        let shares = self.or_revert(self.adapter().free(amount));
        self.env().emit_event(events::FundsFreed {
            assets: amount,
            shares,
        });
    }

    /// Claim rewards, redeploy idle asset up to the vault's capacity and
    /// return the total assets under management.
    pub fn report(&mut self) -> U256 {
        self.require_keeper_or_management();

        let mut adapter = self.adapter();
        if adapter.claim_rewards() {
            self.env().emit_event(events::RewardsClaimed {
                by: self.env().caller(),
            });
        }

        if !self.is_shutdown() {
            let deployable = self.idle_assets().min(adapter.available_deposit_capacity());
            if !deployable.is_zero() {
                let shares = adapter.deploy(deployable);
                self.env().emit_event(events::FundsDeployed {
                    assets: deployable,
                    shares,
                });
            }
        }

        let total_assets = self.estimated_total_assets();
        self.env().emit_event(events::Reported { total_assets });
        total_assets
    }

    // ==========================================
    // Reward Registry
    // ==========================================

    /// Register `token` for auctioning (management only)
    pub fn add_reward_token(&mut self, token: Address) {
        self.require_management();

        let mut set = self.reward_token_set();
        let added = self.or_revert(set.insert(token, &self.protected_tokens()));
        if !added {
            return;
        }
        self.reward_tokens.set(set.into_stored());

        if let Some(factory) = self.trade_factory.get_or_default() {
            cep18_ref(self.env(), token).approve(factory, U256::MAX);
            let mut trading = TradeFactoryContractRef::new(self.env(), factory);
            RewardTrading::enable(&mut trading, token, self.swap_target_token());
        }

        self.env().emit_event(events::RewardTokenAdded { token });
    }

    /// Deregister `token`. Absent tokens are ignored (management only).
    pub fn remove_reward_token(&mut self, token: Address) {
        self.require_management();

        let mut set = self.reward_token_set();
        if !set.remove(&token) {
            return;
        }
        self.reward_tokens.set(set.into_stored());

        if let Some(factory) = self.trade_factory.get_or_default() {
            cep18_ref(self.env(), token).approve(factory, U256::zero());
            let mut trading = TradeFactoryContractRef::new(self.env(), factory);
            RewardTrading::disable(&mut trading, token, self.swap_target_token());
        }

        self.env().emit_event(events::RewardTokenRemoved { token });
    }

    pub fn reward_tokens(&self) -> Vec<Address> {
        self.reward_tokens.get_or_default()
    }

    pub fn is_reward_token(&self, token: Address) -> bool {
        self.reward_token_set().contains(&token)
    }

    /// Replace the trade factory (governance only).
    ///
    /// The previous factory loses every allowance and enabled pair; the new
    /// one receives them for all registered tokens.
    pub fn set_trade_factory(&mut self, trade_factory: Option<Address>) {
        self.require_governance();

        let set = self.reward_token_set();
        let target = self.swap_target_token();
        let previous = self.trade_factory.get_or_default();

        if let Some(old) = previous {
            for token in set.tokens() {
                cep18_ref(self.env(), *token).approve(old, U256::zero());
            }
            let mut trading = TradeFactoryContractRef::new(self.env(), old);
            rewards::disable_all(&set, &mut trading, target);
        }

        self.trade_factory.set(trade_factory);

        if let Some(new) = trade_factory {
            for token in set.tokens() {
                cep18_ref(self.env(), *token).approve(new, U256::MAX);
            }
            let mut trading = TradeFactoryContractRef::new(self.env(), new);
            rewards::enable_all(&set, &mut trading, target);
        }

        self.env().emit_event(events::TradeFactorySet {
            previous,
            current: trade_factory,
        });
    }

    pub fn trade_factory(&self) -> Option<Address> {
        self.trade_factory.get_or_default()
    }

    pub fn swap_target(&self) -> SwapTarget {
        self.swap_target.get_or_default()
    }

    // ==========================================
    // Sweep
    // ==========================================

    /// Send the whole balance of a stray `token` to governance (governance only)
    pub fn sweep(&mut self, token: Address) {
        self.require_governance();
        self.or_revert(self.protected_tokens().ensure_unprotected(&token));

        let governance = self.governance_address();
        let mut stray = cep18_ref(self.env(), token);
        let amount = stray.balance_of(self.env().self_address());
        if amount.is_zero() {
            return;
        }
        stray.transfer(governance, amount);

        self.env().emit_event(events::Swept {
            token,
            amount,
            to: governance,
        });
    }

    // ==========================================
    // Roles
    // ==========================================

    /// Nominate the next management (management only)
    pub fn set_pending_management(&mut self, pending: Address) {
        self.require_management();
        self.pending_management.set(Some(pending));
        self.env().emit_event(events::ManagementTransferInitiated {
            current: self.env().caller(),
            pending,
        });
    }

    /// Complete a management transfer (pending management only)
    pub fn accept_management(&mut self) {
        let caller = self.env().caller();
        match self.pending_management.get_or_default() {
            None => self.env().revert(StrategyError::NoPendingManagement),
            Some(pending) if pending != caller => self.env().revert(StrategyError::Unauthorized),
            Some(_) => {}
        }

        let previous = self.management.get();
        self.management.set(caller);
        self.pending_management.set(None);
        self.env().emit_event(events::ManagementTransferred {
            previous,
            current: caller,
        });
    }

    pub fn set_keeper(&mut self, keeper: Address) {
        self.require_management();
        self.keeper.set(keeper);
        self.env().emit_event(events::KeeperSet { keeper });
    }

    pub fn governance(&self) -> Option<Address> {
        self.governance.get()
    }

    pub fn management(&self) -> Option<Address> {
        self.management.get()
    }

    pub fn pending_management(&self) -> Option<Address> {
        self.pending_management.get_or_default()
    }

    pub fn keeper(&self) -> Option<Address> {
        self.keeper.get()
    }

    pub fn staking(&self) -> Option<Address> {
        self.staking.get_or_default()
    }

    pub fn asset(&self) -> Option<Address> {
        self.asset.get()
    }

    pub fn vault(&self) -> Option<Address> {
        self.vault.get()
    }

    // ==========================================
    // Shutdown
    // ==========================================

    /// Stop deploying funds. One way (management only).
    pub fn shutdown(&mut self) {
        self.require_management();
        self.require_not_shutdown();
        self.shutdown.set(true);
        self.env().emit_event(events::ShutdownTriggered {
            by: self.env().caller(),
        });
    }

    /// Free up to `amount` of asset after shutdown, capped by what the vault
    /// will redeem (management only)
    pub fn emergency_withdraw(&mut self, amount: U256) {
        self.require_management();
        if !self.is_shutdown() {
            self.env().revert(StrategyError::NotShutdown);
        }

        let assets = self.or_revert(self.adapter().free_up_to(amount));
        if assets.is_zero() {
            return;
        }
        self.env().emit_event(events::EmergencyWithdrawn { assets });
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.get_or_default()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn adapter(&self) -> LiveAdapter {
        let env = self.env();
        let vault = Cep4626VaultContractRef::new(env.clone(), self.vault_address());
        let staking = Staking::from_config(self.staking.get_or_default(), |address| {
            StakingRewardsContractRef::new(env.clone(), address)
        });
        StakingAdapter::new(env.self_address(), vault, staking)
    }

    fn reward_token_set(&self) -> RewardTokenSet {
        RewardTokenSet::from_stored(self.reward_tokens.get_or_default())
    }

    fn protected_tokens(&self) -> ProtectedTokens {
        ProtectedTokens::new(self.asset_address(), self.vault_address())
    }

    fn swap_target_token(&self) -> Address {
        match self.swap_target.get_or_default() {
            SwapTarget::VaultShare => self.vault_address(),
            SwapTarget::Asset => self.asset_address(),
        }
    }

    fn asset_address(&self) -> Address {
        self.asset.get_or_revert_with(StrategyError::NotInitialized)
    }

    fn vault_address(&self) -> Address {
        self.vault.get_or_revert_with(StrategyError::NotInitialized)
    }

    fn governance_address(&self) -> Address {
        self.governance.get_or_revert_with(StrategyError::NotInitialized)
    }

    fn require_governance(&self) {
        self.or_revert(ensure_role(&self.env().caller(), self.governance.get()));
    }

    fn require_management(&self) {
        self.or_revert(ensure_role(&self.env().caller(), self.management.get()));
    }

    fn require_keeper_or_management(&self) {
        let holders = [self.keeper.get(), self.management.get()];
        self.or_revert(ensure_any_role(&self.env().caller(), &holders));
    }

    fn require_not_shutdown(&self) {
        if self.is_shutdown() {
            self.env().revert(StrategyError::StrategyShutdown);
        }
    }

    fn or_revert<T>(&self, result: Result<T, StrategyError>) -> T {
        result.unwrap_or_else(|error| self.env().revert(error))
    }
}

//! Shared deployment helpers for strategy integration tests.

#![allow(dead_code)]

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv};
use odra::prelude::*;

use staked_vault_casper::mocks::{
    MockStakingRewards, MockStakingRewardsHostRef, MockStakingRewardsInitArgs, MockVault,
    MockVaultHostRef, MockVaultInitArgs,
};
use staked_vault_casper::strategy::{
    StakedVaultStrategy, StakedVaultStrategyHostRef, StakedVaultStrategyInitArgs, SwapTarget,
};
use staked_vault_casper::tokens::{TestToken, TestTokenHostRef, TestTokenInitArgs};

/// Deployed contracts plus the role holders
pub struct Setup {
    pub env: HostEnv,
    pub asset: TestTokenHostRef,
    pub reward: TestTokenHostRef,
    pub vault: MockVaultHostRef,
    pub staking: MockStakingRewardsHostRef,
    pub strategy: StakedVaultStrategyHostRef,
    pub management: Address,
    pub governance: Address,
    pub outsider: Address,
}

pub fn tokens(amount: u64) -> U256 {
    U256::from(amount)
}

pub fn deploy_token(env: &HostEnv, symbol: &str) -> TestTokenHostRef {
    TestToken::deploy(
        env,
        TestTokenInitArgs {
            symbol: symbol.to_string(),
            name: format!("Test {}", symbol),
        },
    )
}

fn deploy_collaborators(env: &HostEnv) -> (TestTokenHostRef, TestTokenHostRef, MockVaultHostRef) {
    let asset = deploy_token(env, "AST");
    let reward = deploy_token(env, "RWD");
    let vault = MockVault::deploy(
        env,
        MockVaultInitArgs {
            asset: asset.address(),
            symbol: "yvAST".to_string(),
            name: "Vault Shares".to_string(),
        },
    );
    (asset, reward, vault)
}

/// Staked strategy: account 0 deploys (management), account 1 governs
pub fn setup() -> Setup {
    setup_with_target(SwapTarget::VaultShare)
}

pub fn setup_with_target(swap_target: SwapTarget) -> Setup {
    let env = odra_test::env();
    let management = env.get_account(0);
    let governance = env.get_account(1);
    let outsider = env.get_account(2);

    env.set_caller(management);
    let (asset, reward, vault) = deploy_collaborators(&env);
    let staking = MockStakingRewards::deploy(
        &env,
        MockStakingRewardsInitArgs {
            staking_token: vault.address(),
            reward_token: reward.address(),
        },
    );
    let strategy = StakedVaultStrategy::deploy(
        &env,
        StakedVaultStrategyInitArgs {
            asset: asset.address(),
            vault: vault.address(),
            staking: Some(staking.address()),
            governance,
            swap_target,
        },
    );

    Setup {
        env,
        asset,
        reward,
        vault,
        staking,
        strategy,
        management,
        governance,
        outsider,
    }
}

/// Strategy deployed without a staking facility. The returned facility is
/// deployed but not wired to the strategy.
pub fn setup_unstaked() -> Setup {
    let env = odra_test::env();
    let management = env.get_account(0);
    let governance = env.get_account(1);
    let outsider = env.get_account(2);

    env.set_caller(management);
    let (asset, reward, vault) = deploy_collaborators(&env);
    let staking = MockStakingRewards::deploy(
        &env,
        MockStakingRewardsInitArgs {
            staking_token: vault.address(),
            reward_token: reward.address(),
        },
    );
    let strategy = StakedVaultStrategy::deploy(
        &env,
        StakedVaultStrategyInitArgs {
            asset: asset.address(),
            vault: vault.address(),
            staking: None,
            governance,
            swap_target: SwapTarget::VaultShare,
        },
    );

    Setup {
        env,
        asset,
        reward,
        vault,
        staking,
        strategy,
        management,
        governance,
        outsider,
    }
}

impl Setup {
    /// Mints `amount` of asset to the strategy and deploys it as management
    pub fn fund_and_deploy(&mut self, amount: U256) {
        self.env.set_caller(self.management);
        self.asset.faucet_mint(self.strategy.address(), amount);
        self.strategy.deploy_funds(amount);
    }

    /// Gives `to` vault shares by depositing on their behalf
    pub fn mint_shares(&mut self, to: Address, amount: U256) {
        self.env.set_caller(to);
        self.asset.faucet_mint(to, amount);
        self.asset.approve(self.vault.address(), amount);
        self.vault.deposit(amount, to);
    }

    /// Raises the vault share price by sending asset straight to the vault
    pub fn donate_to_vault(&mut self, amount: U256) {
        self.asset.faucet_mint(self.vault.address(), amount);
    }
}

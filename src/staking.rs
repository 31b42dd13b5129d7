//! Staking core: moves vault shares between loose custody and the staking
//! facility and derives withdrawal ceilings across both layers.
//!
//! Share accounting:
//! - loose shares: vault shares held directly by the strategy
//! - staked shares: vault shares held by the facility for the strategy,
//!   always read from the facility, never cached
//! - loose + staked = total vault shares owned
//!
//! ## Modes
//! The mode is fixed at construction. In `Unstaked` mode every staking
//! operation is a no-op and the staked balance reads as zero.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::capability::{StakingFacility, VaultPosition};
use crate::errors::StrategyError;

/// Staking mode of the strategy
pub enum Staking<S> {
    Staked { address: Address, facility: S },
    Unstaked,
}

impl<S> Staking<S> {
    pub fn from_config(address: Option<Address>, connect: impl FnOnce(Address) -> S) -> Self {
        match address {
            Some(address) => Staking::Staked {
                address,
                facility: connect(address),
            },
            None => Staking::Unstaked,
        }
    }
}

/// Cross-layer share accounting for one strategy
pub struct StakingAdapter<V, S> {
    holder: Address,
    vault: V,
    staking: Staking<S>,
}

impl<V: VaultPosition, S: StakingFacility> StakingAdapter<V, S> {
    pub fn new(holder: Address, vault: V, staking: Staking<S>) -> Self {
        Self {
            holder,
            vault,
            staking,
        }
    }

    /// Construction check: the facility must stake the vault share token
    pub fn ensure_staking_token(&self, vault_token: &Address) -> Result<(), StrategyError> {
        match &self.staking {
            Staking::Staked { facility, .. } => {
                if facility.staking_token_address() != *vault_token {
                    return Err(StrategyError::TokenMismatch);
                }
                Ok(())
            }
            Staking::Unstaked => Ok(()),
        }
    }

    /// Vault shares held directly by the strategy
    pub fn loose_shares(&self) -> U256 {
        self.vault.share_balance_of(self.holder)
    }

    /// Vault shares held by the facility for the strategy
    pub fn staked_balance(&self) -> U256 {
        match &self.staking {
            Staking::Staked { facility, .. } => facility.balance_of(self.holder),
            Staking::Unstaked => U256::zero(),
        }
    }

    pub fn total_shares(&self) -> U256 {
        self.loose_shares() + self.staked_balance()
    }

    /// Stakes every loose share. Returns the amount staked.
    pub fn stake_idle(&mut self) -> U256 {
        let loose = self.vault.share_balance_of(self.holder);
        match &mut self.staking {
            Staking::Staked { facility, .. } => {
                if loose.is_zero() {
                    return U256::zero();
                }
                facility.stake(loose);
                loose
            }
            Staking::Unstaked => U256::zero(),
        }
    }

    /// Moves `shares` from the facility back to loose custody.
    /// Returns the amount actually unstaked.
    pub fn unstake(&mut self, shares: U256) -> Result<U256, StrategyError> {
        match &mut self.staking {
            Staking::Staked { facility, .. } => {
                if shares.is_zero() {
                    return Ok(U256::zero());
                }
                facility.withdraw(shares)?;
                Ok(shares)
            }
            Staking::Unstaked => Ok(U256::zero()),
        }
    }

    /// Claims accrued rewards into the strategy. Returns false in unstaked mode.
    pub fn claim_rewards(&mut self) -> bool {
        match &mut self.staking {
            Staking::Staked { facility, .. } => {
                facility.claim_reward();
                true
            }
            Staking::Unstaked => false,
        }
    }

    /// Assets redeemable right now out of the staked layer.
    ///
    /// Bounded by both the staked balance and the vault's redemption ceiling
    /// for the facility; the tighter of the two wins.
    pub fn max_withdrawable(&self) -> U256 {
        match &self.staking {
            Staking::Staked { address, facility } => {
                let staked = facility.balance_of(self.holder);
                let ceiling = self.vault.max_redeem_for(*address);
                self.vault.convert_shares_to_assets(staked.min(ceiling))
            }
            Staking::Unstaked => U256::zero(),
        }
    }

    /// Assets redeemable right now out of loose shares
    pub fn loose_withdrawable(&self) -> U256 {
        let loose = self.loose_shares();
        if loose.is_zero() {
            return U256::zero();
        }
        let ceiling = self.vault.max_redeem_for(self.holder);
        self.vault.convert_shares_to_assets(loose.min(ceiling))
    }

    pub fn available_deposit_capacity(&self) -> U256 {
        self.vault.max_deposit_for(self.holder)
    }

    /// Asset value of every vault share owned, staked or not
    pub fn value_of_vault(&self) -> U256 {
        self.vault.convert_shares_to_assets(self.total_shares())
    }

    /// Deposits `assets` into the vault and stakes the minted shares.
    /// Returns the shares minted.
    pub fn deploy(&mut self, assets: U256) -> U256 {
        let holder = self.holder;
        let minted = self.vault.deposit(assets, holder);
        self.stake_idle();
        minted
    }

    /// Withdraws `assets` from the vault, unstaking whatever loose shares
    /// cannot cover. Returns the shares burned.
    pub fn free(&mut self, assets: U256) -> Result<U256, StrategyError> {
        let needed = self.vault.shares_for_withdraw(assets);
        let loose = self.loose_shares();
        if needed > loose {
            let missing = (needed - loose).min(self.staked_balance());
            self.unstake(missing)?;
        }
        let holder = self.holder;
        Ok(self.vault.withdraw(assets, holder))
    }

    /// Frees at most `assets`, capped by what the vault lets the strategy
    /// redeem once the missing shares are unstaked. Returns the assets freed.
    ///
    /// A vault may pool liquidity across the strategy and the facility, so
    /// `loose_withdrawable + max_withdrawable` is only an upper bound here.
    pub fn free_up_to(&mut self, assets: U256) -> Result<U256, StrategyError> {
        let needed = self.vault.shares_for_withdraw(assets);
        let loose = self.loose_shares();
        if needed > loose {
            let redeemable = match &self.staking {
                Staking::Staked { address, facility } => facility
                    .balance_of(self.holder)
                    .min(self.vault.max_redeem_for(*address)),
                Staking::Unstaked => U256::zero(),
            };
            self.unstake((needed - loose).min(redeemable))?;
        }

        let freed = assets.min(self.loose_withdrawable());
        if freed.is_zero() {
            return Ok(U256::zero());
        }
        let holder = self.holder;
        self.vault.withdraw(freed, holder);
        Ok(freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use odra::casper_types::account::AccountHash;

    fn account(byte: u8) -> Address {
        Address::Account(AccountHash::new([byte; 32]))
    }

    fn strategy() -> Address {
        account(1)
    }

    fn vault_token() -> Address {
        account(2)
    }

    fn facility_address() -> Address {
        account(3)
    }

    /// Shared ledger standing in for the vault and the facility.
    /// Only the strategy and the facility ever hold shares.
    #[derive(Default)]
    struct Ledger {
        strategy_shares: U256,
        facility_shares: U256,
        staked: U256,
        total_assets: U256,
        total_shares: U256,
        facility_redeem_cap: Option<U256>,
        // Redemption pool shared by every holder
        shared_liquidity: Option<U256>,
        deposit_cap: Option<U256>,
        claims: u32,
    }

    impl Ledger {
        fn shares_of(&self, owner: &Address) -> U256 {
            if *owner == strategy() {
                self.strategy_shares
            } else if *owner == facility_address() {
                self.facility_shares
            } else {
                U256::zero()
            }
        }

        fn to_assets(&self, shares: U256) -> U256 {
            if self.total_shares.is_zero() {
                return U256::zero();
            }
            shares * self.total_assets / self.total_shares
        }
    }

    struct FakeVault(Rc<RefCell<Ledger>>);

    impl VaultPosition for FakeVault {
        fn share_balance_of(&self, owner: Address) -> U256 {
            self.0.borrow().shares_of(&owner)
        }

        fn max_deposit_for(&self, _receiver: Address) -> U256 {
            self.0.borrow().deposit_cap.unwrap_or(U256::MAX)
        }

        fn max_redeem_for(&self, owner: Address) -> U256 {
            let ledger = self.0.borrow();
            let ceiling = match ledger.facility_redeem_cap {
                Some(cap) if owner == facility_address() => cap,
                _ => ledger.shares_of(&owner),
            };
            match ledger.shared_liquidity {
                Some(pool) => ceiling.min(pool),
                None => ceiling,
            }
        }

        fn convert_shares_to_assets(&self, shares: U256) -> U256 {
            self.0.borrow().to_assets(shares)
        }

        fn shares_for_withdraw(&self, assets: U256) -> U256 {
            let ledger = self.0.borrow();
            if ledger.total_assets.is_zero() {
                return assets;
            }
            (assets * ledger.total_shares + ledger.total_assets - U256::one()) / ledger.total_assets
        }

        fn deposit(&mut self, assets: U256, _receiver: Address) -> U256 {
            let mut ledger = self.0.borrow_mut();
            let minted = if ledger.total_shares.is_zero() {
                assets
            } else {
                assets * ledger.total_shares / ledger.total_assets
            };
            ledger.total_assets = ledger.total_assets + assets;
            ledger.total_shares = ledger.total_shares + minted;
            ledger.strategy_shares = ledger.strategy_shares + minted;
            minted
        }

        fn withdraw(&mut self, assets: U256, _holder: Address) -> U256 {
            let burned = self.shares_for_withdraw(assets);
            let mut ledger = self.0.borrow_mut();
            assert!(ledger.strategy_shares >= burned, "insufficient loose shares");
            ledger.strategy_shares = ledger.strategy_shares - burned;
            ledger.total_shares = ledger.total_shares - burned;
            ledger.total_assets = ledger.total_assets - assets;
            burned
        }
    }

    struct FakeFacility {
        ledger: Rc<RefCell<Ledger>>,
        token: Address,
    }

    impl StakingFacility for FakeFacility {
        fn staking_token_address(&self) -> Address {
            self.token
        }

        fn balance_of(&self, account: Address) -> U256 {
            if account == strategy() {
                self.ledger.borrow().staked
            } else {
                U256::zero()
            }
        }

        fn stake(&mut self, shares: U256) {
            let mut ledger = self.ledger.borrow_mut();
            assert!(ledger.strategy_shares >= shares, "stake exceeds loose shares");
            ledger.strategy_shares = ledger.strategy_shares - shares;
            ledger.facility_shares = ledger.facility_shares + shares;
            ledger.staked = ledger.staked + shares;
        }

        fn withdraw(&mut self, shares: U256) -> Result<(), StrategyError> {
            let mut ledger = self.ledger.borrow_mut();
            if shares > ledger.staked {
                return Err(StrategyError::InsufficientStakedBalance);
            }
            ledger.staked = ledger.staked - shares;
            ledger.facility_shares = ledger.facility_shares - shares;
            ledger.strategy_shares = ledger.strategy_shares + shares;
            Ok(())
        }

        fn claim_reward(&mut self) {
            self.ledger.borrow_mut().claims += 1;
        }
    }

    fn staked_adapter(ledger: &Rc<RefCell<Ledger>>) -> StakingAdapter<FakeVault, FakeFacility> {
        let facility = FakeFacility {
            ledger: ledger.clone(),
            token: vault_token(),
        };
        StakingAdapter::new(
            strategy(),
            FakeVault(ledger.clone()),
            Staking::Staked {
                address: facility_address(),
                facility,
            },
        )
    }

    fn unstaked_adapter(ledger: &Rc<RefCell<Ledger>>) -> StakingAdapter<FakeVault, FakeFacility> {
        StakingAdapter::new(strategy(), FakeVault(ledger.clone()), Staking::Unstaked)
    }

    /// Ledger where the strategy holds `loose` freshly minted shares at 1:1
    fn ledger_with_loose(loose: u64) -> Rc<RefCell<Ledger>> {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        FakeVault(ledger.clone()).deposit(U256::from(loose), strategy());
        ledger
    }

    #[test]
    fn test_token_mismatch_detected() {
        let ledger = ledger_with_loose(0);
        let adapter = staked_adapter(&ledger);
        assert!(adapter.ensure_staking_token(&vault_token()).is_ok());
        assert!(matches!(
            adapter.ensure_staking_token(&account(9)),
            Err(StrategyError::TokenMismatch)
        ));
        assert!(unstaked_adapter(&ledger)
            .ensure_staking_token(&account(9))
            .is_ok());
    }

    #[test]
    fn test_stake_idle_moves_all_loose_shares() {
        let ledger = ledger_with_loose(100);
        let mut adapter = staked_adapter(&ledger);

        assert_eq!(adapter.stake_idle(), U256::from(100u64));
        assert_eq!(adapter.loose_shares(), U256::zero());
        assert_eq!(adapter.staked_balance(), U256::from(100u64));
        assert_eq!(adapter.total_shares(), U256::from(100u64));
    }

    #[test]
    fn test_stake_idle_with_nothing_loose_is_noop() {
        let ledger = ledger_with_loose(0);
        let mut adapter = staked_adapter(&ledger);
        assert_eq!(adapter.stake_idle(), U256::zero());
        assert_eq!(adapter.staked_balance(), U256::zero());
    }

    #[test]
    fn test_unstake_keeps_share_total() {
        let ledger = ledger_with_loose(100);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();

        assert!(adapter.unstake(U256::from(30u64)).is_ok());
        assert_eq!(adapter.loose_shares(), U256::from(30u64));
        assert_eq!(adapter.staked_balance(), U256::from(70u64));
        assert_eq!(adapter.total_shares(), U256::from(100u64));
    }

    #[test]
    fn test_unstake_more_than_staked_fails() {
        let ledger = ledger_with_loose(50);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();

        assert!(matches!(
            adapter.unstake(U256::from(51u64)),
            Err(StrategyError::InsufficientStakedBalance)
        ));
        assert_eq!(adapter.staked_balance(), U256::from(50u64));
        assert_eq!(adapter.loose_shares(), U256::zero());
    }

    #[test]
    fn test_unstaked_mode_is_noop() {
        let ledger = ledger_with_loose(100);
        let mut adapter = unstaked_adapter(&ledger);

        assert_eq!(adapter.stake_idle(), U256::zero());
        assert!(adapter.unstake(U256::from(10u64)).is_ok());
        assert!(!adapter.claim_rewards());
        assert_eq!(adapter.loose_shares(), U256::from(100u64));
        assert_eq!(adapter.staked_balance(), U256::zero());
        assert_eq!(adapter.max_withdrawable(), U256::zero());
        assert_eq!(ledger.borrow().claims, 0);
    }

    #[test]
    fn test_claim_rewards_calls_facility() {
        let ledger = ledger_with_loose(0);
        let mut adapter = staked_adapter(&ledger);
        assert!(adapter.claim_rewards());
        assert!(adapter.claim_rewards());
        assert_eq!(ledger.borrow().claims, 2);
    }

    #[test]
    fn test_max_withdrawable_bound_by_staked_balance() {
        // 50 staked, facility may redeem 80, price 2 assets per share
        let ledger = ledger_with_loose(50);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();
        {
            let mut l = ledger.borrow_mut();
            l.total_assets = U256::from(100u64);
            l.facility_redeem_cap = Some(U256::from(80u64));
        }
        assert_eq!(adapter.max_withdrawable(), U256::from(100u64));
    }

    #[test]
    fn test_max_withdrawable_bound_by_vault_ceiling() {
        let ledger = ledger_with_loose(50);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();
        ledger.borrow_mut().facility_redeem_cap = Some(U256::from(20u64));
        assert_eq!(adapter.max_withdrawable(), U256::from(20u64));
    }

    #[test]
    fn test_max_withdrawable_zero_edges() {
        let ledger = ledger_with_loose(50);
        let mut adapter = staked_adapter(&ledger);
        assert_eq!(adapter.max_withdrawable(), U256::zero());

        adapter.stake_idle();
        ledger.borrow_mut().facility_redeem_cap = Some(U256::zero());
        assert_eq!(adapter.max_withdrawable(), U256::zero());
    }

    #[test]
    fn test_max_withdrawable_zero_when_nothing_staked() {
        let ledger = ledger_with_loose(50);
        let adapter = staked_adapter(&ledger);
        ledger.borrow_mut().facility_redeem_cap = Some(U256::from(80u64));

        assert_eq!(adapter.staked_balance(), U256::zero());
        assert_eq!(adapter.max_withdrawable(), U256::zero());
    }

    #[test]
    fn test_free_up_to_respects_shared_liquidity() {
        // 40 loose, 60 staked, one pool of 30 shares behind both holders
        let ledger = ledger_with_loose(100);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();
        assert!(adapter.unstake(U256::from(40u64)).is_ok());
        ledger.borrow_mut().shared_liquidity = Some(U256::from(30u64));

        let summed = adapter.loose_withdrawable() + adapter.max_withdrawable();
        assert_eq!(summed, U256::from(60u64));

        let freed = adapter.free_up_to(U256::from(1_000u64));
        assert!(matches!(freed, Ok(amount) if amount == U256::from(30u64)));
        assert_eq!(adapter.loose_shares(), U256::from(40u64));
        assert_eq!(adapter.staked_balance(), U256::from(30u64));
    }

    #[test]
    fn test_free_up_to_with_nothing_redeemable() {
        let ledger = ledger_with_loose(20);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();
        ledger.borrow_mut().shared_liquidity = Some(U256::zero());

        assert!(matches!(adapter.free_up_to(U256::from(10u64)), Ok(amount) if amount.is_zero()));
        assert_eq!(adapter.staked_balance(), U256::from(20u64));
    }

    #[test]
    fn test_staked_balance_not_cached() {
        let ledger = ledger_with_loose(100);
        let mut adapter = staked_adapter(&ledger);
        adapter.stake_idle();
        ledger.borrow_mut().staked = U256::from(60u64);
        assert_eq!(adapter.staked_balance(), U256::from(60u64));
    }

    #[test]
    fn test_loose_withdrawable_uses_own_ceiling() {
        let ledger = ledger_with_loose(100);
        let mut adapter = staked_adapter(&ledger);
        assert_eq!(adapter.loose_withdrawable(), U256::from(100u64));
        adapter.stake_idle();
        assert_eq!(adapter.loose_withdrawable(), U256::zero());
    }

    #[test]
    fn test_deploy_stakes_minted_shares() {
        let ledger = ledger_with_loose(0);
        let mut adapter = staked_adapter(&ledger);
        assert_eq!(adapter.deploy(U256::from(40u64)), U256::from(40u64));
        assert_eq!(adapter.loose_shares(), U256::zero());
        assert_eq!(adapter.staked_balance(), U256::from(40u64));
        assert_eq!(adapter.value_of_vault(), U256::from(40u64));
    }

    #[test]
    fn test_free_unstakes_only_missing_shares() {
        let ledger = ledger_with_loose(0);
        let mut adapter = staked_adapter(&ledger);
        adapter.deploy(U256::from(100u64));
        assert!(adapter.unstake(U256::from(10u64)).is_ok());

        let burned = adapter.free(U256::from(25u64));
        assert!(matches!(burned, Ok(b) if b == U256::from(25u64)));
        assert_eq!(adapter.loose_shares(), U256::zero());
        assert_eq!(adapter.staked_balance(), U256::from(75u64));
    }

    #[test]
    fn test_deposit_capacity_passes_through() {
        let ledger = ledger_with_loose(0);
        ledger.borrow_mut().deposit_cap = Some(U256::from(500u64));
        let adapter = staked_adapter(&ledger);
        assert_eq!(adapter.available_deposit_capacity(), U256::from(500u64));
    }
}

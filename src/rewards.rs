//! Reward token registry.
//!
//! The set of tokens the trade factory may auction. Order is irrelevant and
//! the protected tokens can never enter it.

use odra::prelude::*;

use crate::access::ProtectedTokens;
use crate::capability::RewardTrading;
use crate::errors::StrategyError;

/// Set of reward tokens eligible for claiming and selling
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardTokenSet {
    tokens: Vec<Address>,
}

impl RewardTokenSet {
    pub fn from_stored(tokens: Vec<Address>) -> Self {
        Self { tokens }
    }

    pub fn into_stored(self) -> Vec<Address> {
        self.tokens
    }

    pub fn tokens(&self) -> &[Address] {
        &self.tokens
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Adds `token`. Returns false if it was already present.
    pub fn insert(
        &mut self,
        token: Address,
        protected: &ProtectedTokens,
    ) -> Result<bool, StrategyError> {
        protected.ensure_unprotected(&token)?;
        if self.contains(&token) {
            return Ok(false);
        }
        self.tokens.push(token);
        Ok(true)
    }

    /// Removes `token`. Returns false if it was absent.
    pub fn remove(&mut self, token: &Address) -> bool {
        match self.tokens.iter().position(|t| t == token) {
            Some(index) => {
                self.tokens.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

/// Enables every registered token for sale into `target`
pub fn enable_all<T: RewardTrading>(set: &RewardTokenSet, trading: &mut T, target: Address) {
    for token in set.tokens() {
        trading.enable(*token, target);
    }
}

/// Disables every registered token
pub fn disable_all<T: RewardTrading>(set: &RewardTokenSet, trading: &mut T, target: Address) {
    for token in set.tokens() {
        trading.disable(*token, target);
    }
}

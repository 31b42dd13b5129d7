//! Authorization and protected-token guards.
//!
//! Entry points call these before touching state and revert with the
//! returned error.

use odra::prelude::*;

use crate::errors::StrategyError;

/// Tokens that make up managed principal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtectedTokens {
    pub asset: Address,
    pub vault: Address,
}

impl ProtectedTokens {
    pub fn new(asset: Address, vault: Address) -> Self {
        Self { asset, vault }
    }

    pub fn is_protected(&self, token: &Address) -> bool {
        *token == self.asset || *token == self.vault
    }

    /// Rejects the asset and the vault share token
    pub fn ensure_unprotected(&self, token: &Address) -> Result<(), StrategyError> {
        if self.is_protected(token) {
            return Err(StrategyError::ProtectedToken);
        }
        Ok(())
    }
}

/// Caller must be the holder of a role
pub fn ensure_role(caller: &Address, holder: Option<Address>) -> Result<(), StrategyError> {
    ensure_any_role(caller, &[holder])
}

/// Caller must hold at least one of the given roles. Unset roles match nobody.
pub fn ensure_any_role(caller: &Address, holders: &[Option<Address>]) -> Result<(), StrategyError> {
    if holders.iter().flatten().any(|holder| holder == caller) {
        Ok(())
    } else {
        Err(StrategyError::Unauthorized)
    }
}

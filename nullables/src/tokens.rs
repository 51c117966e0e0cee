//! Nullable token ledger: balances per (mint, account).

use gauge_types::Address;
use gauge_voting::{ExternalError, TokenLedger};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct NullTokenLedger {
    balances: HashMap<(Address, Address), u64>,
    /// Number of successful transfers, for assertions.
    transfers: u64,
}

impl NullTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens in `account`.
    pub fn mint_to(
        &mut self,
        mint: &Address,
        account: &Address,
        amount: u64,
    ) -> Result<(), ExternalError> {
        let balance = self.balances.entry((*mint, *account)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| ExternalError::Rejected("balance overflow".into()))?;
        Ok(())
    }

    pub fn total_supply(&self, mint: &Address) -> u64 {
        self.balances
            .iter()
            .filter(|((m, _), _)| m == mint)
            .map(|(_, b)| *b)
            .fold(0u64, u64::saturating_add)
    }

    pub fn transfer_count(&self) -> u64 {
        self.transfers
    }
}

impl TokenLedger for NullTokenLedger {
    fn balance_of(&self, mint: &Address, account: &Address) -> u64 {
        self.balances.get(&(*mint, *account)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        mint: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), ExternalError> {
        let available = self.balance_of(mint, from);
        if available < amount {
            return Err(ExternalError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        if from != to {
            let credited = self
                .balance_of(mint, to)
                .checked_add(amount)
                .ok_or_else(|| ExternalError::Rejected("balance overflow".into()))?;
            self.balances.insert((*mint, *from), available - amount);
            self.balances.insert((*mint, *to), credited);
        }
        self.transfers += 1;
        Ok(())
    }
}

//! Nullable fee pool: a controllable fee accrual counter per gauge target.

use crate::tokens::NullTokenLedger;
use gauge_types::{Address, FeeSide};
use gauge_voting::{ExternalError, FeePool};
use std::collections::HashMap;

/// Tracks cumulative fees per (target, side). Accruing also mints the fee
/// tokens into the pool's fee account so the engine can capture them.
#[derive(Clone, Debug, Default)]
pub struct NullFeePool {
    cumulative: HashMap<(Address, FeeSide), u64>,
}

impl NullFeePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `amount` of new fees for `target` in `mint`.
    pub fn accrue(
        &mut self,
        target: &Address,
        side: FeeSide,
        mint: &Address,
        amount: u64,
        tokens: &mut NullTokenLedger,
    ) -> Result<(), ExternalError> {
        let counter = self.cumulative.get(&(*target, side)).copied().unwrap_or(0);
        let next = counter
            .checked_add(amount)
            .ok_or_else(|| ExternalError::Rejected("fee counter overflow".into()))?;
        tokens.mint_to(mint, &self.fee_account(target, side), amount)?;
        self.cumulative.insert((*target, side), next);
        Ok(())
    }

    /// Force the counter, bypassing token minting. Used to simulate a
    /// misbehaving pool.
    pub fn set_cumulative(&mut self, target: &Address, side: FeeSide, total: u64) {
        self.cumulative.insert((*target, side), total);
    }
}

impl FeePool for NullFeePool {
    fn cumulative_fees(&self, target: &Address, side: FeeSide) -> u64 {
        self.cumulative.get(&(*target, side)).copied().unwrap_or(0)
    }

    fn fee_account(&self, target: &Address, side: FeeSide) -> Address {
        Address::derive(&[b"pool-fees", target.as_bytes(), side.as_str().as_bytes()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauge_voting::TokenLedger;

    #[test]
    fn accrue_bumps_counter_and_funds_account() {
        let mut pool = NullFeePool::new();
        let mut tokens = NullTokenLedger::new();
        let target = Address::derive(&[b"pool-1"]);
        let usdc = Address::derive(&[b"usdc"]);
        pool.accrue(&target, FeeSide::A, &usdc, 250, &mut tokens).unwrap();
        pool.accrue(&target, FeeSide::A, &usdc, 50, &mut tokens).unwrap();
        assert_eq!(pool.cumulative_fees(&target, FeeSide::A), 300);
        assert_eq!(pool.cumulative_fees(&target, FeeSide::B), 0);
        assert_eq!(
            tokens.balance_of(&usdc, &pool.fee_account(&target, FeeSide::A)),
            300
        );
    }
}

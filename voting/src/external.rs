//! Collaborators the engine consumes but does not own.
//!
//! Voting power, fee accrual, reward-share distribution and token custody
//! all live outside the engine. Each is reached through a trait so the
//! engine can be driven by real adapters or by the in-memory doubles in
//! `gauge-nullables`.

use gauge_types::{Address, FeeSide, Timestamp};
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("{0}")]
    Rejected(String),
}

/// Ownership data of a voter's escrow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscrowInfo {
    /// Receives payouts.
    pub owner: Address,
    /// May act on the escrow's votes. Defaults to the owner.
    pub vote_delegate: Address,
}

impl EscrowInfo {
    pub fn is_delegate(&self, authority: &Address) -> bool {
        *authority == self.vote_delegate
    }

    /// Weights may be changed by either the owner or the delegate.
    pub fn can_set_votes(&self, authority: &Address) -> bool {
        *authority == self.owner || self.is_delegate(authority)
    }
}

/// The locker that turns locked value into voting power.
pub trait Escrow {
    fn escrow(&self, voter: &Address) -> Option<EscrowInfo>;

    /// Voting power of `voter` at `at`; non-increasing over time unless the
    /// lock is extended.
    fn voting_power(&self, voter: &Address, at: Timestamp) -> Option<u64>;
}

/// A pool accruing trading fees for a gauge target.
pub trait FeePool {
    /// Running total of fees ever accrued for `target` on `side`.
    fn cumulative_fees(&self, target: &Address, side: FeeSide) -> u64;

    /// Account currently holding the accrued, not yet captured fees.
    fn fee_account(&self, target: &Address, side: FeeSide) -> Address;
}

/// Consumer of per-gauge reward shares (e.g. a liquidity-mining farm).
pub trait RewardShareSink {
    fn set_reward_share(&mut self, target: &Address, share: u64) -> Result<(), ExternalError>;
}

/// Token custody and transfer.
pub trait TokenLedger {
    fn balance_of(&self, mint: &Address, account: &Address) -> u64;

    fn transfer(
        &mut self,
        mint: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), ExternalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegate_and_owner_rights() {
        let owner = Address::derive(&[b"owner"]);
        let delegate = Address::derive(&[b"delegate"]);
        let stranger = Address::derive(&[b"stranger"]);
        let info = EscrowInfo {
            owner,
            vote_delegate: delegate,
        };
        assert!(info.is_delegate(&delegate));
        assert!(!info.is_delegate(&owner));
        assert!(info.can_set_votes(&owner));
        assert!(info.can_set_votes(&delegate));
        assert!(!info.can_set_votes(&stranger));
    }
}

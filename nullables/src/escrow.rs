//! Nullable escrow: locks with linear power decay.

use gauge_types::{Address, Timestamp};
use gauge_voting::{Escrow, EscrowInfo};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Lock {
    owner: Address,
    delegate: Address,
    amount: u64,
    /// `None` locks forever at full power.
    unlock_at: Option<Timestamp>,
}

/// In-memory locker.
///
/// A timed lock yields `amount * remaining / max_lock_secs` power, capped at
/// `amount`, and zero once unlocked. A permanent lock yields `amount`.
#[derive(Clone, Debug)]
pub struct NullEscrow {
    max_lock_secs: u64,
    locks: HashMap<Address, Lock>,
}

impl NullEscrow {
    pub fn new(max_lock_secs: u64) -> Self {
        Self {
            max_lock_secs: max_lock_secs.max(1),
            locks: HashMap::new(),
        }
    }

    /// Lock `amount` until `unlock_at`. The voter owns and delegates to itself.
    pub fn lock(&mut self, voter: Address, amount: u64, unlock_at: Timestamp) {
        self.insert(voter, amount, Some(unlock_at));
    }

    /// Lock `amount` with constant power.
    pub fn lock_permanent(&mut self, voter: Address, amount: u64) {
        self.insert(voter, amount, None);
    }

    fn insert(&mut self, voter: Address, amount: u64, unlock_at: Option<Timestamp>) {
        let lock = self.locks.entry(voter).or_insert(Lock {
            owner: voter,
            delegate: voter,
            amount: 0,
            unlock_at: None,
        });
        lock.amount = amount;
        lock.unlock_at = unlock_at;
    }

    /// Hand the escrow's vote rights to `delegate`. Returns `false` for an
    /// unknown voter.
    pub fn set_delegate(&mut self, voter: &Address, delegate: Address) -> bool {
        match self.locks.get_mut(voter) {
            Some(lock) => {
                lock.delegate = delegate;
                true
            }
            None => false,
        }
    }

    /// Payout recipient distinct from the voter key.
    pub fn set_owner(&mut self, voter: &Address, owner: Address) -> bool {
        match self.locks.get_mut(voter) {
            Some(lock) => {
                lock.owner = owner;
                true
            }
            None => false,
        }
    }

    pub fn unlock(&mut self, voter: &Address) {
        self.locks.remove(voter);
    }
}

impl Default for NullEscrow {
    fn default() -> Self {
        Self::new(4 * 365 * 24 * 3600)
    }
}

impl Escrow for NullEscrow {
    fn escrow(&self, voter: &Address) -> Option<EscrowInfo> {
        self.locks.get(voter).map(|lock| EscrowInfo {
            owner: lock.owner,
            vote_delegate: lock.delegate,
        })
    }

    fn voting_power(&self, voter: &Address, at: Timestamp) -> Option<u64> {
        let lock = self.locks.get(voter)?;
        let Some(unlock_at) = lock.unlock_at else {
            return Some(lock.amount);
        };
        let remaining = at.secs_until(unlock_at).min(self.max_lock_secs);
        let power = (lock.amount as u128) * (remaining as u128) / (self.max_lock_secs as u128);
        Some(u64::try_from(power).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: &str) -> Address {
        Address::derive(&[tag.as_bytes()])
    }

    #[test]
    fn power_decays_linearly() {
        let mut escrow = NullEscrow::new(100);
        escrow.lock(addr("alice"), 1_000, Timestamp::new(100));
        assert_eq!(escrow.voting_power(&addr("alice"), Timestamp::new(0)), Some(1_000));
        assert_eq!(escrow.voting_power(&addr("alice"), Timestamp::new(50)), Some(500));
        assert_eq!(escrow.voting_power(&addr("alice"), Timestamp::new(200)), Some(0));
    }

    #[test]
    fn long_locks_are_capped() {
        let mut escrow = NullEscrow::new(100);
        escrow.lock(addr("alice"), 1_000, Timestamp::new(10_000));
        assert_eq!(escrow.voting_power(&addr("alice"), Timestamp::new(0)), Some(1_000));
    }

    #[test]
    fn permanent_lock_keeps_power() {
        let mut escrow = NullEscrow::new(100);
        escrow.lock_permanent(addr("alice"), 7);
        assert_eq!(escrow.voting_power(&addr("alice"), Timestamp::new(u64::MAX)), Some(7));
    }

    #[test]
    fn unknown_voter_has_no_escrow() {
        let escrow = NullEscrow::default();
        assert!(escrow.escrow(&addr("nobody")).is_none());
        assert!(escrow.voting_power(&addr("nobody"), Timestamp::new(0)).is_none());
    }

    #[test]
    fn delegate_defaults_to_voter() {
        let mut escrow = NullEscrow::default();
        escrow.lock_permanent(addr("alice"), 1);
        assert_eq!(escrow.escrow(&addr("alice")).unwrap().vote_delegate, addr("alice"));
        assert!(escrow.set_delegate(&addr("alice"), addr("bot")));
        let info = escrow.escrow(&addr("alice")).unwrap();
        assert_eq!(info.vote_delegate, addr("bot"));
        assert_eq!(info.owner, addr("alice"));
    }
}

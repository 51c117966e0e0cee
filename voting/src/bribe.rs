//! Bribe ledger: third-party per-epoch rewards for a gauge's voters.
//!
//! A briber escrows `reward_per_epoch` for each epoch in `[epoch_start,
//! epoch_end)`. For every elapsed epoch in range exactly one terminal state is
//! reachable: voters of the gauge claim pro rata, or (when nobody voted) the
//! briber claws the epoch's reward back.
//!
//! Checks and writes are split: `check_*` validates and computes the payout
//! without touching state, `record_*` applies it. The engine runs the token
//! transfer in between.

use crate::commit::EpochGauge;
use crate::error::VotingError;
use crate::math::mul_div_floor;
use gauge_types::{Address, EpochIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bribe {
    pub id: u64,
    pub gauge: Address,
    pub briber: Address,
    pub mint: Address,
    pub reward_per_epoch: u64,
    /// First rewarded epoch.
    pub epoch_start: EpochIndex,
    /// First epoch no longer rewarded.
    pub epoch_end: EpochIndex,
    pub claimed_amount: u64,
    pub clawed_back_amount: u64,
}

impl Bribe {
    pub fn num_epochs(&self) -> u32 {
        self.epoch_end.saturating_sub(self.epoch_start)
    }

    /// Amount escrowed at creation.
    pub fn total_escrow(&self) -> Result<u64, VotingError> {
        self.reward_per_epoch
            .checked_mul(self.num_epochs() as u64)
            .ok_or(VotingError::Overflow)
    }

    pub fn covers(&self, epoch: EpochIndex) -> bool {
        epoch >= self.epoch_start && epoch < self.epoch_end
    }

    pub fn vault(&self) -> Address {
        bribe_vault_address(self.id)
    }

    /// Escrow not yet paid out in either direction.
    pub fn remaining(&self) -> Result<u64, VotingError> {
        self.total_escrow()?
            .checked_sub(self.claimed_amount)
            .and_then(|r| r.checked_sub(self.clawed_back_amount))
            .ok_or(VotingError::Overflow)
    }

    fn require_covers(&self, epoch: EpochIndex) -> Result<(), VotingError> {
        if !self.covers(epoch) {
            return Err(VotingError::InvalidRange {
                start: self.epoch_start,
                end: self.epoch_end,
            });
        }
        Ok(())
    }
}

pub fn bribe_vault_address(id: u64) -> Address {
    Address::derive(&[b"bribe-vault", &id.to_le_bytes()])
}

/// Marks that `voter` claimed `bribe` for `epoch`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BribeClaim {
    pub voter: Address,
    pub bribe: u64,
    pub epoch: EpochIndex,
    pub amount: u64,
}

/// Marks that the briber reclaimed `bribe`'s reward for `epoch`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BribeClawback {
    pub bribe: u64,
    pub epoch: EpochIndex,
    pub amount: u64,
}

#[derive(Clone, Debug, Default)]
pub struct BribeLedger {
    bribes: HashMap<u64, Bribe>,
    claims: HashMap<(Address, u64, EpochIndex), BribeClaim>,
    clawbacks: HashMap<(u64, EpochIndex), BribeClawback>,
}

impl BribeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a new bribe starting at `current_epoch`. Nothing is stored.
    pub fn prepare(
        id: u64,
        gauge: Address,
        briber: Address,
        mint: Address,
        reward_per_epoch: u64,
        current_epoch: EpochIndex,
        epoch_end: EpochIndex,
    ) -> Result<Bribe, VotingError> {
        if epoch_end <= current_epoch {
            return Err(VotingError::InvalidRange {
                start: current_epoch,
                end: epoch_end,
            });
        }
        if reward_per_epoch == 0 {
            return Err(VotingError::ZeroReward);
        }
        let bribe = Bribe {
            id,
            gauge,
            briber,
            mint,
            reward_per_epoch,
            epoch_start: current_epoch,
            epoch_end,
            claimed_amount: 0,
            clawed_back_amount: 0,
        };
        bribe.total_escrow()?;
        Ok(bribe)
    }

    pub fn insert(&mut self, bribe: Bribe) {
        self.bribes.insert(bribe.id, bribe);
    }

    pub fn get(&self, id: u64) -> Result<&Bribe, VotingError> {
        self.bribes.get(&id).ok_or(VotingError::BribeNotFound(id))
    }

    /// Compute a voter's payout for one epoch from their allocation to the
    /// bribed gauge, live or closed. The caller has already checked that
    /// `epoch` elapsed.
    pub fn check_claim(
        &self,
        voter: &Address,
        id: u64,
        epoch: EpochIndex,
        epoch_gauge: Option<&EpochGauge>,
        allocation: Option<u64>,
    ) -> Result<BribeClaim, VotingError> {
        let bribe = self.get(id)?;
        bribe.require_covers(epoch)?;
        if self.is_claimed(voter, id, epoch) {
            return Err(VotingError::AlreadyClaimed);
        }
        let total_power = epoch_gauge.map(|eg| eg.total_power).unwrap_or(0);
        if total_power == 0 {
            return Err(VotingError::NothingToClaim);
        }
        let allocation = allocation.ok_or(VotingError::NotCommitted {
            voter: *voter,
            gauge: bribe.gauge,
            epoch,
        })?;
        let amount = mul_div_floor(bribe.reward_per_epoch, allocation, total_power)?;
        bribe
            .claimed_amount
            .checked_add(amount)
            .ok_or(VotingError::Overflow)?;
        Ok(BribeClaim {
            voter: *voter,
            bribe: id,
            epoch,
            amount,
        })
    }

    pub fn record_claim(&mut self, claim: BribeClaim) -> Result<(), VotingError> {
        let bribe = self
            .bribes
            .get_mut(&claim.bribe)
            .ok_or(VotingError::BribeNotFound(claim.bribe))?;
        bribe.claimed_amount = bribe
            .claimed_amount
            .checked_add(claim.amount)
            .ok_or(VotingError::Overflow)?;
        self.claims
            .insert((claim.voter, claim.bribe, claim.epoch), claim);
        Ok(())
    }

    /// Compute the briber's refund for one unvoted epoch. The caller has
    /// already checked that `epoch` elapsed.
    pub fn check_clawback(
        &self,
        authority: &Address,
        id: u64,
        epoch: EpochIndex,
        epoch_gauge: Option<&EpochGauge>,
    ) -> Result<BribeClawback, VotingError> {
        let bribe = self.get(id)?;
        if *authority != bribe.briber {
            return Err(VotingError::NotBriber(id));
        }
        bribe.require_covers(epoch)?;
        if epoch_gauge.map(|eg| eg.total_power).unwrap_or(0) != 0 {
            return Err(VotingError::EpochWasVoted(epoch));
        }
        if self.is_clawed_back(id, epoch) {
            return Err(VotingError::AlreadyClaimed);
        }
        bribe
            .clawed_back_amount
            .checked_add(bribe.reward_per_epoch)
            .ok_or(VotingError::Overflow)?;
        Ok(BribeClawback {
            bribe: id,
            epoch,
            amount: bribe.reward_per_epoch,
        })
    }

    pub fn record_clawback(&mut self, clawback: BribeClawback) -> Result<(), VotingError> {
        let bribe = self
            .bribes
            .get_mut(&clawback.bribe)
            .ok_or(VotingError::BribeNotFound(clawback.bribe))?;
        bribe.clawed_back_amount = bribe
            .clawed_back_amount
            .checked_add(clawback.amount)
            .ok_or(VotingError::Overflow)?;
        self.clawbacks
            .insert((clawback.bribe, clawback.epoch), clawback);
        Ok(())
    }

    pub fn is_claimed(&self, voter: &Address, id: u64, epoch: EpochIndex) -> bool {
        self.claims.contains_key(&(*voter, id, epoch))
    }

    pub fn is_clawed_back(&self, id: u64, epoch: EpochIndex) -> bool {
        self.clawbacks.contains_key(&(id, epoch))
    }

    pub fn bribes(&self) -> impl Iterator<Item = &Bribe> {
        self.bribes.values()
    }

    pub fn claims(&self) -> impl Iterator<Item = &BribeClaim> {
        self.claims.values()
    }

    pub fn clawbacks(&self) -> impl Iterator<Item = &BribeClawback> {
        self.clawbacks.values()
    }

    /// Epochs of `id` that have reached a terminal state.
    pub fn settled_epochs(&self, id: u64) -> HashSet<EpochIndex> {
        self.claims
            .values()
            .filter(|c| c.bribe == id)
            .map(|c| c.epoch)
            .chain(
                self.clawbacks
                    .values()
                    .filter(|c| c.bribe == id)
                    .map(|c| c.epoch),
            )
            .collect()
    }

    pub(crate) fn restore_claim(&mut self, claim: BribeClaim) {
        self.claims
            .insert((claim.voter, claim.bribe, claim.epoch), claim);
    }

    pub(crate) fn restore_clawback(&mut self, clawback: BribeClawback) {
        self.clawbacks
            .insert((clawback.bribe, clawback.epoch), clawback);
    }
}

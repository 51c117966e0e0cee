//! Epoch commit engine: per-epoch snapshots, commitments and their undoing.
//!
//! Three record kinds live here, all scoped to an epoch:
//!
//! - [`EpochGauge`] (gauge × epoch): total committed power and the fees the
//!   gauge accrued during the epoch.
//! - [`EpochVoterSnapshot`] (voter × epoch): the voting power and weight
//!   seqno the voter spends from, and how much of it is committed.
//! - [`EpochVote`] (voter × gauge × epoch): one commitment. Its presence is
//!   the "committed" state.
//!
//! `EpochGauge::total_power` and `EpochVoterSnapshot::allocated_power` only
//! move through [`EpochCommitEngine::commit`] and
//! [`EpochCommitEngine::revert`], always by the same amount. Closing an
//! elapsed vote keeps both totals and moves the amount into `closed_power`.
//! The closed allocation is kept on the snapshot under its gauge, so fee and
//! bribe claims for that epoch settle the same before and after a close.
//!
//! Epoch bounds (live vs elapsed) are enforced by the caller against the
//! factory clock; this module enforces record existence and arithmetic.

use crate::error::VotingError;
use crate::math::mul_div_floor;
use crate::registry::Gauge;
use gauge_types::{Address, EpochIndex, FeeSide};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochGauge {
    pub gauge: Address,
    pub epoch: EpochIndex,
    /// Sum of every allocation ever committed (and not reverted) this epoch.
    pub total_power: u64,
    /// Part of `total_power` whose votes have since been closed.
    pub closed_power: u64,
    /// Fees the gauge accrued during this epoch, per side.
    pub accrued_fees: [u64; 2],
}

impl EpochGauge {
    pub fn accrued_fee(&self, side: FeeSide) -> u64 {
        self.accrued_fees[side.index()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochVoterSnapshot {
    pub voter: Address,
    pub epoch: EpochIndex,
    pub voting_power: u64,
    pub weight_change_seqno: u64,
    /// Sum of this voter's committed allocations this epoch.
    pub allocated_power: u64,
    /// Part of `allocated_power` whose votes have since been closed.
    pub closed_power: u64,
    /// Fee-claimed flags, one pair of sides per gauge voted for.
    pub fee_claims: BTreeMap<Address, [bool; 2]>,
    /// Allocations of closed votes, per gauge.
    pub closed_allocations: BTreeMap<Address, u64>,
}

impl EpochVoterSnapshot {
    pub fn fee_claimed(&self, gauge: &Address, side: FeeSide) -> bool {
        self.fee_claims
            .get(gauge)
            .map(|flags| flags[side.index()])
            .unwrap_or(false)
    }

    pub(crate) fn mark_fee_claimed(&mut self, gauge: &Address, side: FeeSide) {
        self.fee_claims.entry(*gauge).or_default()[side.index()] = true;
    }

    pub fn closed_allocation(&self, gauge: &Address) -> Option<u64> {
        self.closed_allocations.get(gauge).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochVote {
    pub voter: Address,
    pub gauge: Address,
    pub epoch: EpochIndex,
    pub allocated_power: u64,
}

/// What a commit did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { allocated: u64 },
    /// The voter's weight on the gauge rounds to no power; no record created.
    NothingToCommit,
}

type VoteKey = (Address, Address, EpochIndex);

#[derive(Clone, Debug, Default)]
pub struct EpochCommitEngine {
    epoch_gauges: HashMap<(Address, EpochIndex), EpochGauge>,
    voters: HashMap<(Address, EpochIndex), EpochVoterSnapshot>,
    votes: HashMap<VoteKey, EpochVote>,
}

impl EpochCommitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the voter's snapshot for `epoch` if it does not exist.
    /// Returns `false` (and changes nothing) if one already exists.
    pub fn snapshot_voter(
        &mut self,
        voter: &Address,
        epoch: EpochIndex,
        voting_power: u64,
        weight_change_seqno: u64,
    ) -> bool {
        if self.voters.contains_key(&(*voter, epoch)) {
            return false;
        }
        self.voters.insert(
            (*voter, epoch),
            EpochVoterSnapshot {
                voter: *voter,
                epoch,
                voting_power,
                weight_change_seqno,
                allocated_power: 0,
                closed_power: 0,
                fee_claims: BTreeMap::new(),
                closed_allocations: BTreeMap::new(),
            },
        );
        true
    }

    /// Refresh an existing snapshot. Only allowed while nothing is committed.
    pub fn reset_voter(
        &mut self,
        voter: &Address,
        epoch: EpochIndex,
        voting_power: u64,
        weight_change_seqno: u64,
    ) -> Result<(), VotingError> {
        let snapshot = self
            .voters
            .get_mut(&(*voter, epoch))
            .ok_or(VotingError::EpochVoterNotFound {
                voter: *voter,
                epoch,
            })?;
        if snapshot.allocated_power != 0 {
            return Err(VotingError::MustWithdrawFirst {
                allocated: snapshot.allocated_power,
            });
        }
        snapshot.voting_power = voting_power;
        snapshot.weight_change_seqno = weight_change_seqno;
        Ok(())
    }

    /// Create the epoch gauge with its captured fees if it does not exist.
    pub fn create_epoch_gauge(
        &mut self,
        gauge: &Address,
        epoch: EpochIndex,
        accrued_fees: [u64; 2],
    ) -> bool {
        if self.epoch_gauges.contains_key(&(*gauge, epoch)) {
            return false;
        }
        self.epoch_gauges.insert(
            (*gauge, epoch),
            EpochGauge {
                gauge: *gauge,
                epoch,
                total_power: 0,
                closed_power: 0,
                accrued_fees,
            },
        );
        true
    }

    /// Commit `weight / total_weight` of the voter's snapshot power to `gauge`.
    ///
    /// `current_seqno` is the voter's live weight seqno; a snapshot taken
    /// under older weights is refused.
    pub fn commit(
        &mut self,
        voter: &Address,
        gauge: &Gauge,
        epoch: EpochIndex,
        weight: u32,
        total_weight: u64,
        current_seqno: u64,
    ) -> Result<CommitOutcome, VotingError> {
        let key = (*voter, gauge.target, epoch);
        if self.votes.contains_key(&key) {
            return Err(VotingError::AlreadyCommitted {
                voter: *voter,
                gauge: gauge.target,
                epoch,
            });
        }
        gauge.require_enabled()?;

        let snapshot = self
            .voters
            .get(&(*voter, epoch))
            .ok_or(VotingError::EpochVoterNotFound {
                voter: *voter,
                epoch,
            })?;
        if snapshot.weight_change_seqno != current_seqno {
            return Err(VotingError::StaleWeights {
                snapshot: snapshot.weight_change_seqno,
                current: current_seqno,
            });
        }
        let epoch_gauge = self
            .epoch_gauges
            .get(&(gauge.target, epoch))
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: gauge.target,
                epoch,
            })?;

        let allocated = mul_div_floor(snapshot.voting_power, weight as u64, total_weight)?;
        if allocated == 0 {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let gauge_total = epoch_gauge
            .total_power
            .checked_add(allocated)
            .ok_or(VotingError::Overflow)?;
        let voter_total = snapshot
            .allocated_power
            .checked_add(allocated)
            .ok_or(VotingError::Overflow)?;

        if let Some(eg) = self.epoch_gauges.get_mut(&(gauge.target, epoch)) {
            eg.total_power = gauge_total;
        }
        if let Some(snap) = self.voters.get_mut(&(*voter, epoch)) {
            snap.allocated_power = voter_total;
        }
        self.votes.insert(
            key,
            EpochVote {
                voter: *voter,
                gauge: gauge.target,
                epoch,
                allocated_power: allocated,
            },
        );
        Ok(CommitOutcome::Committed { allocated })
    }

    /// Undo a commitment. Returns the power released.
    pub fn revert(
        &mut self,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
    ) -> Result<u64, VotingError> {
        let key = (*voter, *gauge, epoch);
        let allocated = self
            .votes
            .get(&key)
            .map(|v| v.allocated_power)
            .ok_or(VotingError::NotCommitted {
                voter: *voter,
                gauge: *gauge,
                epoch,
            })?;
        let (gauge_total, voter_total) = self.released_totals(voter, gauge, epoch, allocated)?;

        if let Some(eg) = self.epoch_gauges.get_mut(&(*gauge, epoch)) {
            eg.total_power = gauge_total;
        }
        if let Some(snap) = self.voters.get_mut(&(*voter, epoch)) {
            snap.allocated_power = voter_total;
        }
        self.votes.remove(&key);
        Ok(allocated)
    }

    /// Delete an elapsed vote record. The epoch totals are kept and the
    /// allocation moves to the snapshot's closed set, where claims find it.
    pub fn close(
        &mut self,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
    ) -> Result<EpochVote, VotingError> {
        let key = (*voter, *gauge, epoch);
        let allocated = self
            .votes
            .get(&key)
            .map(|v| v.allocated_power)
            .ok_or(VotingError::AlreadyClosed)?;

        let eg = self
            .epoch_gauges
            .get(&(*gauge, epoch))
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: *gauge,
                epoch,
            })?;
        let snap = self
            .voters
            .get(&(*voter, epoch))
            .ok_or(VotingError::EpochVoterNotFound {
                voter: *voter,
                epoch,
            })?;
        let gauge_closed = eg
            .closed_power
            .checked_add(allocated)
            .ok_or(VotingError::Overflow)?;
        let voter_closed = snap
            .closed_power
            .checked_add(allocated)
            .ok_or(VotingError::Overflow)?;

        if let Some(eg) = self.epoch_gauges.get_mut(&(*gauge, epoch)) {
            eg.closed_power = gauge_closed;
        }
        if let Some(snap) = self.voters.get_mut(&(*voter, epoch)) {
            snap.closed_power = voter_closed;
            snap.closed_allocations.insert(*gauge, allocated);
        }
        self.votes.remove(&key).ok_or(VotingError::AlreadyClosed)
    }

    /// The voter's allocation to `gauge` in `epoch`, whether the vote is
    /// still live or has been closed.
    pub fn allocation(&self, voter: &Address, gauge: &Address, epoch: EpochIndex) -> Option<u64> {
        match self.votes.get(&(*voter, *gauge, epoch)) {
            Some(vote) => Some(vote.allocated_power),
            None => self
                .voters
                .get(&(*voter, epoch))
                .and_then(|snap| snap.closed_allocation(gauge)),
        }
    }

    /// Delete an epoch gauge nobody committed to.
    pub fn remove_empty_epoch_gauge(
        &mut self,
        gauge: &Address,
        epoch: EpochIndex,
    ) -> Result<EpochGauge, VotingError> {
        let eg = self
            .epoch_gauges
            .get(&(*gauge, epoch))
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: *gauge,
                epoch,
            })?;
        if eg.total_power != 0 {
            return Err(VotingError::NotEmpty(eg.total_power));
        }
        self.epoch_gauges
            .remove(&(*gauge, epoch))
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: *gauge,
                epoch,
            })
    }

    fn released_totals(
        &self,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
        allocated: u64,
    ) -> Result<(u64, u64), VotingError> {
        let eg = self
            .epoch_gauges
            .get(&(*gauge, epoch))
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: *gauge,
                epoch,
            })?;
        let snap = self
            .voters
            .get(&(*voter, epoch))
            .ok_or(VotingError::EpochVoterNotFound {
                voter: *voter,
                epoch,
            })?;
        let gauge_total = eg
            .total_power
            .checked_sub(allocated)
            .ok_or(VotingError::Overflow)?;
        let voter_total = snap
            .allocated_power
            .checked_sub(allocated)
            .ok_or(VotingError::Overflow)?;
        Ok((gauge_total, voter_total))
    }

    pub fn epoch_gauge(&self, gauge: &Address, epoch: EpochIndex) -> Option<&EpochGauge> {
        self.epoch_gauges.get(&(*gauge, epoch))
    }

    pub fn voter(&self, voter: &Address, epoch: EpochIndex) -> Option<&EpochVoterSnapshot> {
        self.voters.get(&(*voter, epoch))
    }

    pub(crate) fn voter_mut(
        &mut self,
        voter: &Address,
        epoch: EpochIndex,
    ) -> Option<&mut EpochVoterSnapshot> {
        self.voters.get_mut(&(*voter, epoch))
    }

    pub fn vote(&self, voter: &Address, gauge: &Address, epoch: EpochIndex) -> Option<&EpochVote> {
        self.votes.get(&(*voter, *gauge, epoch))
    }

    pub fn epoch_gauges(&self) -> impl Iterator<Item = &EpochGauge> {
        self.epoch_gauges.values()
    }

    pub fn voters(&self) -> impl Iterator<Item = &EpochVoterSnapshot> {
        self.voters.values()
    }

    pub fn votes(&self) -> impl Iterator<Item = &EpochVote> {
        self.votes.values()
    }

    pub(crate) fn restore_epoch_gauge(&mut self, eg: EpochGauge) {
        self.epoch_gauges.insert((eg.gauge, eg.epoch), eg);
    }

    pub(crate) fn restore_voter(&mut self, snap: EpochVoterSnapshot) {
        self.voters.insert((snap.voter, snap.epoch), snap);
    }

    pub(crate) fn restore_vote(&mut self, vote: EpochVote) {
        self.votes.insert((vote.voter, vote.gauge, vote.epoch), vote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GaugeRegistry;

    fn addr(tag: &str) -> Address {
        Address::derive(&[tag.as_bytes()])
    }

    fn enabled_gauge(reg: &mut GaugeRegistry, tag: &str) -> Address {
        let target = addr(tag);
        reg.create(target, [addr("a"), addr("b")], [0, 0]).unwrap();
        reg.set_enabled(&target, true).unwrap();
        target
    }

    fn setup() -> (GaugeRegistry, EpochCommitEngine, Address, Address) {
        let mut reg = GaugeRegistry::new();
        let g = enabled_gauge(&mut reg, "g1");
        let mut engine = EpochCommitEngine::new();
        let voter = addr("alice");
        engine.snapshot_voter(&voter, 2, 1_000_000, 1);
        engine.create_epoch_gauge(&g, 2, [0, 0]);
        (reg, engine, voter, g)
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut engine = EpochCommitEngine::new();
        let v = addr("alice");
        assert!(engine.snapshot_voter(&v, 1, 100, 3));
        assert!(!engine.snapshot_voter(&v, 1, 999, 9));
        let snap = engine.voter(&v, 1).unwrap();
        assert_eq!(snap.voting_power, 100);
        assert_eq!(snap.weight_change_seqno, 3);
    }

    #[test]
    fn full_weight_commit_allocates_all_power() {
        let (reg, mut engine, voter, g) = setup();
        let gauge = reg.get(&g).unwrap();
        let outcome = engine.commit(&voter, gauge, 2, 50, 50, 1).unwrap();
        assert_eq!(outcome, CommitOutcome::Committed { allocated: 1_000_000 });
        assert_eq!(engine.epoch_gauge(&g, 2).unwrap().total_power, 1_000_000);
        assert_eq!(engine.voter(&voter, 2).unwrap().allocated_power, 1_000_000);
        assert_eq!(engine.vote(&voter, &g, 2).unwrap().allocated_power, 1_000_000);
    }

    #[test]
    fn double_commit_rejected_without_double_apply() {
        let (reg, mut engine, voter, g) = setup();
        let gauge = reg.get(&g).unwrap();
        engine.commit(&voter, gauge, 2, 1, 3, 1).unwrap();
        let result = engine.commit(&voter, gauge, 2, 1, 3, 1);
        assert!(matches!(result, Err(VotingError::AlreadyCommitted { .. })));
        assert_eq!(engine.epoch_gauge(&g, 2).unwrap().total_power, 333_333);
    }

    #[test]
    fn stale_weights_rejected() {
        let (reg, mut engine, voter, g) = setup();
        let result = engine.commit(&voter, reg.get(&g).unwrap(), 2, 50, 50, 2);
        assert!(matches!(
            result,
            Err(VotingError::StaleWeights { snapshot: 1, current: 2 })
        ));
        assert!(engine.vote(&voter, &g, 2).is_none());
    }

    #[test]
    fn zero_total_weight_is_noop() {
        let (reg, mut engine, voter, g) = setup();
        let outcome = engine.commit(&voter, reg.get(&g).unwrap(), 2, 0, 0, 1).unwrap();
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
        assert!(engine.vote(&voter, &g, 2).is_none());
        assert_eq!(engine.epoch_gauge(&g, 2).unwrap().total_power, 0);
    }

    #[test]
    fn disabled_gauge_rejects_commit() {
        let (mut reg, mut engine, voter, g) = setup();
        reg.set_enabled(&g, false).unwrap();
        let result = engine.commit(&voter, reg.get(&g).unwrap(), 2, 50, 50, 1);
        assert!(matches!(result, Err(VotingError::GaugeDisabled(_))));
    }

    #[test]
    fn commit_requires_snapshot_and_epoch_gauge() {
        let mut reg = GaugeRegistry::new();
        let g = enabled_gauge(&mut reg, "g1");
        let mut engine = EpochCommitEngine::new();
        let voter = addr("alice");
        let gauge = reg.get(&g).unwrap();
        assert!(matches!(
            engine.commit(&voter, gauge, 1, 1, 1, 0),
            Err(VotingError::EpochVoterNotFound { .. })
        ));
        engine.snapshot_voter(&voter, 1, 10, 0);
        assert!(matches!(
            engine.commit(&voter, gauge, 1, 1, 1, 0),
            Err(VotingError::EpochGaugeNotFound { .. })
        ));
    }

    #[test]
    fn commit_then_revert_round_trips() {
        let (reg, mut engine, voter, g) = setup();
        let gauge = reg.get(&g).unwrap();
        let before_gauge = engine.epoch_gauge(&g, 2).unwrap().total_power;
        let before_voter = engine.voter(&voter, 2).unwrap().allocated_power;
        engine.commit(&voter, gauge, 2, 2, 7, 1).unwrap();
        let released = engine.revert(&voter, &g, 2).unwrap();
        assert_eq!(released, 285_714);
        assert_eq!(engine.epoch_gauge(&g, 2).unwrap().total_power, before_gauge);
        assert_eq!(engine.voter(&voter, 2).unwrap().allocated_power, before_voter);
        assert!(engine.vote(&voter, &g, 2).is_none());
        assert!(matches!(
            engine.revert(&voter, &g, 2),
            Err(VotingError::NotCommitted { .. })
        ));
    }

    #[test]
    fn reset_requires_withdrawal() {
        let (reg, mut engine, voter, g) = setup();
        engine.commit(&voter, reg.get(&g).unwrap(), 2, 1, 1, 1).unwrap();
        assert!(matches!(
            engine.reset_voter(&voter, 2, 5, 2),
            Err(VotingError::MustWithdrawFirst { allocated: 1_000_000 })
        ));
        engine.revert(&voter, &g, 2).unwrap();
        engine.reset_voter(&voter, 2, 5, 2).unwrap();
        let snap = engine.voter(&voter, 2).unwrap();
        assert_eq!(snap.voting_power, 5);
        assert_eq!(snap.weight_change_seqno, 2);
    }

    #[test]
    fn close_keeps_totals_and_tracks_closed_power() {
        let (reg, mut engine, voter, g) = setup();
        engine.commit(&voter, reg.get(&g).unwrap(), 2, 1, 2, 1).unwrap();
        let closed = engine.close(&voter, &g, 2).unwrap();
        assert_eq!(closed.allocated_power, 500_000);
        let eg = engine.epoch_gauge(&g, 2).unwrap();
        assert_eq!(eg.total_power, 500_000);
        assert_eq!(eg.closed_power, 500_000);
        assert_eq!(engine.voter(&voter, 2).unwrap().closed_power, 500_000);
        assert!(matches!(
            engine.close(&voter, &g, 2),
            Err(VotingError::AlreadyClosed)
        ));
    }

    #[test]
    fn allocation_survives_close() {
        let (reg, mut engine, voter, g) = setup();
        assert_eq!(engine.allocation(&voter, &g, 2), None);
        engine.commit(&voter, reg.get(&g).unwrap(), 2, 1, 4, 1).unwrap();
        assert_eq!(engine.allocation(&voter, &g, 2), Some(250_000));
        engine.close(&voter, &g, 2).unwrap();
        assert!(engine.vote(&voter, &g, 2).is_none());
        assert_eq!(engine.allocation(&voter, &g, 2), Some(250_000));
        assert_eq!(engine.voter(&voter, 2).unwrap().closed_allocation(&g), Some(250_000));
        assert_eq!(engine.allocation(&voter, &addr("other"), 2), None);
    }

    #[test]
    fn only_empty_epoch_gauges_are_removed() {
        let (reg, mut engine, voter, g) = setup();
        engine.commit(&voter, reg.get(&g).unwrap(), 2, 1, 1, 1).unwrap();
        assert!(matches!(
            engine.remove_empty_epoch_gauge(&g, 2),
            Err(VotingError::NotEmpty(1_000_000))
        ));
        engine.create_epoch_gauge(&g, 3, [4, 0]);
        let removed = engine.remove_empty_epoch_gauge(&g, 3).unwrap();
        assert_eq!(removed.accrued_fees, [4, 0]);
        assert!(engine.epoch_gauge(&g, 3).is_none());
    }

    #[test]
    fn fee_claim_flags_are_per_gauge_and_side() {
        let mut engine = EpochCommitEngine::new();
        let v = addr("alice");
        engine.snapshot_voter(&v, 1, 10, 0);
        let snap = engine.voter_mut(&v, 1).unwrap();
        snap.mark_fee_claimed(&addr("g1"), FeeSide::A);
        assert!(snap.fee_claimed(&addr("g1"), FeeSide::A));
        assert!(!snap.fee_claimed(&addr("g1"), FeeSide::B));
        assert!(!snap.fee_claimed(&addr("g2"), FeeSide::A));
    }
}

//! Voter weight book: persistent voting intent.
//!
//! Each voter spreads un-normalized weight units across gauges. The book keeps
//! the per-(voter, gauge) weights, their sum, and a sequence number that moves
//! on every explicit `set_vote`. Epoch snapshots copy that sequence number;
//! a mismatch at commit time means the snapshot is stale.

use crate::error::VotingError;
use crate::registry::Gauge;
use gauge_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-voter summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterBook {
    pub voter: Address,
    /// Sum of this voter's per-gauge weights.
    pub total_weight: u64,
    /// Bumped on every weight mutation, even a no-op one.
    pub weight_change_seqno: u64,
}

/// One (voter, gauge) weight record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeWeight {
    pub voter: Address,
    pub gauge: Address,
    pub weight: u32,
}

/// Result of a weight change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteChange {
    pub previous_weight: u32,
    pub weight: u32,
    pub total_weight: u64,
    pub weight_change_seqno: u64,
}

#[derive(Clone, Debug, Default)]
pub struct VoterWeightBook {
    books: HashMap<Address, VoterBook>,
    weights: HashMap<(Address, Address), GaugeWeight>,
}

impl VoterWeightBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `voter`'s weight on `gauge`.
    ///
    /// Raising weight on a disabled gauge is refused; lowering it (including
    /// to zero) is always allowed so voters can walk away from a frozen gauge.
    pub fn set_vote(
        &mut self,
        voter: &Address,
        gauge: &Gauge,
        weight: u32,
    ) -> Result<VoteChange, VotingError> {
        let previous_weight = self.weight(voter, &gauge.target);
        if weight > previous_weight && !gauge.enabled {
            return Err(VotingError::GaugeDisabledCannotVote(gauge.target));
        }

        let book = self.books.get(voter).cloned().unwrap_or(VoterBook {
            voter: *voter,
            ..VoterBook::default()
        });
        let total_weight = book
            .total_weight
            .checked_sub(previous_weight as u64)
            .and_then(|t| t.checked_add(weight as u64))
            .ok_or(VotingError::Overflow)?;
        let weight_change_seqno = book
            .weight_change_seqno
            .checked_add(1)
            .ok_or(VotingError::Overflow)?;

        self.weights.insert(
            (*voter, gauge.target),
            GaugeWeight {
                voter: *voter,
                gauge: gauge.target,
                weight,
            },
        );
        self.books.insert(
            *voter,
            VoterBook {
                voter: *voter,
                total_weight,
                weight_change_seqno,
            },
        );

        Ok(VoteChange {
            previous_weight,
            weight,
            total_weight,
            weight_change_seqno,
        })
    }

    pub fn weight(&self, voter: &Address, gauge: &Address) -> u32 {
        self.weights
            .get(&(*voter, *gauge))
            .map(|w| w.weight)
            .unwrap_or(0)
    }

    pub fn book(&self, voter: &Address) -> Option<&VoterBook> {
        self.books.get(voter)
    }

    /// Current sequence number (zero for a voter that never voted).
    pub fn seqno(&self, voter: &Address) -> u64 {
        self.books
            .get(voter)
            .map(|b| b.weight_change_seqno)
            .unwrap_or(0)
    }

    pub fn total_weight(&self, voter: &Address) -> u64 {
        self.books.get(voter).map(|b| b.total_weight).unwrap_or(0)
    }

    pub fn books(&self) -> impl Iterator<Item = &VoterBook> {
        self.books.values()
    }

    pub fn weights(&self) -> impl Iterator<Item = &GaugeWeight> {
        self.weights.values()
    }

    /// Recompute a voter's total from the individual records.
    pub fn summed_weight(&self, voter: &Address) -> u64 {
        self.weights
            .values()
            .filter(|w| w.voter == *voter)
            .map(|w| w.weight as u64)
            .sum()
    }

    pub(crate) fn restore_book(&mut self, book: VoterBook) {
        self.books.insert(book.voter, book);
    }

    pub(crate) fn restore_weight(&mut self, weight: GaugeWeight) {
        self.weights.insert((weight.voter, weight.gauge), weight);
    }
}

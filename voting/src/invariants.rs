//! Conservation audit over the whole engine.
//!
//! Rebuilds every aggregate from the individual records and compares it with
//! the stored counter and with the token balances held in the vaults.
//!
//! Every unit of an epoch gauge's `total_power` must be backed by an
//! allocation a claim can read (a live vote or a closed allocation on a
//! snapshot); otherwise part of that epoch's fees and bribes could never be
//! paid out.

use crate::engine::GaugeEngine;
use crate::external::TokenLedger;
use gauge_types::{Address, EpochIndex, FeeSide};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("epoch gauge {gauge}/{epoch}: total power {recorded} != claimable {summed}")]
    GaugePowerMismatch {
        gauge: Address,
        epoch: EpochIndex,
        recorded: u64,
        summed: u64,
    },

    #[error("voter {voter}/{epoch}: allocated power {recorded} != claimable {summed}")]
    VoterAllocationMismatch {
        voter: Address,
        epoch: EpochIndex,
        recorded: u64,
        summed: u64,
    },

    #[error("{owner}/{epoch}: closed power {recorded} != closed allocations {summed}")]
    ClosedPowerMismatch {
        owner: Address,
        epoch: EpochIndex,
        recorded: u64,
        summed: u64,
    },

    #[error("voter {voter}/{epoch}: allocated {allocated} exceeds voting power {power}")]
    OverAllocated {
        voter: Address,
        epoch: EpochIndex,
        allocated: u64,
        power: u64,
    },

    #[error("voter {voter}: total weight {recorded} != sum of gauge weights {summed}")]
    WeightMismatch {
        voter: Address,
        recorded: u64,
        summed: u64,
    },

    #[error("gauge {gauge} side {side}: accrued {accrued} != vault {vault} + claimed {claimed}")]
    FeeVaultMismatch {
        gauge: Address,
        side: FeeSide,
        accrued: u64,
        vault: u64,
        claimed: u64,
    },

    #[error("gauge {gauge} side {side}: accrued {accrued} != epoch fees + pruned {summed}")]
    FeeAccrualMismatch {
        gauge: Address,
        side: FeeSide,
        accrued: u64,
        summed: u64,
    },

    #[error("bribe {bribe}: vault holds {vault}, unpaid escrow is {remaining}")]
    BribeVaultMismatch { bribe: u64, vault: u64, remaining: u64 },

    #[error("bribe {bribe}: paid out more than escrowed")]
    BribeOverpaid { bribe: u64 },

    #[error("bribe {bribe} epoch {epoch}: both claimed by voters and clawed back")]
    BribeDoubleSettled { bribe: u64, epoch: EpochIndex },

    #[error("aggregate overflowed while auditing")]
    Overflow,
}

fn add(a: u64, b: u64) -> Result<u64, InvariantViolation> {
    a.checked_add(b).ok_or(InvariantViolation::Overflow)
}

impl GaugeEngine {
    /// Audit every conservation property. Returns the first violation.
    pub fn check_invariants(&self, tokens: &dyn TokenLedger) -> Result<(), InvariantViolation> {
        self.check_power()?;
        self.check_weights()?;
        self.check_fees(tokens)?;
        self.check_bribes(tokens)
    }

    fn check_power(&self) -> Result<(), InvariantViolation> {
        let mut per_gauge: HashMap<(Address, EpochIndex), u64> = HashMap::new();
        let mut per_voter: HashMap<(Address, EpochIndex), u64> = HashMap::new();
        let mut gauge_closed: HashMap<(Address, EpochIndex), u64> = HashMap::new();
        for vote in self.epochs.votes() {
            let g = per_gauge.entry((vote.gauge, vote.epoch)).or_default();
            *g = add(*g, vote.allocated_power)?;
            let v = per_voter.entry((vote.voter, vote.epoch)).or_default();
            *v = add(*v, vote.allocated_power)?;
        }
        for snap in self.epochs.voters() {
            for (gauge, allocated) in &snap.closed_allocations {
                let g = gauge_closed.entry((*gauge, snap.epoch)).or_default();
                *g = add(*g, *allocated)?;
            }
        }

        for eg in self.epochs.epoch_gauges() {
            let closed = gauge_closed.get(&(eg.gauge, eg.epoch)).copied().unwrap_or(0);
            if closed != eg.closed_power {
                return Err(InvariantViolation::ClosedPowerMismatch {
                    owner: eg.gauge,
                    epoch: eg.epoch,
                    recorded: eg.closed_power,
                    summed: closed,
                });
            }
            let live = per_gauge.get(&(eg.gauge, eg.epoch)).copied().unwrap_or(0);
            let summed = add(live, closed)?;
            if summed != eg.total_power {
                return Err(InvariantViolation::GaugePowerMismatch {
                    gauge: eg.gauge,
                    epoch: eg.epoch,
                    recorded: eg.total_power,
                    summed,
                });
            }
        }

        for snap in self.epochs.voters() {
            let closed = snap
                .closed_allocations
                .values()
                .try_fold(0u64, |acc, a| add(acc, *a))?;
            if closed != snap.closed_power {
                return Err(InvariantViolation::ClosedPowerMismatch {
                    owner: snap.voter,
                    epoch: snap.epoch,
                    recorded: snap.closed_power,
                    summed: closed,
                });
            }
            let live = per_voter.get(&(snap.voter, snap.epoch)).copied().unwrap_or(0);
            let summed = add(live, closed)?;
            if summed != snap.allocated_power {
                return Err(InvariantViolation::VoterAllocationMismatch {
                    voter: snap.voter,
                    epoch: snap.epoch,
                    recorded: snap.allocated_power,
                    summed,
                });
            }
            if snap.allocated_power > snap.voting_power {
                return Err(InvariantViolation::OverAllocated {
                    voter: snap.voter,
                    epoch: snap.epoch,
                    allocated: snap.allocated_power,
                    power: snap.voting_power,
                });
            }
        }
        Ok(())
    }

    fn check_weights(&self) -> Result<(), InvariantViolation> {
        for book in self.book.books() {
            let summed = self.book.summed_weight(&book.voter);
            if summed != book.total_weight {
                return Err(InvariantViolation::WeightMismatch {
                    voter: book.voter,
                    recorded: book.total_weight,
                    summed,
                });
            }
        }
        Ok(())
    }

    fn check_fees(&self, tokens: &dyn TokenLedger) -> Result<(), InvariantViolation> {
        let mut epoch_fees: HashMap<Address, [u64; 2]> = HashMap::new();
        for eg in self.epochs.epoch_gauges() {
            let sums = epoch_fees.entry(eg.gauge).or_default();
            for side in FeeSide::ALL {
                sums[side.index()] = add(sums[side.index()], eg.accrued_fee(side))?;
            }
        }

        for gauge in self.registry.iter() {
            for side in FeeSide::ALL {
                let counter = gauge.fee(side);
                let vault = tokens.balance_of(&counter.mint, &gauge.fee_vault(side));
                if add(vault, counter.cumulative_claimed)? != counter.cumulative_accrued {
                    return Err(InvariantViolation::FeeVaultMismatch {
                        gauge: gauge.target,
                        side,
                        accrued: counter.cumulative_accrued,
                        vault,
                        claimed: counter.cumulative_claimed,
                    });
                }
                let recorded = epoch_fees
                    .get(&gauge.target)
                    .map(|s| s[side.index()])
                    .unwrap_or(0);
                let summed = add(recorded, counter.pruned_accrued)?;
                if summed != counter.cumulative_accrued {
                    return Err(InvariantViolation::FeeAccrualMismatch {
                        gauge: gauge.target,
                        side,
                        accrued: counter.cumulative_accrued,
                        summed,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_bribes(&self, tokens: &dyn TokenLedger) -> Result<(), InvariantViolation> {
        for bribe in self.bribes.bribes() {
            let remaining = bribe
                .remaining()
                .map_err(|_| InvariantViolation::BribeOverpaid { bribe: bribe.id })?;
            let vault = tokens.balance_of(&bribe.mint, &bribe.vault());
            if vault != remaining {
                return Err(InvariantViolation::BribeVaultMismatch {
                    bribe: bribe.id,
                    vault,
                    remaining,
                });
            }
        }
        for clawback in self.bribes.clawbacks() {
            if self
                .bribes
                .claims()
                .any(|c| c.bribe == clawback.bribe && c.epoch == clawback.epoch)
            {
                return Err(InvariantViolation::BribeDoubleSettled {
                    bribe: clawback.bribe,
                    epoch: clawback.epoch,
                });
            }
        }
        Ok(())
    }
}

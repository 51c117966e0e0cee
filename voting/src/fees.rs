//! Fee settlement: capturing pool fees into epochs and paying them out.
//!
//! Capture happens when an epoch gauge is created: the pool counter delta
//! since the previous capture becomes the epoch's accrued fee and moves into
//! the gauge's fee vault. Claims pay each voter `accrued * allocated / total`
//! from that vault.

use crate::commit::{EpochGauge, EpochVoterSnapshot};
use crate::error::VotingError;
use crate::math::mul_div_floor;
use crate::registry::Gauge;
use gauge_types::FeeSide;

/// Fee movement computed for a new epoch gauge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeCapture {
    /// Pool counters observed now; become the new baseline.
    pub pool_totals: [u64; 2],
    /// Amount per side to move from the pool into the fee vault.
    pub accrued: [u64; 2],
    cumulative_accrued: [u64; 2],
}

impl FeeCapture {
    pub fn compute(gauge: &Gauge, pool_totals: [u64; 2]) -> Result<Self, VotingError> {
        let mut accrued = [0u64; 2];
        let mut cumulative_accrued = [0u64; 2];
        for side in FeeSide::ALL {
            let counter = gauge.fee(side);
            let observed = pool_totals[side.index()];
            let delta = observed.checked_sub(counter.last_pool_total).ok_or(
                VotingError::FeePoolRegressed {
                    target: gauge.target,
                    side,
                    last: counter.last_pool_total,
                    observed,
                },
            )?;
            accrued[side.index()] = delta;
            cumulative_accrued[side.index()] = counter
                .cumulative_accrued
                .checked_add(delta)
                .ok_or(VotingError::Overflow)?;
        }
        Ok(Self {
            pool_totals,
            accrued,
            cumulative_accrued,
        })
    }

    /// Nothing accrued on either side since the last capture.
    pub fn is_empty(&self) -> bool {
        self.accrued == [0, 0]
    }

    pub fn apply(&self, gauge: &mut Gauge) {
        for side in FeeSide::ALL {
            let counter = gauge.fee_mut(side);
            counter.last_pool_total = self.pool_totals[side.index()];
            counter.cumulative_accrued = self.cumulative_accrued[side.index()];
        }
    }
}

/// A voter's fee payout for one (gauge, epoch, side).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeClaim {
    pub side: FeeSide,
    pub share: u64,
    cumulative_claimed: u64,
}

impl FeeClaim {
    /// Compute the share. `allocation` is the voter's power on this gauge in
    /// the epoch, live or closed. `None` means the epoch carries no committed
    /// power and the claim is a no-op.
    pub fn compute(
        gauge: &Gauge,
        epoch_gauge: &EpochGauge,
        snapshot: &EpochVoterSnapshot,
        allocation: Option<u64>,
        side: FeeSide,
    ) -> Result<Option<Self>, VotingError> {
        if snapshot.fee_claimed(&gauge.target, side) {
            return Err(VotingError::AlreadyClaimed);
        }
        if epoch_gauge.total_power == 0 {
            return Ok(None);
        }
        let allocation = allocation.ok_or(VotingError::NotCommitted {
            voter: snapshot.voter,
            gauge: gauge.target,
            epoch: epoch_gauge.epoch,
        })?;
        let share = mul_div_floor(
            epoch_gauge.accrued_fee(side),
            allocation,
            epoch_gauge.total_power,
        )?;
        let cumulative_claimed = gauge
            .fee(side)
            .cumulative_claimed
            .checked_add(share)
            .ok_or(VotingError::Overflow)?;
        Ok(Some(Self {
            side,
            share,
            cumulative_claimed,
        }))
    }

    pub fn apply(&self, gauge: &mut Gauge, snapshot: &mut EpochVoterSnapshot) {
        gauge.fee_mut(self.side).cumulative_claimed = self.cumulative_claimed;
        snapshot.mark_fee_claimed(&gauge.target, self.side);
    }
}

/// New `pruned_accrued` values after folding in a removed epoch gauge.
pub fn pruned_totals(gauge: &Gauge, removed: &EpochGauge) -> Result<[u64; 2], VotingError> {
    let mut totals = [0u64; 2];
    for side in FeeSide::ALL {
        totals[side.index()] = gauge
            .fee(side)
            .pruned_accrued
            .checked_add(removed.accrued_fee(side))
            .ok_or(VotingError::Overflow)?;
    }
    Ok(totals)
}

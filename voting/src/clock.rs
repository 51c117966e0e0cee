//! Epoch clock: the factory record.
//!
//! Holds the current epoch index and the time at which the next advance
//! becomes due. Advancing is permissionless and moves the threshold by a fixed
//! cadence, so skipped advances never earn extra time.

use crate::error::VotingError;
use gauge_types::{Address, EpochIndex, FactoryParams, Timestamp, FIRST_EPOCH};
use serde::{Deserialize, Serialize};

/// One per deployment. Mutated only by [`Factory::advance`] and the
/// foreman's admin calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    /// May enable/disable gauges and change admin settings.
    pub foreman: Address,
    pub epoch_duration_secs: u64,
    pub current_epoch: EpochIndex,
    pub next_epoch_starts_at: Timestamp,
    /// Number of bribes ever created; the next bribe takes this as its id.
    pub bribe_count: u64,
}

impl Factory {
    pub fn new(foreman: Address, params: &FactoryParams) -> Result<Self, VotingError> {
        if params.epoch_duration_secs == 0 {
            return Err(VotingError::InvalidEpochDuration);
        }
        let next_epoch_starts_at = params
            .genesis
            .checked_add_secs(params.epoch_duration_secs)
            .ok_or(VotingError::Overflow)?;
        Ok(Self {
            foreman,
            epoch_duration_secs: params.epoch_duration_secs,
            current_epoch: FIRST_EPOCH,
            next_epoch_starts_at,
            bribe_count: 0,
        })
    }

    /// Move to the next epoch if the threshold has been reached.
    pub fn advance(&mut self, now: Timestamp) -> Result<EpochIndex, VotingError> {
        if now < self.next_epoch_starts_at {
            return Err(VotingError::EpochNotDue {
                now,
                due: self.next_epoch_starts_at,
            });
        }
        let next_epoch = self
            .current_epoch
            .checked_add(1)
            .ok_or(VotingError::Overflow)?;
        let next_threshold = self
            .next_epoch_starts_at
            .checked_add_secs(self.epoch_duration_secs)
            .ok_or(VotingError::Overflow)?;
        self.current_epoch = next_epoch;
        self.next_epoch_starts_at = next_threshold;
        Ok(next_epoch)
    }

    pub fn require_foreman(&self, authority: &Address) -> Result<(), VotingError> {
        if *authority != self.foreman {
            return Err(VotingError::NotForeman);
        }
        Ok(())
    }

    pub fn set_foreman(
        &mut self,
        authority: &Address,
        new_foreman: Address,
    ) -> Result<(), VotingError> {
        self.require_foreman(authority)?;
        self.foreman = new_foreman;
        Ok(())
    }

    /// Change the cadence. Takes effect at the next advance; the pending
    /// threshold is not moved.
    pub fn set_epoch_duration(
        &mut self,
        authority: &Address,
        secs: u64,
    ) -> Result<(), VotingError> {
        self.require_foreman(authority)?;
        if secs == 0 {
            return Err(VotingError::InvalidEpochDuration);
        }
        self.epoch_duration_secs = secs;
        Ok(())
    }

    /// The epoch being voted on.
    pub fn is_live(&self, epoch: EpochIndex) -> bool {
        epoch == self.current_epoch
    }

    /// An epoch whose results are final and may be settled.
    pub fn is_elapsed(&self, epoch: EpochIndex) -> bool {
        epoch < self.current_epoch
    }

    pub fn require_live(&self, epoch: EpochIndex) -> Result<(), VotingError> {
        if !self.is_live(epoch) {
            return Err(VotingError::WrongEpoch {
                requested: epoch,
                current: self.current_epoch,
            });
        }
        Ok(())
    }

    pub fn require_elapsed(&self, epoch: EpochIndex) -> Result<(), VotingError> {
        if !self.is_elapsed(epoch) {
            return Err(VotingError::EpochStillOpen {
                epoch,
                current: self.current_epoch,
            });
        }
        Ok(())
    }

    /// The most recently closed epoch, if any.
    pub fn previous_epoch(&self) -> Option<EpochIndex> {
        self.current_epoch.checked_sub(1).filter(|e| *e >= FIRST_EPOCH)
    }

    /// The id the next bribe will receive. Fails once the counter is exhausted,
    /// so a caller can check before moving any funds.
    pub fn next_bribe_id(&self) -> Result<u64, VotingError> {
        self.bribe_count
            .checked_add(1)
            .map(|_| self.bribe_count)
            .ok_or(VotingError::Overflow)
    }

    /// Consume a bribe id.
    pub fn take_bribe_id(&mut self) -> Result<u64, VotingError> {
        let id = self.next_bribe_id()?;
        self.bribe_count = id + 1;
        Ok(id)
    }
}

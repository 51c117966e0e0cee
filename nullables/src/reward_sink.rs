//! Nullable reward-share sink: records the shares pushed to it.

use gauge_types::Address;
use gauge_voting::{ExternalError, RewardShareSink};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct NullRewardSink {
    shares: HashMap<Address, u64>,
    history: Vec<(Address, u64)>,
    reject: bool,
}

impl NullRewardSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail.
    pub fn reject_updates(&mut self, reject: bool) {
        self.reject = reject;
    }

    pub fn share(&self, target: &Address) -> Option<u64> {
        self.shares.get(target).copied()
    }

    /// Every update in call order.
    pub fn history(&self) -> &[(Address, u64)] {
        &self.history
    }
}

impl RewardShareSink for NullRewardSink {
    fn set_reward_share(&mut self, target: &Address, share: u64) -> Result<(), ExternalError> {
        if self.reject {
            return Err(ExternalError::Rejected("reward sink unavailable".into()));
        }
        self.shares.insert(*target, share);
        self.history.push((*target, share));
        Ok(())
    }
}

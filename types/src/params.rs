//! Factory parameters: the knobs a deployment is created with.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Parameters a gauge factory is created with.
///
/// The epoch duration can later be changed by the foreman; the genesis time
/// only determines when the first epoch advance becomes due.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryParams {
    /// Length of one voting epoch in seconds.
    pub epoch_duration_secs: u64,

    /// When epoch 1 began. The first advance is due at
    /// `genesis + epoch_duration_secs`.
    pub genesis: Timestamp,
}

impl FactoryParams {
    /// One week, the cadence used by most deployments.
    pub const DEFAULT_EPOCH_DURATION_SECS: u64 = 7 * 24 * 3600;

    pub fn new(epoch_duration_secs: u64, genesis: Timestamp) -> Self {
        Self {
            epoch_duration_secs,
            genesis,
        }
    }
}

impl Default for FactoryParams {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPOCH_DURATION_SECS, Timestamp::EPOCH)
    }
}

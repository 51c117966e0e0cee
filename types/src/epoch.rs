//! Epoch indices.

/// Index of a voting epoch. The factory starts at [`FIRST_EPOCH`] and only
/// ever increments.
pub type EpochIndex = u32;

/// The epoch a freshly created factory is in.
pub const FIRST_EPOCH: EpochIndex = 1;

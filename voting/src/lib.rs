//! Epoch-based gauge voting and reward settlement.
//!
//! Voters spread persistent weights across gauges. Once per epoch each
//! voter's externally derived voting power is snapshotted and committed to
//! gauges in proportion to those weights. Fees a gauge accrues during an
//! epoch, and third-party bribes attached to it, are paid out to the epoch's
//! voters pro rata to their committed power, exactly once each.
//!
//! [`GaugeEngine`] is the entry point; the component modules hold the
//! per-record rules it composes.

pub mod bribe;
pub mod clock;
pub mod commit;
pub mod engine;
pub mod error;
pub mod external;
pub mod fees;
pub mod invariants;
pub mod math;
mod persist;
pub mod registry;
pub mod weights;

pub use bribe::{bribe_vault_address, Bribe, BribeClaim, BribeClawback, BribeLedger};
pub use clock::Factory;
pub use commit::{CommitOutcome, EpochCommitEngine, EpochGauge, EpochVote, EpochVoterSnapshot};
pub use engine::GaugeEngine;
pub use error::{ErrorKind, VotingError};
pub use external::{Escrow, EscrowInfo, ExternalError, FeePool, RewardShareSink, TokenLedger};
pub use invariants::InvariantViolation;
pub use registry::{fee_vault_address, FeeCounter, Gauge, GaugeRegistry};
pub use weights::{GaugeWeight, VoteChange, VoterBook, VoterWeightBook};

//! Voting-engine errors.
//!
//! Every failure is local and synchronous: a call that returns an error has
//! not written anything, and the caller decides whether to retry.

use crate::external::ExternalError;
use gauge_store::StoreError;
use gauge_types::{Address, EpochIndex, FeeSide, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VotingError {
    // ── Timing ───────────────────────────────────────────────────────────
    #[error("epoch advance not due until {due} (now {now})")]
    EpochNotDue { now: Timestamp, due: Timestamp },

    #[error("epoch {epoch} has not elapsed yet (current epoch {current})")]
    EpochStillOpen { epoch: EpochIndex, current: EpochIndex },

    #[error("epoch {requested} is not the current epoch {current}")]
    WrongEpoch { requested: EpochIndex, current: EpochIndex },

    // ── State conflict ───────────────────────────────────────────────────
    #[error("voter {voter} already committed to gauge {gauge} in epoch {epoch}")]
    AlreadyCommitted {
        voter: Address,
        gauge: Address,
        epoch: EpochIndex,
    },

    #[error("already claimed")]
    AlreadyClaimed,

    #[error("epoch vote already closed or never committed")]
    AlreadyClosed,

    #[error("voter {voter} has no commitment to gauge {gauge} in epoch {epoch}")]
    NotCommitted {
        voter: Address,
        gauge: Address,
        epoch: EpochIndex,
    },

    #[error("weights changed since snapshot: snapshot seqno {snapshot}, current seqno {current}")]
    StaleWeights { snapshot: u64, current: u64 },

    #[error("voter has {allocated} power committed this epoch; revert commitments first")]
    MustWithdrawFirst { allocated: u64 },

    #[error("gauge {0} already exists")]
    GaugeExists(Address),

    // ── Authorization ────────────────────────────────────────────────────
    #[error("caller is not the foreman")]
    NotForeman,

    #[error("caller is not the vote delegate of voter {0}")]
    NotDelegate(Address),

    #[error("caller is not the briber of bribe {0}")]
    NotBriber(u64),

    // ── Arithmetic ───────────────────────────────────────────────────────
    #[error("arithmetic overflow")]
    Overflow,

    #[error("value does not fit the target integer width")]
    CastFailed,

    // ── Policy ───────────────────────────────────────────────────────────
    #[error("gauge {0} is disabled")]
    GaugeDisabled(Address),

    #[error("gauge {0} is disabled; weight may only be lowered")]
    GaugeDisabledCannotVote(Address),

    #[error("gauge {0} is enabled")]
    GaugeNotDisabled(Address),

    #[error("invalid epoch range [{start}, {end})")]
    InvalidRange { start: EpochIndex, end: EpochIndex },

    #[error("reward per epoch must be non-zero")]
    ZeroReward,

    #[error("epoch {0} received votes; its reward belongs to voters")]
    EpochWasVoted(EpochIndex),

    #[error("epoch gauge still holds {0} committed power")]
    NotEmpty(u64),

    #[error("no committed power to proportion against")]
    NothingToClaim,

    #[error("epoch duration must be non-zero")]
    InvalidEpochDuration,

    // ── Not found ────────────────────────────────────────────────────────
    #[error("gauge {0} not found")]
    GaugeNotFound(Address),

    #[error("no escrow for voter {0}")]
    EscrowNotFound(Address),

    #[error("gauge {gauge} has no record for epoch {epoch}")]
    EpochGaugeNotFound { gauge: Address, epoch: EpochIndex },

    #[error("voter {voter} has no snapshot for epoch {epoch}")]
    EpochVoterNotFound { voter: Address, epoch: EpochIndex },

    #[error("bribe {0} not found")]
    BribeNotFound(u64),

    // ── External ─────────────────────────────────────────────────────────
    #[error("insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("fee pool counter for {target} side {side} went backwards ({last} -> {observed})")]
    FeePoolRegressed {
        target: Address,
        side: FeeSide,
        last: u64,
        observed: u64,
    },

    #[error("external collaborator rejected the call: {0}")]
    External(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of [`VotingError`], mirroring how callers react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Timing,
    StateConflict,
    Authorization,
    Arithmetic,
    Policy,
    NotFound,
    External,
}

impl VotingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EpochNotDue { .. } | Self::EpochStillOpen { .. } | Self::WrongEpoch { .. } => {
                ErrorKind::Timing
            }
            Self::AlreadyCommitted { .. }
            | Self::AlreadyClaimed
            | Self::AlreadyClosed
            | Self::NotCommitted { .. }
            | Self::StaleWeights { .. }
            | Self::MustWithdrawFirst { .. }
            | Self::GaugeExists(_) => ErrorKind::StateConflict,
            Self::NotForeman | Self::NotDelegate(_) | Self::NotBriber(_) => {
                ErrorKind::Authorization
            }
            Self::Overflow | Self::CastFailed => ErrorKind::Arithmetic,
            Self::GaugeDisabled(_)
            | Self::GaugeDisabledCannotVote(_)
            | Self::GaugeNotDisabled(_)
            | Self::InvalidRange { .. }
            | Self::ZeroReward
            | Self::EpochWasVoted(_)
            | Self::NotEmpty(_)
            | Self::NothingToClaim
            | Self::InvalidEpochDuration => ErrorKind::Policy,
            Self::GaugeNotFound(_)
            | Self::EscrowNotFound(_)
            | Self::EpochGaugeNotFound { .. }
            | Self::EpochVoterNotFound { .. }
            | Self::BribeNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientFunds { .. }
            | Self::FeePoolRegressed { .. }
            | Self::External(_)
            | Self::Store(_)
            | Self::Serialization(_) => ErrorKind::External,
        }
    }
}

impl From<ExternalError> for VotingError {
    fn from(e: ExternalError) -> Self {
        match e {
            ExternalError::InsufficientFunds { needed, available } => {
                Self::InsufficientFunds { needed, available }
            }
            ExternalError::Rejected(reason) => Self::External(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            VotingError::EpochNotDue {
                now: Timestamp::new(1),
                due: Timestamp::new(2)
            }
            .kind(),
            ErrorKind::Timing
        );
        assert_eq!(VotingError::AlreadyClaimed.kind(), ErrorKind::StateConflict);
        assert_eq!(VotingError::NotForeman.kind(), ErrorKind::Authorization);
        assert_eq!(VotingError::CastFailed.kind(), ErrorKind::Arithmetic);
        assert_eq!(VotingError::ZeroReward.kind(), ErrorKind::Policy);
        assert_eq!(VotingError::BribeNotFound(3).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn insufficient_funds_maps_through() {
        let e: VotingError = ExternalError::InsufficientFunds {
            needed: 10,
            available: 3,
        }
        .into();
        match e {
            VotingError::InsufficientFunds { needed, available } => {
                assert_eq!(needed, 10);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

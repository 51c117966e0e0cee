use gauge_voting::{InvariantViolation, VotingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("scenario error: {0}")]
    Scenario(String),

    #[error("step {index} ({action}) failed: {source}")]
    StepFailed {
        index: usize,
        action: &'static str,
        #[source]
        source: VotingError,
    },

    #[error("step {index} ({action}) succeeded but was expected to fail with '{expected}'")]
    UnexpectedSuccess {
        index: usize,
        action: &'static str,
        expected: String,
    },

    #[error("step {index} ({action}) failed with '{actual}', expected '{expected}'")]
    WrongError {
        index: usize,
        action: &'static str,
        expected: String,
        actual: String,
    },

    #[error("engine setup failed: {0}")]
    Engine(#[from] VotingError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

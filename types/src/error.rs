//! Parsing errors for primitive types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown fee side: {0} (expected \"a\" or \"b\")")]
    UnknownFeeSide(String),
}

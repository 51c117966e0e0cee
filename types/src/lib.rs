//! Fundamental types for the gauge voting engine.
//!
//! This crate defines the primitives shared by every other crate in the workspace:
//! addresses, timestamps, epoch indices, fee sides, and factory parameters.

pub mod address;
pub mod epoch;
pub mod error;
pub mod params;
pub mod side;
pub mod time;

pub use address::Address;
pub use epoch::{EpochIndex, FIRST_EPOCH};
pub use error::TypesError;
pub use params::FactoryParams;
pub use side::FeeSide;
pub use time::Timestamp;

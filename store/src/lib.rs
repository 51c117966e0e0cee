//! Abstract storage traits for the gauge voting engine.
//!
//! Storage backends implement [`LedgerStore`]; the engine depends only on
//! the trait and serializes its own record types.

pub mod error;
pub mod ledger;

pub use error::StoreError;
pub use ledger::{LedgerStore, Table};

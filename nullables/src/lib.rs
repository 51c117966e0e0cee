//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the gauge engine consumes (clock, escrow, fee pool,
//! reward-share sink, token ledger, storage) has an in-memory stand-in here.
//! They:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real adapters for nullables in tests and in the simulator.

pub mod clock;
pub mod escrow;
pub mod fee_pool;
pub mod reward_sink;
pub mod store;
pub mod tokens;
pub mod world;

pub use clock::NullClock;
pub use escrow::NullEscrow;
pub use fee_pool::NullFeePool;
pub use reward_sink::NullRewardSink;
pub use store::NullLedgerStore;
pub use tokens::NullTokenLedger;
pub use world::NullWorld;

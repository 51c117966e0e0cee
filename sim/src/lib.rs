//! Scenario simulator for the gauge voting engine.
//!
//! Replays TOML scenarios against a [`gauge_nullables::NullWorld`] and
//! reports every step's outcome plus the final invariant audit.

pub mod config;
pub mod error;
pub mod scenario;

pub use config::SimConfig;
pub use error::SimError;
pub use scenario::{named, Scenario, ScenarioReport, ScenarioRunner, Step, StepReport};

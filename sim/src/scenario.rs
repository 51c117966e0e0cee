//! Scenario files and their replay against a [`NullWorld`].
//!
//! A scenario is a TOML list of steps. Accounts, gauges and mints are named
//! with plain strings and mapped to addresses deterministically. A step may
//! carry `expect_error`, a fragment of the error message it must fail with.

use crate::{SimConfig, SimError};
use gauge_nullables::NullWorld;
use gauge_types::{Address, EpochIndex, FeeSide};
use gauge_utils::format_countdown;
use gauge_voting::{CommitOutcome, VotingError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Address for a scenario name.
pub fn named(name: &str) -> Address {
    Address::derive(&[b"gauge-sim", name.as_bytes()])
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn from_toml_file(path: &str) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SimError::Scenario(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        toml::from_str(s).map_err(|e| SimError::Scenario(e.to_string()))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioStep {
    #[serde(flatten)]
    pub step: Step,
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    AdvanceTime { secs: u64 },
    /// Jump the clock to the next boundary and advance the epoch.
    NextEpoch,
    /// Advance the epoch at the current clock time.
    AdvanceEpoch,
    CreateGauge {
        gauge: String,
        mints: [String; 2],
        #[serde(default = "default_true")]
        enable: bool,
    },
    EnableGauge { gauge: String },
    DisableGauge { gauge: String },
    SetEpochDuration { secs: u64 },
    Lock { voter: String, power: u64 },
    Delegate { voter: String, delegate: String },
    Fund { account: String, mint: String, amount: u64 },
    AccrueFees { gauge: String, side: FeeSide, amount: u64 },
    SetVote { voter: String, gauge: String, weight: u32 },
    Snapshot { voter: String },
    ResetVoter { voter: String },
    EnsureEpochGauge { gauge: String },
    Commit { voter: String, gauge: String },
    /// Snapshot, create epoch gauges and commit in one step.
    VoteEpoch { voter: String, gauges: Vec<String> },
    Revert { voter: String, gauge: String },
    Close { voter: String, gauge: String, epoch: EpochIndex },
    CleanEmptyEpochGauge { gauge: String, epoch: EpochIndex },
    SyncGauge { gauge: String },
    SyncDisabledGauge { gauge: String },
    ClaimFee {
        voter: String,
        gauge: String,
        epoch: EpochIndex,
        side: FeeSide,
    },
    CreateBribe {
        briber: String,
        gauge: String,
        mint: String,
        reward_per_epoch: u64,
        epoch_end: EpochIndex,
    },
    ClaimBribe { voter: String, bribe: u64, epoch: EpochIndex },
    ClawbackBribe { briber: String, bribe: u64, epoch: EpochIndex },
    CheckInvariants,
}

fn default_true() -> bool {
    true
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AdvanceTime { .. } => "advance_time",
            Self::NextEpoch => "next_epoch",
            Self::AdvanceEpoch => "advance_epoch",
            Self::CreateGauge { .. } => "create_gauge",
            Self::EnableGauge { .. } => "enable_gauge",
            Self::DisableGauge { .. } => "disable_gauge",
            Self::SetEpochDuration { .. } => "set_epoch_duration",
            Self::Lock { .. } => "lock",
            Self::Delegate { .. } => "delegate",
            Self::Fund { .. } => "fund",
            Self::AccrueFees { .. } => "accrue_fees",
            Self::SetVote { .. } => "set_vote",
            Self::Snapshot { .. } => "snapshot",
            Self::ResetVoter { .. } => "reset_voter",
            Self::EnsureEpochGauge { .. } => "ensure_epoch_gauge",
            Self::Commit { .. } => "commit",
            Self::VoteEpoch { .. } => "vote_epoch",
            Self::Revert { .. } => "revert",
            Self::Close { .. } => "close",
            Self::CleanEmptyEpochGauge { .. } => "clean_empty_epoch_gauge",
            Self::SyncGauge { .. } => "sync_gauge",
            Self::SyncDisabledGauge { .. } => "sync_disabled_gauge",
            Self::ClaimFee { .. } => "claim_fee",
            Self::CreateBribe { .. } => "create_bribe",
            Self::ClaimBribe { .. } => "claim_bribe",
            Self::ClawbackBribe { .. } => "clawback_bribe",
            Self::CheckInvariants => "check_invariants",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub epoch: EpochIndex,
    pub ok: bool,
    pub outcome: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub final_epoch: EpochIndex,
    pub steps: Vec<StepReport>,
    /// account name → mint name → balance, for every name the scenario used.
    pub balances: BTreeMap<String, BTreeMap<String, u64>>,
    pub invariants_ok: bool,
}

pub struct ScenarioRunner {
    world: NullWorld,
    foreman: Address,
    accounts: BTreeSet<String>,
    mints: BTreeSet<String>,
}

impl ScenarioRunner {
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let foreman = named(&config.foreman);
        let mut world = NullWorld::new(foreman, &config.factory_params())?;
        world.escrow = gauge_nullables::NullEscrow::new(config.max_lock_secs);
        Ok(Self {
            world,
            foreman,
            accounts: BTreeSet::new(),
            mints: BTreeSet::new(),
        })
    }

    pub fn world(&self) -> &NullWorld {
        &self.world
    }

    /// Replay every step, then audit the invariants.
    pub fn run(mut self, scenario: &Scenario) -> Result<ScenarioReport, SimError> {
        tracing::info!(scenario = %scenario.name, steps = scenario.steps.len(), "scenario started");
        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (index, entry) in scenario.steps.iter().enumerate() {
            let action = entry.step.name();
            let result = self.apply(&entry.step);
            let epoch = self.world.current_epoch();
            let report = match (result, &entry.expect_error) {
                (Ok(outcome), None) => {
                    tracing::info!(index, action, epoch, %outcome, "step ok");
                    StepReport { index, action, epoch, ok: true, outcome }
                }
                (Ok(_), Some(expected)) => {
                    return Err(SimError::UnexpectedSuccess {
                        index,
                        action,
                        expected: expected.clone(),
                    });
                }
                (Err(e), Some(expected)) if e.to_string().contains(expected.as_str()) => {
                    tracing::info!(index, action, epoch, error = %e, "step failed as expected");
                    StepReport { index, action, epoch, ok: false, outcome: e.to_string() }
                }
                (Err(e), Some(expected)) => {
                    return Err(SimError::WrongError {
                        index,
                        action,
                        expected: expected.clone(),
                        actual: e.to_string(),
                    });
                }
                (Err(source), None) => {
                    return Err(SimError::StepFailed { index, action, source });
                }
            };
            steps.push(report);
        }

        self.world.check_invariants()?;
        tracing::info!(scenario = %scenario.name, "invariants hold");
        Ok(ScenarioReport {
            name: scenario.name.clone(),
            final_epoch: self.world.current_epoch(),
            steps,
            balances: self.balances(),
            invariants_ok: true,
        })
    }

    fn balances(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        self.accounts
            .iter()
            .map(|account| {
                let per_mint = self
                    .mints
                    .iter()
                    .map(|mint| (mint.clone(), self.world.balance(&named(mint), &named(account))))
                    .filter(|(_, b)| *b > 0)
                    .collect();
                (account.clone(), per_mint)
            })
            .collect()
    }

    fn account(&mut self, name: &str) -> Address {
        self.accounts.insert(name.to_string());
        named(name)
    }

    fn mint(&mut self, name: &str) -> Address {
        self.mints.insert(name.to_string());
        named(name)
    }

    fn apply(&mut self, step: &Step) -> Result<String, VotingError> {
        let w = &mut self.world;
        match step {
            Step::AdvanceTime { secs } => {
                let now = w.clock.advance(*secs);
                let due = w.engine.factory().next_epoch_starts_at;
                let countdown = format_countdown(now.as_secs(), due.as_secs());
                Ok(format!("now {now}, next epoch {countdown}"))
            }
            Step::NextEpoch => Ok(format!("epoch {}", w.next_epoch()?)),
            Step::AdvanceEpoch => Ok(format!("epoch {}", w.advance_epoch()?)),
            Step::CreateGauge { gauge, mints, enable } => {
                let fee_mints = [self.mint(&mints[0]), self.mint(&mints[1])];
                let w = &mut self.world;
                w.engine.create_gauge(named(gauge), fee_mints, &w.pool)?;
                if *enable {
                    w.engine.enable_gauge(&self.foreman, &named(gauge))?;
                }
                Ok(format!("gauge {gauge} created"))
            }
            Step::EnableGauge { gauge } => {
                let changed = w.engine.enable_gauge(&self.foreman, &named(gauge))?;
                Ok(format!("enabled (changed: {changed})"))
            }
            Step::DisableGauge { gauge } => {
                let changed = w.engine.disable_gauge(&self.foreman, &named(gauge))?;
                Ok(format!("disabled (changed: {changed})"))
            }
            Step::SetEpochDuration { secs } => {
                w.engine.set_epoch_duration(&self.foreman, *secs)?;
                Ok(format!("epoch duration {secs}s"))
            }
            Step::Lock { voter, power } => {
                let voter = self.account(voter);
                self.world.lock(voter, *power);
                Ok(format!("locked {power}"))
            }
            Step::Delegate { voter, delegate } => {
                let voter = named(voter);
                let delegate = self.account(delegate);
                self.world.escrow.set_delegate(&voter, delegate);
                Ok("delegate set".to_string())
            }
            Step::Fund { account, mint, amount } => {
                let account = self.account(account);
                let mint = self.mint(mint);
                self.world.fund(&mint, &account, *amount)?;
                Ok(format!("funded {amount}"))
            }
            Step::AccrueFees { gauge, side, amount } => {
                w.accrue_fees(&named(gauge), *side, *amount)?;
                Ok(format!("accrued {amount} on side {side}"))
            }
            Step::SetVote { voter, gauge, weight } => {
                let change = w.set_vote(&named(voter), &named(gauge), *weight)?;
                Ok(format!(
                    "weight {} -> {}, total {}",
                    change.previous_weight, change.weight, change.total_weight
                ))
            }
            Step::Snapshot { voter } => {
                let created = w.snapshot(&named(voter))?;
                Ok(format!("snapshot created: {created}"))
            }
            Step::ResetVoter { voter } => {
                w.reset(&named(voter))?;
                Ok("snapshot reset".to_string())
            }
            Step::EnsureEpochGauge { gauge } => {
                let created = w.ensure_epoch_gauge(&named(gauge))?;
                Ok(format!("epoch gauge created: {created}"))
            }
            Step::Commit { voter, gauge } => match w.commit(&named(voter), &named(gauge))? {
                CommitOutcome::Committed { allocated } => Ok(format!("allocated {allocated}")),
                CommitOutcome::NothingToCommit => Ok("nothing to commit".to_string()),
            },
            Step::VoteEpoch { voter, gauges } => {
                let gauges: Vec<Address> = gauges.iter().map(|g| named(g)).collect();
                let allocated = w.vote_epoch(&named(voter), &gauges)?;
                Ok(format!("allocated {allocated}"))
            }
            Step::Revert { voter, gauge } => {
                let released = w.revert(&named(voter), &named(gauge))?;
                Ok(format!("released {released}"))
            }
            Step::Close { voter, gauge, epoch } => {
                let closed = w.close(&named(voter), &named(gauge), *epoch)?;
                Ok(format!("closed {closed}"))
            }
            Step::CleanEmptyEpochGauge { gauge, epoch } => {
                w.clean_empty_epoch_gauge(&named(gauge), *epoch)?;
                Ok("cleaned".to_string())
            }
            Step::SyncGauge { gauge } => {
                let share = w.sync_gauge(&named(gauge))?;
                Ok(format!("share {share}"))
            }
            Step::SyncDisabledGauge { gauge } => {
                w.sync_disabled_gauge(&named(gauge))?;
                Ok("share 0".to_string())
            }
            Step::ClaimFee { voter, gauge, epoch, side } => {
                let paid = w.claim_fee(&named(voter), &named(gauge), *epoch, *side)?;
                Ok(format!("paid {paid}"))
            }
            Step::CreateBribe {
                briber,
                gauge,
                mint,
                reward_per_epoch,
                epoch_end,
            } => {
                let briber = self.account(briber);
                let mint = self.mint(mint);
                let id = self.world.create_bribe(
                    &briber,
                    &named(gauge),
                    &mint,
                    *reward_per_epoch,
                    *epoch_end,
                )?;
                Ok(format!("bribe {id}"))
            }
            Step::ClaimBribe { voter, bribe, epoch } => {
                let paid = w.claim_bribe(&named(voter), *bribe, *epoch)?;
                Ok(format!("paid {paid}"))
            }
            Step::ClawbackBribe { briber, bribe, epoch } => {
                let paid = w.clawback_bribe(&named(briber), *bribe, *epoch)?;
                Ok(format!("returned {paid}"))
            }
            Step::CheckInvariants => match w.check_invariants() {
                Ok(()) => Ok("invariants hold".to_string()),
                Err(v) => Err(VotingError::External(v.to_string())),
            },
        }
    }
}

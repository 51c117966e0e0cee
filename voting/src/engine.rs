//! The gauge engine: every public operation over one factory.
//!
//! Each mutator is a single atomic unit: it runs all of its checks first,
//! then performs external token transfers, then writes engine state. A call
//! that returns an error has changed nothing.
//!
//! External collaborators are passed per call so a single engine can be
//! driven by production adapters or by the in-memory doubles.

use crate::bribe::{Bribe, BribeLedger};
use crate::clock::Factory;
use crate::commit::{CommitOutcome, EpochCommitEngine};
use crate::error::VotingError;
use crate::external::{Escrow, EscrowInfo, FeePool, RewardShareSink, TokenLedger};
use crate::fees::{pruned_totals, FeeCapture, FeeClaim};
use crate::registry::{Gauge, GaugeRegistry};
use crate::weights::{VoteChange, VoterWeightBook};
use gauge_types::{Address, EpochIndex, FactoryParams, FeeSide, Timestamp};

pub struct GaugeEngine {
    pub(crate) factory: Factory,
    pub(crate) registry: GaugeRegistry,
    pub(crate) book: VoterWeightBook,
    pub(crate) epochs: EpochCommitEngine,
    pub(crate) bribes: BribeLedger,
}

impl GaugeEngine {
    pub fn new(foreman: Address, params: &FactoryParams) -> Result<Self, VotingError> {
        Ok(Self {
            factory: Factory::new(foreman, params)?,
            registry: GaugeRegistry::new(),
            book: VoterWeightBook::new(),
            epochs: EpochCommitEngine::new(),
            bribes: BribeLedger::new(),
        })
    }

    // ── Read accessors ───────────────────────────────────────────────────

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn current_epoch(&self) -> EpochIndex {
        self.factory.current_epoch
    }

    pub fn registry(&self) -> &GaugeRegistry {
        &self.registry
    }

    pub fn gauge(&self, target: &Address) -> Result<&Gauge, VotingError> {
        self.registry.get(target)
    }

    pub fn weights(&self) -> &VoterWeightBook {
        &self.book
    }

    pub fn epochs(&self) -> &EpochCommitEngine {
        &self.epochs
    }

    pub fn bribes(&self) -> &BribeLedger {
        &self.bribes
    }

    pub fn bribe(&self, id: u64) -> Result<&Bribe, VotingError> {
        self.bribes.get(id)
    }

    // ── Clock & admin ────────────────────────────────────────────────────

    /// Permissionless. Moves to the next epoch once its start time is reached.
    pub fn advance_epoch(&mut self, now: Timestamp) -> Result<EpochIndex, VotingError> {
        let epoch = self.factory.advance(now)?;
        tracing::info!(
            epoch,
            next_epoch_starts_at = %self.factory.next_epoch_starts_at,
            "epoch advanced"
        );
        Ok(epoch)
    }

    pub fn set_foreman(
        &mut self,
        authority: &Address,
        new_foreman: Address,
    ) -> Result<(), VotingError> {
        self.factory.set_foreman(authority, new_foreman)?;
        tracing::info!(foreman = %new_foreman, "foreman changed");
        Ok(())
    }

    pub fn set_epoch_duration(
        &mut self,
        authority: &Address,
        secs: u64,
    ) -> Result<(), VotingError> {
        self.factory.set_epoch_duration(authority, secs)?;
        tracing::info!(epoch_duration_secs = secs, "epoch duration changed");
        Ok(())
    }

    // ── Gauges ───────────────────────────────────────────────────────────

    /// Permissionless. The new gauge is disabled until the foreman enables it.
    pub fn create_gauge(
        &mut self,
        target: Address,
        fee_mints: [Address; 2],
        pool: &dyn FeePool,
    ) -> Result<(), VotingError> {
        let pool_totals = FeeSide::ALL.map(|side| pool.cumulative_fees(&target, side));
        self.registry.create(target, fee_mints, pool_totals)?;
        tracing::info!(gauge = %target, "gauge created");
        Ok(())
    }

    pub fn enable_gauge(
        &mut self,
        authority: &Address,
        target: &Address,
    ) -> Result<bool, VotingError> {
        self.set_gauge_enabled(authority, target, true)
    }

    pub fn disable_gauge(
        &mut self,
        authority: &Address,
        target: &Address,
    ) -> Result<bool, VotingError> {
        self.set_gauge_enabled(authority, target, false)
    }

    fn set_gauge_enabled(
        &mut self,
        authority: &Address,
        target: &Address,
        enabled: bool,
    ) -> Result<bool, VotingError> {
        self.factory.require_foreman(authority)?;
        let changed = self.registry.set_enabled(target, enabled)?;
        if changed {
            tracing::info!(gauge = %target, enabled, "gauge enablement changed");
        } else {
            tracing::debug!(gauge = %target, enabled, "gauge enablement unchanged");
        }
        Ok(changed)
    }

    // ── Weights ──────────────────────────────────────────────────────────

    /// Owner or delegate sets the voter's persistent weight on a gauge.
    pub fn set_vote(
        &mut self,
        authority: &Address,
        voter: &Address,
        gauge: &Address,
        weight: u32,
        escrow: &dyn Escrow,
    ) -> Result<VoteChange, VotingError> {
        let info = lookup_escrow(escrow, voter)?;
        if !info.can_set_votes(authority) {
            return Err(VotingError::NotDelegate(*voter));
        }
        let gauge = self.registry.get(gauge)?;
        let change = self.book.set_vote(voter, gauge, weight)?;
        tracing::info!(
            voter = %voter,
            gauge = %gauge.target,
            weight,
            total_weight = change.total_weight,
            seqno = change.weight_change_seqno,
            "vote weight set"
        );
        Ok(change)
    }

    // ── Epoch commitments ────────────────────────────────────────────────

    /// Permissionless. Creates the voter's snapshot for the current epoch if
    /// absent; returns whether it was created.
    pub fn snapshot_epoch_voter(
        &mut self,
        voter: &Address,
        now: Timestamp,
        escrow: &dyn Escrow,
    ) -> Result<bool, VotingError> {
        let epoch = self.factory.current_epoch;
        if self.epochs.voter(voter, epoch).is_some() {
            tracing::debug!(voter = %voter, epoch, "voter snapshot already exists");
            return Ok(false);
        }
        let power = lookup_power(escrow, voter, now)?;
        let seqno = self.book.seqno(voter);
        self.epochs.snapshot_voter(voter, epoch, power, seqno);
        tracing::info!(
            voter = %voter,
            epoch,
            voting_power = power,
            seqno,
            "voter snapshot created"
        );
        Ok(true)
    }

    /// Permissionless. Refreshes the current snapshot while nothing is
    /// committed from it.
    pub fn reset_epoch_voter(
        &mut self,
        voter: &Address,
        now: Timestamp,
        escrow: &dyn Escrow,
    ) -> Result<(), VotingError> {
        let epoch = self.factory.current_epoch;
        let power = lookup_power(escrow, voter, now)?;
        let seqno = self.book.seqno(voter);
        self.epochs.reset_voter(voter, epoch, power, seqno)?;
        tracing::info!(voter = %voter, epoch, voting_power = power, seqno, "voter snapshot reset");
        Ok(())
    }

    /// Permissionless. Creates the gauge's record for the current epoch,
    /// capturing the fees the pool accrued since the previous capture.
    /// Returns whether a record was created.
    pub fn ensure_epoch_gauge(
        &mut self,
        target: &Address,
        epoch: EpochIndex,
        pool: &dyn FeePool,
        tokens: &mut dyn TokenLedger,
    ) -> Result<bool, VotingError> {
        self.factory.require_live(epoch)?;
        let gauge = self.registry.get(target)?;
        gauge.require_enabled()?;
        if self.epochs.epoch_gauge(target, epoch).is_some() {
            tracing::debug!(gauge = %target, epoch, "epoch gauge already exists");
            return Ok(false);
        }

        let pool_totals = FeeSide::ALL.map(|side| pool.cumulative_fees(target, side));
        let capture = FeeCapture::compute(gauge, pool_totals)?;
        if !capture.is_empty() {
            for side in FeeSide::ALL {
                let amount = capture.accrued[side.index()];
                let source = pool.fee_account(target, side);
                require_balance(tokens, &gauge.fee(side).mint, &source, amount)?;
            }
            for side in FeeSide::ALL {
                let amount = capture.accrued[side.index()];
                if amount > 0 {
                    tokens.transfer(
                        &gauge.fee(side).mint,
                        &pool.fee_account(target, side),
                        &gauge.fee_vault(side),
                        amount,
                    )?;
                }
            }
        }

        let gauge = self.registry.get_mut(target)?;
        capture.apply(gauge);
        self.epochs.create_epoch_gauge(target, epoch, capture.accrued);
        tracing::info!(
            gauge = %target,
            epoch,
            accrued_a = capture.accrued[0],
            accrued_b = capture.accrued[1],
            "epoch gauge created"
        );
        Ok(true)
    }

    /// Permissionless. Commits the voter's current-epoch power to `gauge`
    /// according to their weights.
    pub fn commit(
        &mut self,
        voter: &Address,
        gauge: &Address,
    ) -> Result<CommitOutcome, VotingError> {
        let epoch = self.factory.current_epoch;
        let gauge_record = self.registry.get(gauge)?;
        let outcome = self.epochs.commit(
            voter,
            gauge_record,
            epoch,
            self.book.weight(voter, gauge),
            self.book.total_weight(voter),
            self.book.seqno(voter),
        )?;
        match outcome {
            CommitOutcome::Committed { allocated } => {
                tracing::info!(voter = %voter, gauge = %gauge, epoch, allocated, "vote committed");
            }
            CommitOutcome::NothingToCommit => {
                tracing::debug!(voter = %voter, gauge = %gauge, epoch, "no power to commit");
            }
        }
        Ok(outcome)
    }

    /// Delegate only. Withdraws a commitment in the current epoch.
    pub fn revert(
        &mut self,
        authority: &Address,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
        escrow: &dyn Escrow,
    ) -> Result<u64, VotingError> {
        require_delegate(escrow, authority, voter)?;
        self.factory.require_live(epoch)?;
        let released = self.epochs.revert(voter, gauge, epoch)?;
        tracing::info!(voter = %voter, gauge = %gauge, epoch, released, "vote reverted");
        Ok(released)
    }

    /// Delegate only. Deletes the vote record of an elapsed epoch. The
    /// allocation stays claimable for fees and bribes.
    pub fn close(
        &mut self,
        authority: &Address,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
        escrow: &dyn Escrow,
    ) -> Result<u64, VotingError> {
        require_delegate(escrow, authority, voter)?;
        self.factory.require_elapsed(epoch)?;
        let vote = self.epochs.close(voter, gauge, epoch)?;
        tracing::info!(
            voter = %voter,
            gauge = %gauge,
            epoch,
            allocated = vote.allocated_power,
            "vote closed"
        );
        Ok(vote.allocated_power)
    }

    /// Permissionless. Removes an elapsed epoch gauge nobody voted for and
    /// folds its fees into the gauge's pruned total.
    pub fn clean_empty_epoch_gauge(
        &mut self,
        target: &Address,
        epoch: EpochIndex,
    ) -> Result<(), VotingError> {
        self.factory.require_elapsed(epoch)?;
        let eg = self
            .epochs
            .epoch_gauge(target, epoch)
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: *target,
                epoch,
            })?;
        if eg.total_power != 0 {
            return Err(VotingError::NotEmpty(eg.total_power));
        }
        let pruned = pruned_totals(self.registry.get(target)?, eg)?;

        self.epochs.remove_empty_epoch_gauge(target, epoch)?;
        let gauge = self.registry.get_mut(target)?;
        for side in FeeSide::ALL {
            gauge.fee_mut(side).pruned_accrued = pruned[side.index()];
        }
        tracing::info!(gauge = %target, epoch, "empty epoch gauge cleaned");
        Ok(())
    }

    // ── Reward shares ────────────────────────────────────────────────────

    /// Permissionless. Pushes last epoch's total power to the sink.
    pub fn sync_gauge(
        &self,
        target: &Address,
        sink: &mut dyn RewardShareSink,
    ) -> Result<u64, VotingError> {
        self.registry.get(target)?.require_enabled()?;
        let share = self
            .factory
            .previous_epoch()
            .and_then(|epoch| self.epochs.epoch_gauge(target, epoch))
            .map(|eg| eg.total_power)
            .unwrap_or(0);
        sink.set_reward_share(target, share)?;
        tracing::info!(gauge = %target, share, "reward share synced");
        Ok(share)
    }

    /// Permissionless. Zeroes the reward share of a disabled gauge.
    pub fn sync_disabled_gauge(
        &self,
        target: &Address,
        sink: &mut dyn RewardShareSink,
    ) -> Result<(), VotingError> {
        if self.registry.get(target)?.enabled {
            return Err(VotingError::GaugeNotDisabled(*target));
        }
        sink.set_reward_share(target, 0)?;
        tracing::info!(gauge = %target, "disabled gauge reward share zeroed");
        Ok(())
    }

    // ── Fees ─────────────────────────────────────────────────────────────

    /// Delegate only. Pays the voter's share of one side of an elapsed
    /// epoch's fees to the escrow owner. Returns the amount paid.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_fee(
        &mut self,
        authority: &Address,
        voter: &Address,
        target: &Address,
        epoch: EpochIndex,
        side: FeeSide,
        escrow: &dyn Escrow,
        tokens: &mut dyn TokenLedger,
    ) -> Result<u64, VotingError> {
        let info = require_delegate(escrow, authority, voter)?;
        self.factory.require_elapsed(epoch)?;
        let gauge = self.registry.get(target)?;
        let eg = self
            .epochs
            .epoch_gauge(target, epoch)
            .ok_or(VotingError::EpochGaugeNotFound {
                gauge: *target,
                epoch,
            })?;
        let snapshot = self
            .epochs
            .voter(voter, epoch)
            .ok_or(VotingError::EpochVoterNotFound {
                voter: *voter,
                epoch,
            })?;
        let allocation = self.epochs.allocation(voter, target, epoch);
        let claim = match FeeClaim::compute(gauge, eg, snapshot, allocation, side)? {
            Some(claim) => claim,
            None => {
                tracing::debug!(
                    voter = %voter,
                    gauge = %target,
                    epoch,
                    %side,
                    "no committed power; nothing to claim"
                );
                return Ok(0);
            }
        };

        if claim.share > 0 {
            let mint = gauge.fee(side).mint;
            let vault = gauge.fee_vault(side);
            require_balance(tokens, &mint, &vault, claim.share)?;
            tokens.transfer(&mint, &vault, &info.owner, claim.share)?;
        }

        let gauge = self.registry.get_mut(target)?;
        let snapshot = self
            .epochs
            .voter_mut(voter, epoch)
            .ok_or(VotingError::EpochVoterNotFound {
                voter: *voter,
                epoch,
            })?;
        claim.apply(gauge, snapshot);
        tracing::info!(
            voter = %voter,
            gauge = %target,
            epoch,
            %side,
            amount = claim.share,
            "fee claimed"
        );
        Ok(claim.share)
    }

    // ── Bribes ───────────────────────────────────────────────────────────

    /// Escrows `reward_per_epoch` for every epoch from the current one up to
    /// (not including) `epoch_end`. Returns the bribe id.
    pub fn create_bribe(
        &mut self,
        briber: &Address,
        gauge: &Address,
        mint: &Address,
        reward_per_epoch: u64,
        epoch_end: EpochIndex,
        tokens: &mut dyn TokenLedger,
    ) -> Result<u64, VotingError> {
        self.registry.get(gauge)?;
        let id = self.factory.next_bribe_id()?;
        let bribe = BribeLedger::prepare(
            id,
            *gauge,
            *briber,
            *mint,
            reward_per_epoch,
            self.factory.current_epoch,
            epoch_end,
        )?;
        let escrow_amount = bribe.total_escrow()?;
        require_balance(tokens, mint, briber, escrow_amount)?;
        tokens.transfer(mint, briber, &bribe.vault(), escrow_amount)?;

        self.factory.take_bribe_id()?;
        tracing::info!(
            bribe = id,
            gauge = %gauge,
            briber = %briber,
            reward_per_epoch,
            epoch_start = bribe.epoch_start,
            epoch_end,
            escrow = escrow_amount,
            "bribe created"
        );
        self.bribes.insert(bribe);
        Ok(id)
    }

    /// Delegate only. Pays the voter's share of an elapsed epoch's bribe to
    /// the escrow owner.
    pub fn claim_bribe(
        &mut self,
        authority: &Address,
        voter: &Address,
        bribe_id: u64,
        epoch: EpochIndex,
        escrow: &dyn Escrow,
        tokens: &mut dyn TokenLedger,
    ) -> Result<u64, VotingError> {
        let info = require_delegate(escrow, authority, voter)?;
        self.factory.require_elapsed(epoch)?;
        let bribe = self.bribes.get(bribe_id)?;
        let claim = self.bribes.check_claim(
            voter,
            bribe_id,
            epoch,
            self.epochs.epoch_gauge(&bribe.gauge, epoch),
            self.epochs.allocation(voter, &bribe.gauge, epoch),
        )?;
        if claim.amount > 0 {
            require_balance(tokens, &bribe.mint, &bribe.vault(), claim.amount)?;
            tokens.transfer(&bribe.mint, &bribe.vault(), &info.owner, claim.amount)?;
        }
        let amount = claim.amount;
        self.bribes.record_claim(claim)?;
        tracing::info!(voter = %voter, bribe = bribe_id, epoch, amount, "bribe claimed");
        Ok(amount)
    }

    /// Briber only. Returns an unvoted elapsed epoch's reward to the briber.
    pub fn clawback_bribe(
        &mut self,
        authority: &Address,
        bribe_id: u64,
        epoch: EpochIndex,
        tokens: &mut dyn TokenLedger,
    ) -> Result<u64, VotingError> {
        self.factory.require_elapsed(epoch)?;
        let bribe = self.bribes.get(bribe_id)?;
        let clawback = self.bribes.check_clawback(
            authority,
            bribe_id,
            epoch,
            self.epochs.epoch_gauge(&bribe.gauge, epoch),
        )?;
        require_balance(tokens, &bribe.mint, &bribe.vault(), clawback.amount)?;
        tokens.transfer(&bribe.mint, &bribe.vault(), &bribe.briber, clawback.amount)?;
        let amount = clawback.amount;
        self.bribes.record_clawback(clawback)?;
        tracing::info!(bribe = bribe_id, epoch, amount, "bribe clawed back");
        Ok(amount)
    }
}

fn lookup_escrow(escrow: &dyn Escrow, voter: &Address) -> Result<EscrowInfo, VotingError> {
    escrow
        .escrow(voter)
        .ok_or(VotingError::EscrowNotFound(*voter))
}

fn lookup_power(escrow: &dyn Escrow, voter: &Address, now: Timestamp) -> Result<u64, VotingError> {
    escrow
        .voting_power(voter, now)
        .ok_or(VotingError::EscrowNotFound(*voter))
}

fn require_delegate(
    escrow: &dyn Escrow,
    authority: &Address,
    voter: &Address,
) -> Result<EscrowInfo, VotingError> {
    let info = lookup_escrow(escrow, voter)?;
    if !info.is_delegate(authority) {
        return Err(VotingError::NotDelegate(*voter));
    }
    Ok(info)
}

fn require_balance(
    tokens: &dyn TokenLedger,
    mint: &Address,
    account: &Address,
    needed: u64,
) -> Result<(), VotingError> {
    let available = tokens.balance_of(mint, account);
    if available < needed {
        return Err(VotingError::InsufficientFunds { needed, available });
    }
    Ok(())
}

//! A gauge engine wired to every nullable collaborator.
//!
//! Tests and the simulator drive the engine through [`NullWorld`] so they
//! only name voters, gauges and amounts. Delegate-gated calls are issued by
//! the voter's current escrow delegate.

use crate::{NullClock, NullEscrow, NullFeePool, NullRewardSink, NullTokenLedger};
use gauge_types::{Address, EpochIndex, FactoryParams, FeeSide, Timestamp};
use gauge_voting::{
    CommitOutcome, Escrow, GaugeEngine, InvariantViolation, TokenLedger, VoteChange, VotingError,
};

pub struct NullWorld {
    pub foreman: Address,
    pub clock: NullClock,
    pub escrow: NullEscrow,
    pub pool: NullFeePool,
    pub sink: NullRewardSink,
    pub tokens: NullTokenLedger,
    pub engine: GaugeEngine,
}

impl NullWorld {
    pub fn new(foreman: Address, params: &FactoryParams) -> Result<Self, VotingError> {
        Ok(Self {
            foreman,
            clock: NullClock::new(params.genesis.as_secs()),
            escrow: NullEscrow::default(),
            pool: NullFeePool::new(),
            sink: NullRewardSink::new(),
            tokens: NullTokenLedger::new(),
            engine: GaugeEngine::new(foreman, params)?,
        })
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn current_epoch(&self) -> EpochIndex {
        self.engine.current_epoch()
    }

    /// Move the clock to the next epoch boundary and advance.
    pub fn next_epoch(&mut self) -> Result<EpochIndex, VotingError> {
        self.clock
            .advance_to(self.engine.factory().next_epoch_starts_at);
        self.engine.advance_epoch(self.clock.now())
    }

    pub fn advance_epoch(&mut self) -> Result<EpochIndex, VotingError> {
        self.engine.advance_epoch(self.clock.now())
    }

    /// Create and enable a gauge.
    pub fn add_gauge(
        &mut self,
        target: Address,
        fee_mints: [Address; 2],
    ) -> Result<(), VotingError> {
        self.engine.create_gauge(target, fee_mints, &self.pool)?;
        self.engine.enable_gauge(&self.foreman, &target)?;
        Ok(())
    }

    pub fn lock(&mut self, voter: Address, power: u64) {
        self.escrow.lock_permanent(voter, power);
    }

    pub fn fund(
        &mut self,
        mint: &Address,
        account: &Address,
        amount: u64,
    ) -> Result<(), VotingError> {
        self.tokens.mint_to(mint, account, amount)?;
        Ok(())
    }

    pub fn balance(&self, mint: &Address, account: &Address) -> u64 {
        self.tokens.balance_of(mint, account)
    }

    /// Accrue pool fees for `target` in the gauge's fee mint for `side`.
    pub fn accrue_fees(
        &mut self,
        target: &Address,
        side: FeeSide,
        amount: u64,
    ) -> Result<(), VotingError> {
        let mint = self.engine.gauge(target)?.fee(side).mint;
        self.pool
            .accrue(target, side, &mint, amount, &mut self.tokens)?;
        Ok(())
    }

    pub fn delegate_of(&self, voter: &Address) -> Address {
        self.escrow
            .escrow(voter)
            .map(|info| info.vote_delegate)
            .unwrap_or(*voter)
    }

    pub fn set_vote(
        &mut self,
        voter: &Address,
        gauge: &Address,
        weight: u32,
    ) -> Result<VoteChange, VotingError> {
        let authority = self.delegate_of(voter);
        self.engine
            .set_vote(&authority, voter, gauge, weight, &self.escrow)
    }

    pub fn snapshot(&mut self, voter: &Address) -> Result<bool, VotingError> {
        self.engine
            .snapshot_epoch_voter(voter, self.clock.now(), &self.escrow)
    }

    pub fn reset(&mut self, voter: &Address) -> Result<(), VotingError> {
        self.engine
            .reset_epoch_voter(voter, self.clock.now(), &self.escrow)
    }

    pub fn ensure_epoch_gauge(&mut self, gauge: &Address) -> Result<bool, VotingError> {
        let epoch = self.engine.current_epoch();
        self.engine
            .ensure_epoch_gauge(gauge, epoch, &self.pool, &mut self.tokens)
    }

    pub fn commit(
        &mut self,
        voter: &Address,
        gauge: &Address,
    ) -> Result<CommitOutcome, VotingError> {
        self.engine.commit(voter, gauge)
    }

    /// Snapshot the voter, then create the epoch gauge and commit for each
    /// listed gauge.
    pub fn vote_epoch(&mut self, voter: &Address, gauges: &[Address]) -> Result<u64, VotingError> {
        self.snapshot(voter)?;
        let mut allocated = 0u64;
        for gauge in gauges {
            self.ensure_epoch_gauge(gauge)?;
            if let CommitOutcome::Committed { allocated: a } = self.commit(voter, gauge)? {
                allocated = allocated.checked_add(a).ok_or(VotingError::Overflow)?;
            }
        }
        Ok(allocated)
    }

    pub fn revert(&mut self, voter: &Address, gauge: &Address) -> Result<u64, VotingError> {
        let authority = self.delegate_of(voter);
        let epoch = self.engine.current_epoch();
        self.engine
            .revert(&authority, voter, gauge, epoch, &self.escrow)
    }

    pub fn close(
        &mut self,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
    ) -> Result<u64, VotingError> {
        let authority = self.delegate_of(voter);
        self.engine
            .close(&authority, voter, gauge, epoch, &self.escrow)
    }

    pub fn claim_fee(
        &mut self,
        voter: &Address,
        gauge: &Address,
        epoch: EpochIndex,
        side: FeeSide,
    ) -> Result<u64, VotingError> {
        let authority = self.delegate_of(voter);
        self.engine.claim_fee(
            &authority,
            voter,
            gauge,
            epoch,
            side,
            &self.escrow,
            &mut self.tokens,
        )
    }

    pub fn create_bribe(
        &mut self,
        briber: &Address,
        gauge: &Address,
        mint: &Address,
        reward_per_epoch: u64,
        epoch_end: EpochIndex,
    ) -> Result<u64, VotingError> {
        self.engine
            .create_bribe(briber, gauge, mint, reward_per_epoch, epoch_end, &mut self.tokens)
    }

    pub fn claim_bribe(
        &mut self,
        voter: &Address,
        bribe: u64,
        epoch: EpochIndex,
    ) -> Result<u64, VotingError> {
        let authority = self.delegate_of(voter);
        self.engine
            .claim_bribe(&authority, voter, bribe, epoch, &self.escrow, &mut self.tokens)
    }

    pub fn clawback_bribe(
        &mut self,
        briber: &Address,
        bribe: u64,
        epoch: EpochIndex,
    ) -> Result<u64, VotingError> {
        self.engine
            .clawback_bribe(briber, bribe, epoch, &mut self.tokens)
    }

    pub fn clean_empty_epoch_gauge(
        &mut self,
        gauge: &Address,
        epoch: EpochIndex,
    ) -> Result<(), VotingError> {
        self.engine.clean_empty_epoch_gauge(gauge, epoch)
    }

    pub fn sync_gauge(&mut self, gauge: &Address) -> Result<u64, VotingError> {
        self.engine.sync_gauge(gauge, &mut self.sink)
    }

    pub fn sync_disabled_gauge(&mut self, gauge: &Address) -> Result<(), VotingError> {
        self.engine.sync_disabled_gauge(gauge, &mut self.sink)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.engine.check_invariants(&self.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: &str) -> Address {
        Address::derive(&[tag.as_bytes()])
    }

    #[test]
    fn single_voter_full_cycle() {
        let params = FactoryParams::new(3, Timestamp::new(0));
        let mut world = NullWorld::new(addr("foreman"), &params).unwrap();
        let gauge = addr("pool-1");
        let voter = addr("alice");
        world.add_gauge(gauge, [addr("usdc"), addr("sol")]).unwrap();
        world.lock(voter, 1_000);
        world.set_vote(&voter, &gauge, 1).unwrap();
        world.next_epoch().unwrap();

        world.accrue_fees(&gauge, FeeSide::A, 90).unwrap();
        assert_eq!(world.vote_epoch(&voter, &[gauge]).unwrap(), 1_000);
        let epoch = world.current_epoch();
        world.next_epoch().unwrap();

        assert_eq!(world.claim_fee(&voter, &gauge, epoch, FeeSide::A).unwrap(), 90);
        assert_eq!(world.balance(&addr("usdc"), &voter), 90);
        world.check_invariants().unwrap();
    }
}

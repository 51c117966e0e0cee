//! Gauge registry: enablement flags and cumulative fee counters.

use crate::error::VotingError;
use gauge_types::{Address, FeeSide};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fee accounting for one token side of a gauge.
///
/// `cumulative_accrued == vault_balance + cumulative_claimed` at all times:
/// fees enter the vault in the same operation that bumps `cumulative_accrued`
/// and leave it in the same operation that bumps `cumulative_claimed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCounter {
    /// Token the fees are paid in.
    pub mint: Address,
    pub cumulative_accrued: u64,
    pub cumulative_claimed: u64,
    /// Pool counter observed when the last epoch gauge was created.
    pub last_pool_total: u64,
    /// Fees of empty epochs whose epoch gauge has been cleaned up.
    pub pruned_accrued: u64,
}

impl FeeCounter {
    fn new(mint: Address, pool_total: u64) -> Self {
        Self {
            mint,
            cumulative_accrued: 0,
            cumulative_claimed: 0,
            last_pool_total: pool_total,
            pruned_accrued: 0,
        }
    }

    /// Fees owed to the vault but not yet paid out.
    pub fn outstanding(&self) -> u64 {
        self.cumulative_accrued.saturating_sub(self.cumulative_claimed)
    }
}

/// A votable reward-share destination, keyed by its target address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    pub target: Address,
    pub enabled: bool,
    pub fees: [FeeCounter; 2],
}

impl Gauge {
    pub fn fee(&self, side: FeeSide) -> &FeeCounter {
        &self.fees[side.index()]
    }

    pub fn fee_mut(&mut self, side: FeeSide) -> &mut FeeCounter {
        &mut self.fees[side.index()]
    }

    /// Account holding this gauge's captured, unclaimed fees for `side`.
    pub fn fee_vault(&self, side: FeeSide) -> Address {
        fee_vault_address(&self.target, side)
    }

    pub fn require_enabled(&self) -> Result<(), VotingError> {
        if !self.enabled {
            return Err(VotingError::GaugeDisabled(self.target));
        }
        Ok(())
    }
}

pub fn fee_vault_address(target: &Address, side: FeeSide) -> Address {
    Address::derive(&[b"fee-vault", target.as_bytes(), side.as_str().as_bytes()])
}

/// All gauges of a factory.
#[derive(Clone, Debug, Default)]
pub struct GaugeRegistry {
    gauges: HashMap<Address, Gauge>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new gauge. It starts disabled; `pool_totals` seeds the fee
    /// baseline so fees accrued before creation are never attributed to it.
    pub fn create(
        &mut self,
        target: Address,
        fee_mints: [Address; 2],
        pool_totals: [u64; 2],
    ) -> Result<&Gauge, VotingError> {
        if self.gauges.contains_key(&target) {
            return Err(VotingError::GaugeExists(target));
        }
        let gauge = Gauge {
            target,
            enabled: false,
            fees: [
                FeeCounter::new(fee_mints[0], pool_totals[0]),
                FeeCounter::new(fee_mints[1], pool_totals[1]),
            ],
        };
        let gauge = self.gauges.entry(target).or_insert(gauge);
        Ok(&*gauge)
    }

    pub fn get(&self, target: &Address) -> Result<&Gauge, VotingError> {
        self.gauges
            .get(target)
            .ok_or(VotingError::GaugeNotFound(*target))
    }

    pub fn get_mut(&mut self, target: &Address) -> Result<&mut Gauge, VotingError> {
        self.gauges
            .get_mut(target)
            .ok_or(VotingError::GaugeNotFound(*target))
    }

    /// Set the enabled flag. Returns whether it changed.
    pub fn set_enabled(&mut self, target: &Address, enabled: bool) -> Result<bool, VotingError> {
        let gauge = self.get_mut(target)?;
        let changed = gauge.enabled != enabled;
        gauge.enabled = enabled;
        Ok(changed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gauge> {
        self.gauges.values()
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Insert a previously persisted gauge.
    pub(crate) fn restore(&mut self, gauge: Gauge) {
        self.gauges.insert(gauge.target, gauge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: &str) -> Address {
        Address::derive(&[tag.as_bytes()])
    }

    #[test]
    fn new_gauge_starts_disabled_with_pool_baseline() {
        let mut reg = GaugeRegistry::new();
        let g = reg
            .create(addr("pool-1"), [addr("usdc"), addr("sol")], [500, 7])
            .unwrap();
        assert!(!g.enabled);
        assert_eq!(g.fee(FeeSide::A).last_pool_total, 500);
        assert_eq!(g.fee(FeeSide::B).last_pool_total, 7);
        assert_eq!(g.fee(FeeSide::B).mint, addr("sol"));
        assert_eq!(g.fee(FeeSide::A).cumulative_accrued, 0);
    }

    #[test]
    fn duplicate_gauge_rejected() {
        let mut reg = GaugeRegistry::new();
        reg.create(addr("pool-1"), [addr("a"), addr("b")], [0, 0]).unwrap();
        let result = reg.create(addr("pool-1"), [addr("a"), addr("b")], [0, 0]);
        assert!(matches!(result, Err(VotingError::GaugeExists(_))));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn enable_disable_reports_change() {
        let mut reg = GaugeRegistry::new();
        let target = addr("pool-1");
        reg.create(target, [addr("a"), addr("b")], [0, 0]).unwrap();
        assert!(reg.set_enabled(&target, true).unwrap());
        assert!(!reg.set_enabled(&target, true).unwrap());
        reg.get(&target).unwrap().require_enabled().unwrap();
        assert!(reg.set_enabled(&target, false).unwrap());
        assert!(matches!(
            reg.get(&target).unwrap().require_enabled(),
            Err(VotingError::GaugeDisabled(_))
        ));
    }

    #[test]
    fn unknown_gauge_not_found() {
        let mut reg = GaugeRegistry::new();
        assert!(matches!(
            reg.set_enabled(&addr("missing"), true),
            Err(VotingError::GaugeNotFound(_))
        ));
    }

    #[test]
    fn fee_vaults_are_per_side() {
        let mut reg = GaugeRegistry::new();
        let target = addr("pool-1");
        let g = reg.create(target, [addr("a"), addr("b")], [0, 0]).unwrap();
        assert_ne!(g.fee_vault(FeeSide::A), g.fee_vault(FeeSide::B));
        assert_eq!(g.fee_vault(FeeSide::A), fee_vault_address(&target, FeeSide::A));
    }
}

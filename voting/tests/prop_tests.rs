use proptest::prelude::*;

use gauge_nullables::NullWorld;
use gauge_voting::{fee_vault_address, Bribe};
use gauge_types::{Address, EpochIndex, FactoryParams, FeeSide, Timestamp};

fn addr(n: u8) -> Address {
    Address::new([n; 32])
}

fn usdc() -> Address {
    Address::derive(&[b"usdc"])
}

fn sol() -> Address {
    Address::derive(&[b"sol"])
}

fn world(gauges: u8) -> NullWorld {
    let params = FactoryParams::new(10, Timestamp::new(0));
    let mut w = NullWorld::new(addr(200), &params).unwrap();
    for g in 0..gauges {
        w.add_gauge(addr(100 + g), [usdc(), sol()]).unwrap();
    }
    w
}

proptest! {
    /// Floor rounding leaves at most one unit of dust per claimant beyond the first.
    #[test]
    fn fee_dust_bounded_by_claimants(
        powers in prop::collection::vec(1u64..1_000_000_000, 1..8),
        fees in 0u64..1_000_000_000_000,
    ) {
        let mut w = world(1);
        let gauge = addr(100);
        for (i, power) in powers.iter().enumerate() {
            let voter = addr(i as u8 + 1);
            w.lock(voter, *power);
            w.set_vote(&voter, &gauge, 1).unwrap();
        }
        w.accrue_fees(&gauge, FeeSide::A, fees).unwrap();
        for i in 0..powers.len() {
            w.vote_epoch(&addr(i as u8 + 1), &[gauge]).unwrap();
        }
        w.next_epoch().unwrap();

        let mut paid = 0u64;
        for i in 0..powers.len() {
            paid += w.claim_fee(&addr(i as u8 + 1), &gauge, 1, FeeSide::A).unwrap();
        }
        prop_assert!(paid <= fees);
        let dust = fees - paid;
        prop_assert!(dust < powers.len() as u64, "dust {} for {} claimants", dust, powers.len());
        prop_assert!(w.check_invariants().is_ok());
    }

    /// Allocations across gauges never exceed the snapshot's voting power.
    #[test]
    fn allocation_never_exceeds_power(
        power in 0u64..u64::MAX / 2,
        weights in prop::collection::vec(0u32..u32::MAX, 1..4),
    ) {
        let mut w = world(weights.len() as u8);
        let voter = addr(1);
        w.lock(voter, power);
        let gauges: Vec<Address> = (0..weights.len() as u8).map(|g| addr(100 + g)).collect();
        for (gauge, weight) in gauges.iter().zip(&weights) {
            w.set_vote(&voter, gauge, *weight).unwrap();
        }
        let allocated = w.vote_epoch(&voter, &gauges).unwrap();
        prop_assert!(allocated <= power);
        prop_assert!(w.check_invariants().is_ok());
    }
}

#[derive(Clone, Debug)]
enum Op {
    SetVote { voter: u8, gauge: u8, weight: u32 },
    Snapshot { voter: u8 },
    Reset { voter: u8 },
    Ensure { gauge: u8 },
    Commit { voter: u8, gauge: u8 },
    Revert { voter: u8, gauge: u8 },
    Close { voter: u8, gauge: u8, back: u32 },
    Accrue { gauge: u8, side: bool, amount: u64 },
    NextEpoch,
    ClaimFee { voter: u8, gauge: u8, back: u32, side: bool },
    Clean { gauge: u8, back: u32 },
    CreateBribe { gauge: u8, reward: u64, len: u32 },
    ClaimBribe { voter: u8, bribe: u64, back: u32 },
    Clawback { bribe: u64, back: u32 },
    Toggle { gauge: u8, enabled: bool },
}

fn side(a: bool) -> FeeSide {
    if a {
        FeeSide::A
    } else {
        FeeSide::B
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 0u8..2, 0u32..10)
            .prop_map(|(voter, gauge, weight)| Op::SetVote { voter, gauge, weight }),
        (0u8..3).prop_map(|voter| Op::Snapshot { voter }),
        (0u8..3).prop_map(|voter| Op::Reset { voter }),
        (0u8..2).prop_map(|gauge| Op::Ensure { gauge }),
        (0u8..3, 0u8..2).prop_map(|(voter, gauge)| Op::Commit { voter, gauge }),
        (0u8..3, 0u8..2).prop_map(|(voter, gauge)| Op::Revert { voter, gauge }),
        (0u8..3, 0u8..2, 1u32..3).prop_map(|(voter, gauge, back)| Op::Close { voter, gauge, back }),
        (0u8..2, any::<bool>(), 0u64..10_000)
            .prop_map(|(gauge, side, amount)| Op::Accrue { gauge, side, amount }),
        Just(Op::NextEpoch),
        (0u8..3, 0u8..2, 1u32..3, any::<bool>())
            .prop_map(|(voter, gauge, back, side)| Op::ClaimFee { voter, gauge, back, side }),
        (0u8..2, 1u32..3).prop_map(|(gauge, back)| Op::Clean { gauge, back }),
        (0u8..2, 1u64..1_000, 1u32..4)
            .prop_map(|(gauge, reward, len)| Op::CreateBribe { gauge, reward, len }),
        (0u8..3, 0u64..3, 1u32..3)
            .prop_map(|(voter, bribe, back)| Op::ClaimBribe { voter, bribe, back }),
        (0u64..3, 1u32..3).prop_map(|(bribe, back)| Op::Clawback { bribe, back }),
        (0u8..2, any::<bool>()).prop_map(|(gauge, enabled)| Op::Toggle { gauge, enabled }),
    ]
}

fn apply(w: &mut NullWorld, op: &Op) {
    let voter = |v: u8| addr(v + 1);
    let gauge = |g: u8| addr(100 + g);
    let current = w.current_epoch();
    let past = |back: u32| current.saturating_sub(back);
    let briber = addr(50);
    let foreman = addr(200);
    // Failures are expected and must leave no trace; only invariants matter.
    let _ = match *op {
        Op::SetVote { voter: v, gauge: g, weight } => {
            w.set_vote(&voter(v), &gauge(g), weight).map(|_| ())
        }
        Op::Snapshot { voter: v } => w.snapshot(&voter(v)).map(|_| ()),
        Op::Reset { voter: v } => w.reset(&voter(v)),
        Op::Ensure { gauge: g } => w.ensure_epoch_gauge(&gauge(g)).map(|_| ()),
        Op::Commit { voter: v, gauge: g } => w.commit(&voter(v), &gauge(g)).map(|_| ()),
        Op::Revert { voter: v, gauge: g } => w.revert(&voter(v), &gauge(g)).map(|_| ()),
        Op::Close { voter: v, gauge: g, back } => {
            let epoch = past(back);
            w.close(&voter(v), &gauge(g), epoch).map(|_| ())
        }
        Op::Accrue { gauge: g, side: s, amount } => w.accrue_fees(&gauge(g), side(s), amount),
        Op::NextEpoch => w.next_epoch().map(|_| ()),
        Op::ClaimFee { voter: v, gauge: g, back, side: s } => {
            let epoch = past(back);
            w.claim_fee(&voter(v), &gauge(g), epoch, side(s)).map(|_| ())
        }
        Op::Clean { gauge: g, back } => {
            let epoch = past(back);
            w.clean_empty_epoch_gauge(&gauge(g), epoch)
        }
        Op::CreateBribe { gauge: g, reward, len } => {
            let end = w.current_epoch() + len;
            w.fund(&usdc(), &briber, reward * len as u64)
                .and_then(|_| w.create_bribe(&briber, &gauge(g), &usdc(), reward, end).map(|_| ()))
        }
        Op::ClaimBribe { voter: v, bribe, back } => {
            let epoch = past(back);
            w.claim_bribe(&voter(v), bribe, epoch).map(|_| ())
        }
        Op::Clawback { bribe, back } => {
            let epoch = past(back);
            w.clawback_bribe(&briber, bribe, epoch).map(|_| ())
        }
        Op::Toggle { gauge: g, enabled } => {
            if enabled {
                w.engine.enable_gauge(&foreman, &gauge(g)).map(|_| ())
            } else {
                w.engine.disable_gauge(&foreman, &gauge(g)).map(|_| ())
            }
        }
    };
}

/// After the clock moves past every epoch touched, run every claim and
/// clawback there is. Errors are ignored; what can be paid is paid.
fn settle_everything(w: &mut NullWorld) {
    let _ = w.next_epoch();
    let current = w.current_epoch();
    let voters: Vec<Address> = (1..=3u8).map(addr).collect();
    let bribes: Vec<Bribe> = w.engine.bribes().bribes().cloned().collect();
    for bribe in &bribes {
        for epoch in bribe.epoch_start..bribe.epoch_end.min(current) {
            let _ = w.clawback_bribe(&bribe.briber, bribe.id, epoch);
            for v in &voters {
                let _ = w.claim_bribe(v, bribe.id, epoch);
            }
        }
    }
    let elapsed: Vec<(Address, EpochIndex)> = w
        .engine
        .epochs()
        .epoch_gauges()
        .filter(|eg| eg.epoch < current)
        .map(|eg| (eg.gauge, eg.epoch))
        .collect();
    for (g, epoch) in elapsed {
        for v in &voters {
            for side in FeeSide::ALL {
                let _ = w.claim_fee(v, &g, epoch, side);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No sequence of operations, successful or failing, breaks conservation.
    #[test]
    fn random_operations_preserve_invariants(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut w = world(2);
        for v in 0..3u8 {
            w.lock(addr(v + 1), 1_000 * (v as u64 + 1));
        }
        for (i, op) in ops.iter().enumerate() {
            apply(&mut w, op);
            if let Err(violation) = w.check_invariants() {
                prop_assert!(false, "after op {} {:?}: {}", i, op, violation);
            }
        }
    }

    /// Whatever sequence ran, every elapsed bribe epoch ends paid to voters
    /// (up to rounding dust) or clawed back, and voted fees leave only dust.
    #[test]
    fn every_elapsed_epoch_can_settle(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut w = world(2);
        for v in 0..3u8 {
            w.lock(addr(v + 1), 1_000 * (v as u64 + 1));
        }
        for op in &ops {
            apply(&mut w, op);
        }
        settle_everything(&mut w);
        let current = w.current_epoch();

        let bribes = w.engine.bribes();
        for bribe in bribes.bribes() {
            for epoch in bribe.epoch_start..bribe.epoch_end.min(current) {
                if bribes.is_clawed_back(bribe.id, epoch) {
                    continue;
                }
                let paid: u64 = bribes
                    .claims()
                    .filter(|c| c.bribe == bribe.id && c.epoch == epoch)
                    .map(|c| c.amount)
                    .sum();
                prop_assert!(
                    bribe.reward_per_epoch - paid < 3,
                    "bribe {} epoch {} paid {} of {}",
                    bribe.id,
                    epoch,
                    paid,
                    bribe.reward_per_epoch
                );
            }
        }

        for g in 0..2u8 {
            let target = addr(100 + g);
            let gauge = w.engine.gauge(&target).unwrap();
            for side in FeeSide::ALL {
                // Fees with nobody to pay (unvoted or still open) may stay;
                // voted, elapsed epochs leave at most two units each.
                let mut allowed = gauge.fee(side).pruned_accrued;
                let epoch_gauges = w.engine.epochs().epoch_gauges();
                for eg in epoch_gauges.filter(|eg| eg.gauge == target) {
                    allowed += if eg.total_power == 0 || eg.epoch >= current {
                        eg.accrued_fee(side)
                    } else {
                        2
                    };
                }
                let vault = w.balance(&gauge.fee(side).mint, &fee_vault_address(&target, side));
                prop_assert!(
                    vault <= allowed,
                    "gauge {} side {}: {} left, {} allowed",
                    g,
                    side,
                    vault,
                    allowed
                );
            }
        }
        prop_assert!(w.check_invariants().is_ok());
    }
}

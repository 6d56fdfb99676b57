//! Property-based tests for the feeding-line core.
//!
//! Uses proptest to generate random configurations and tick schedules,
//! then verifies the structural invariants of the line hold.

use feedline_core::config::{DistributionLogic, SimConfig};
use feedline_core::engine::Engine;
use feedline_core::fixed::{Fixed64, REF_TICK_MS};
use feedline_core::path::{SOURCE_X, TAKE_POINT_X, UNIT_SPACING};
use feedline_core::source::{update_state_machine, SourceState};
use feedline_core::state::SimState;
use feedline_core::step::run_step;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Generate a random valid configuration.
fn arb_config() -> impl Strategy<Value = SimConfig> {
    (
        prop_oneof![
            Just(DistributionLogic::RoundRobin),
            Just(DistributionLogic::Batch)
        ],
        10..=240u32,
        1..=6u32,
        0..=100u32,
        1..=20i32,
    )
        .prop_flat_map(|(logic, ppm, min_cap, prob_global, path_speed)| {
            ((min_cap + 1)..=12u32).prop_map(move |max_cap| SimConfig {
                logic,
                ppm,
                min_cap,
                max_cap,
                prob_global,
                path_speed: Fixed64::from_num(path_speed),
                ..SimConfig::default()
            })
        })
}

/// A schedule of tick sizes, each between 1 and 17 ms.
fn arb_tick_schedule(max_ticks: usize) -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(1..=17i32, 1..=max_ticks)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Determinism: identical (seed, config, tick schedule) triples
    /// produce bit-identical states.
    #[test]
    fn deterministic_replay(config in arb_config(), seed in any::<u64>(),
                            dts in arb_tick_schedule(500)) {
        let mut a = SimState::new(3, seed);
        let mut b = SimState::new(3, seed);
        for &dt in &dts {
            run_step(&mut a, &config, Fixed64::from_num(dt));
            run_step(&mut b, &config, Fixed64::from_num(dt));
        }
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a, b);
    }

    /// Spacing: no two units on a path ever sit closer than one unit
    /// spacing, and every unit stays between the source and take point.
    #[test]
    fn spacing_and_position_bounds(config in arb_config(), seed in any::<u64>()) {
        let mut s = SimState::new(3, seed);
        for _ in 0..2000 {
            run_step(&mut s, &config, REF_TICK_MS);
            for path in &s.paths {
                for pair in path.units.windows(2) {
                    prop_assert!(pair[1].position <= pair[0].position - UNIT_SPACING);
                }
                for unit in &path.units {
                    prop_assert!(unit.position >= SOURCE_X);
                    prop_assert!(unit.position <= TAKE_POINT_X);
                }
            }
        }
    }

    /// Lockstep: synchronised takes move the processed and missed
    /// counters of all paths together, so the counters stay equal
    /// across paths forever.
    #[test]
    fn take_counters_stay_in_lockstep(config in arb_config(), seed in any::<u64>()) {
        let mut s = SimState::new(3, seed);
        for _ in 0..3000 {
            run_step(&mut s, &config, REF_TICK_MS);
            let first = &s.paths[0];
            for path in &s.paths[1..] {
                prop_assert_eq!(path.processed_units, first.processed_units);
                prop_assert_eq!(path.missed_units, first.missed_units);
            }
        }
    }

    /// The purge reserve is bounded by its initial grant.
    #[test]
    fn purge_reserve_bounded(config in arb_config(), seed in any::<u64>()) {
        let mut s = SimState::new(3, seed);
        for _ in 0..3000 {
            run_step(&mut s, &config, REF_TICK_MS);
            prop_assert!(s.pending_after_stop <= 3);
        }
    }

    /// Snapshot round-trip mid-run: the restored engine continues in
    /// lockstep with the original.
    #[test]
    fn snapshot_round_trip_stays_in_sync(config in arb_config(), seed in any::<u64>()) {
        let mut engine = Engine::new(config, 3, seed).expect("generated config is valid");
        for _ in 0..500 {
            engine.step(REF_TICK_MS);
        }

        let data = engine.serialize().expect("serialize should succeed");
        let mut restored = Engine::deserialize(&data).expect("deserialize should succeed");

        for _ in 0..500 {
            engine.step(REF_TICK_MS);
            restored.step(REF_TICK_MS);
        }
        prop_assert_eq!(engine.state_hash(), restored.state_hash());
    }

    /// Source-machine totality: every demand sequence walks only the
    /// defined transition edges, so no input can strand the source in
    /// an unreachable or undefined state.
    #[test]
    fn source_machine_total_over_demand_sequences(
        seed in any::<u64>(),
        demand in proptest::collection::vec(any::<bool>(), 1..=400),
    ) {
        let mut s = SimState::new(3, seed);
        let mut now = Fixed64::ZERO;
        for &any_req in &demand {
            now += REF_TICK_MS;
            // Drain the purge reserve out-of-band so BUFFER_STOP can
            // complete without running the emitter.
            if s.pending_after_stop > 0 {
                s.pending_after_stop -= 1;
            }
            let before = s.source_state;
            update_state_machine(&mut s, now, any_req);
            let after = s.source_state;
            let allowed = match (before, after) {
                (a, b) if a == b => true,
                (SourceState::Idle, SourceState::Restart) => any_req,
                (SourceState::Restart, SourceState::Active) => any_req,
                (SourceState::Restart, SourceState::Idle) => !any_req,
                (SourceState::Active, SourceState::BufferStop) => !any_req,
                (SourceState::BufferStop, SourceState::Locked) => true,
                // The lock release may cascade straight into RESTART.
                (SourceState::Locked, SourceState::Idle) => !any_req,
                (SourceState::Locked, SourceState::Restart) => any_req,
                _ => false,
            };
            prop_assert!(
                allowed,
                "{:?} -> {:?} on any_req={}", before, after, any_req
            );
        }
    }

    /// The clock is exactly the sum of the tick schedule.
    #[test]
    fn clock_is_sum_of_ticks(config in arb_config(), seed in any::<u64>(),
                             dts in arb_tick_schedule(300)) {
        let mut s = SimState::new(3, seed);
        let mut expected = Fixed64::ZERO;
        for &dt in &dts {
            let dt = Fixed64::from_num(dt);
            run_step(&mut s, &config, dt);
            expected += dt;
        }
        prop_assert_eq!(s.elapsed, expected);
    }
}

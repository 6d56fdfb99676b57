//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::{DistributionLogic, SimConfig};
use crate::engine::Engine;
use crate::fixed::{Fixed64, Millis, REF_TICK_MS};
use crate::source::SourceState;
use crate::state::{SimState, DEFAULT_PATH_COUNT};
use crate::step::run_step;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Config constructors
// ===========================================================================

/// Default config with stochastic downtime disabled.
pub fn quiet_config() -> SimConfig {
    SimConfig {
        prob_global: 0,
        ..SimConfig::default()
    }
}

/// Deterministic round-robin config with a frozen belt: the source
/// emits on its rate gate but units never move, so sensors stay quiet
/// and requests stay latched.
pub fn frozen_belt_config(ppm: u32) -> SimConfig {
    SimConfig {
        ppm,
        logic: DistributionLogic::RoundRobin,
        prob_global: 0,
        path_speed: Fixed64::ZERO,
        ..SimConfig::default()
    }
}

// ===========================================================================
// State and engine constructors
// ===========================================================================

/// A three-path state with the source already armed.
pub fn active_state(seed: u64) -> SimState {
    let mut state = SimState::new(DEFAULT_PATH_COUNT, seed);
    state.source_state = SourceState::Active;
    state
}

/// Build an engine and run it for `duration_ms` at the reference tick.
pub fn run_engine_for(engine: &mut Engine, duration_ms: i64) {
    let steps = (Fixed64::from_num(duration_ms) / REF_TICK_MS)
        .ceil()
        .to_num::<i64>();
    for _ in 0..steps {
        engine.step(REF_TICK_MS);
    }
}

/// Drive a raw state for `duration_ms` at the reference tick.
pub fn run_state_for(state: &mut SimState, config: &SimConfig, duration_ms: i64) {
    let steps = (Fixed64::from_num(duration_ms) / REF_TICK_MS)
        .ceil()
        .to_num::<i64>();
    for _ in 0..steps {
        run_step(state, config, REF_TICK_MS);
    }
}

/// Step a state `n` times with a caller-chosen tick.
pub fn run_state_steps(state: &mut SimState, config: &SimConfig, n: usize, dt: Millis) {
    for _ in 0..n {
        run_step(state, config, dt);
    }
}

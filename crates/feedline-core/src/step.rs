//! The simulation step: advances the whole line by one tick.
//!
//! # Five-Phase Tick Pipeline
//!
//! Each call to [`run_step`] advances simulated time by `dt` through:
//!
//! 1. **Downtime** -- update the global outage window (stochastic).
//! 2. **Takes** -- evaluate the synchronized take cycle for all paths.
//! 3. **Paths** -- advance unit motion, recompute debounced sensors,
//!    derive the request flag, fold downtime accounting.
//! 4. **Source** -- run the source state machine on the aggregate
//!    request signal.
//! 5. **Emission** -- if the rate gate is open, pick a target via the
//!    distribution policy and append a unit (or consume an empty-nest
//!    slot, or drain the purge reserve).
//!
//! The step is a pure function of (state, config, dt): single-threaded,
//! runs to completion, and touches nothing outside the state it is
//! given. Callers wanting time scaling subdivide larger deltas through
//! [`Engine::advance`](crate::engine::Engine::advance); the step itself
//! assumes `dt` is small relative to the 500 ms sensor debounce and the
//! 4.7 s take cycle.

use crate::config::SimConfig;
use crate::downtime;
use crate::fixed::{Millis, REF_TICK_MS};
use crate::path::sensor_x;
use crate::source;
use crate::state::SimState;
use crate::take;

/// Advance the line by `dt` milliseconds, mutating `state` in place.
///
/// The configuration must satisfy [`SimConfig::validate`]; behavior is
/// unspecified otherwise (contract precondition, not a recovered error).
pub fn run_step(state: &mut SimState, config: &SimConfig, dt: Millis) {
    state.elapsed += dt;
    let now = state.elapsed;

    // Phase 1: global outage window.
    downtime::update(state, config, now, dt);

    // Phase 2: synchronized takes.
    take::run_takes(state, now);

    // Phase 3: per-path motion, sensors, request flag, downtime clock.
    let dt_ratio = dt / REF_TICK_MS;
    let min_x = sensor_x(config.min_cap);
    let max_x = sensor_x(config.max_cap);
    for path in &mut state.paths {
        path.advance_units(config.path_speed, dt_ratio);
        path.update_sensors(now, min_x, max_x);
        path.update_request(now);
        path.update_downtime_clock(now);
    }

    // Phases 4 and 5: source state machine, then emission. Both see the
    // same aggregate request signal sampled once after the path phase.
    let any_req = state.any_request();
    source::update_state_machine(state, now, any_req);
    source::run_emission(state, config, now, any_req);
}

// ===========================================================================
// Tests
// ===========================================================================

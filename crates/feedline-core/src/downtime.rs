//! Stochastic global-outage model.
//!
//! Each tick, while no outage is active and the knob is non-zero, a
//! Bernoulli trial decides whether a fixed-length outage window opens.
//! The per-tick probability scales linearly with the configured knob and
//! with the tick length, calibrated against the 16.67 ms reference tick,
//! so the expected outage frequency is independent of step size.

use crate::config::SimConfig;
use crate::fixed::{fx, Fixed64, Millis, REF_TICK_MS};
use crate::state::SimState;

/// Fixed duration of one outage window.
pub const DOWNTIME_MS: Millis = fx(10_000);

/// Base per-reference-tick trial probability at knob value 20.
const BASE_PROBABILITY: f64 = 0.0004;

/// Update the outage window for this tick.
///
/// Draws from the state-owned RNG, so runs with equal seeds see equal
/// outage schedules.
pub fn update(s: &mut SimState, config: &SimConfig, now: Millis, dt: Millis) {
    if !s.global_downtime && config.prob_global > 0 {
        let p = Fixed64::from_num(BASE_PROBABILITY) * (dt / REF_TICK_MS)
            * (Fixed64::from_num(config.prob_global) / fx(20));
        if s.rng.chance(p) {
            s.global_downtime = true;
            s.global_downtime_until = now + DOWNTIME_MS;
        }
    } else if now > s.global_downtime_until {
        s.global_downtime = false;
    }
}

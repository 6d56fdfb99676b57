//! The synchronized take scheduler.
//!
//! A single global cadence governs when lead units are consumed: once
//! any path's last take is older than the cycle time, an evaluation
//! fires for ALL paths simultaneously. The contract is strict lockstep
//! and all-or-nothing: one non-ready path forces every path to miss
//! the cycle.

use crate::fixed::{fx, Fixed64, Millis};
use crate::state::SimState;

/// Fixed take cadence.
pub const TAKE_CYCLE_MS: Millis = fx(4700);

/// Run the synchronized take evaluation if the cycle is due.
///
/// Outcomes, applied identically to every path:
/// - all ready, no outage: pop the lead unit, `processed_units += 1`,
///   clear `is_down` and starvation;
/// - not all ready, no outage: `missed_units += 1` and flag starvation
///   for half a cycle;
/// - outage: mark `is_down`, clear starvation, leave both counters
///   untouched.
///
/// `last_take_time` is stamped on every path regardless of outcome.
pub fn run_takes(s: &mut SimState, now: Millis) {
    let due = s
        .paths
        .iter()
        .any(|p| now - p.last_take_time > TAKE_CYCLE_MS);
    if !due {
        return;
    }

    let all_ready = s.paths.iter().all(|p| p.lead_ready());
    let blocked = s.global_downtime;

    for path in &mut s.paths {
        if !blocked {
            if all_ready {
                if !path.units.is_empty() {
                    path.units.remove(0);
                }
                path.processed_units += 1;
                path.is_down = false;
                path.starvation_until = Fixed64::ZERO;
            } else {
                path.missed_units += 1;
                path.starvation_until = now + TAKE_CYCLE_MS / fx(2);
            }
        } else {
            path.is_down = true;
            path.starvation_until = Fixed64::ZERO;
        }
        path.last_take_time = now;
    }
}

// ===========================================================================
// Tests
// ===========================================================================

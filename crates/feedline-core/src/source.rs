//! The source controller: operational state machine, distribution
//! policies, and unit emission.
//!
//! The source cycles IDLE → RESTART → ACTIVE → BUFFER_STOP → LOCKED →
//! IDLE, edge-triggered on the aggregate "any path requesting material"
//! signal. While ACTIVE it emits one unit per `60000 / ppm` ms to the
//! path chosen by the configured [`DistributionLogic`]; while in
//! BUFFER_STOP it flushes a fixed reserve of purge units to the last
//! active path, bypassing the policy.

use crate::config::{DistributionLogic, SimConfig};
use crate::fixed::{fx, Fixed64, Millis};
use crate::path::SOURCE_X;
use crate::state::SimState;
use crate::unit::Unit;

// ---------------------------------------------------------------------------
// Timing and reserve constants
// ---------------------------------------------------------------------------

/// How long the source stays LOCKED before returning to IDLE.
pub const LOCK_HOLD_MS: Millis = fx(4000);

/// How long RESTART dwells before committing to ACTIVE.
pub const RESTART_DELAY_MS: Millis = fx(2000);

/// Purge units owed after demand disappears (buffer stop).
pub const PURGE_RESERVE: u32 = 3;

/// Every `EMPTY_NEST_PERIOD`-th eligible emission slot is skipped,
/// modeling a periodic missing unit in the physical feed mechanism.
pub const EMPTY_NEST_PERIOD: u32 = 8;

// ---------------------------------------------------------------------------
// Source state
// ---------------------------------------------------------------------------

/// Operational state of the source controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SourceState {
    /// Waiting for demand. Initial state.
    Idle,
    /// Demand detected; dwelling before going active.
    Restart,
    /// Emitting units to requesting paths.
    Active,
    /// Demand gone; flushing the purge reserve before locking.
    BufferStop,
    /// Locked out for a fixed hold time after a completed buffer stop.
    Locked,
}

/// Apply one tick of state-machine transitions.
///
/// The match is exhaustive over state x input, so every `any_req`
/// sequence yields a defined next state. A LOCKED → IDLE → RESTART
/// cascade within a single tick is intentional: the moment the lock
/// expires, pending demand immediately re-arms the source.
pub fn update_state_machine(s: &mut SimState, now: Millis, any_req: bool) {
    match s.source_state {
        SourceState::Active if !any_req => {
            s.source_state = SourceState::BufferStop;
            s.pending_after_stop = PURGE_RESERVE;
        }
        SourceState::BufferStop if s.pending_after_stop == 0 => {
            s.source_state = SourceState::Locked;
            s.lock_start_time = now;
            s.source_stops += 1;
        }
        SourceState::Locked if now - s.lock_start_time > LOCK_HOLD_MS => {
            s.source_state = SourceState::Idle;
        }
        _ => {}
    }

    if s.source_state == SourceState::Idle && any_req {
        s.source_state = SourceState::Restart;
        s.restart_start_time = now;
        s.units_since_restart = 0;
    }

    if s.source_state == SourceState::Restart && now - s.restart_start_time > RESTART_DELAY_MS {
        s.source_state = if any_req {
            SourceState::Active
        } else {
            SourceState::Idle
        };
    }
}

// ---------------------------------------------------------------------------
// Distribution policies
// ---------------------------------------------------------------------------

/// Pick the path to receive the next unit, per the active policy.
///
/// Runs whenever an emission slot is open, regardless of source state;
/// the Batch lock bookkeeping (acquire/release) advances even while the
/// source is idle or locked.
pub fn select_target(s: &mut SimState, config: &SimConfig, any_req: bool) -> Option<usize> {
    match config.logic {
        DistributionLogic::Batch => {
            // Release the lock once the locked path stops requesting.
            if let Some(id) = s.active_target {
                if !s.paths[id].request_material {
                    s.active_target = None;
                }
            }
            if s.active_target.is_none() && any_req {
                let mut stamped: Vec<(Millis, usize)> = s
                    .paths
                    .iter()
                    .filter(|p| p.request_material && p.request_start_time > Fixed64::ZERO)
                    .map(|p| (p.request_start_time, p.id))
                    .collect();
                if stamped.is_empty() {
                    // No recorded start times: first requester by id.
                    s.active_target = s
                        .paths
                        .iter()
                        .find(|p| p.request_material)
                        .map(|p| p.id);
                } else {
                    // Oldest request wins; the stable sort keeps the
                    // lowest id in front on equal timestamps.
                    stamped.sort_by_key(|&(since, _)| since);
                    s.active_target = Some(stamped[0].1);
                }
            }
            s.active_target
        }
        DistributionLogic::RoundRobin => {
            let n = s.paths.len();
            let start = s.last_distributed_id.map_or(0, |id| (id + 1) % n);
            (0..n)
                .map(|i| (start + i) % n)
                .find(|&id| s.paths[id].request_material)
        }
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

/// Emit at most one unit if the rate gate is open.
///
/// In ACTIVE with a valid target the slot either produces a unit at
/// [`SOURCE_X`] or, every [`EMPTY_NEST_PERIOD`]-th slot, is deliberately
/// skipped while still consuming the slot. In BUFFER_STOP the purge
/// reserve drains to the last active path. In the remaining states the
/// gate stays open (no timestamp update), so the first eligible tick
/// after re-arming emits immediately.
pub fn run_emission(s: &mut SimState, config: &SimConfig, now: Millis, any_req: bool) {
    if now - s.last_source_time <= config.ms_per_unit() {
        return;
    }

    let target = select_target(s, config, any_req);

    match s.source_state {
        SourceState::Active => {
            let Some(tid) = target else { return };
            s.units_since_restart += 1;
            if s.units_since_restart % EMPTY_NEST_PERIOD == 0 {
                // Empty nest: the slot is consumed but no unit appears.
                s.last_source_time = now;
            } else {
                s.paths[tid].units.push(Unit::new(SOURCE_X));
                s.last_distributed_id = Some(tid);
                s.last_active_path_id = tid;
                s.last_source_time = now;
                if config.logic == DistributionLogic::RoundRobin {
                    s.active_target = None;
                }
            }
        }
        SourceState::BufferStop if s.pending_after_stop > 0 => {
            let pid = s.last_active_path_id;
            s.paths[pid].units.push(Unit::purge(SOURCE_X));
            s.pending_after_stop -= 1;
            s.last_source_time = now;
        }
        _ => {}
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! The single mutable simulation state.
//!
//! Created once at initialization (or on explicit reset) with all paths
//! empty and the source idle; mutated exclusively by
//! [`step::run_step`](crate::step::run_step). Callers discard a run by
//! replacing the state with a fresh instance.

use crate::fixed::{Fixed64, Millis};
use crate::path::Path;
use crate::rng::SimRng;
use crate::source::SourceState;

/// Number of parallel paths in the reference line.
pub const DEFAULT_PATH_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Complete mutable state of the feeding line.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Monotonic simulated clock, milliseconds.
    pub elapsed: Millis,
    /// Source controller state.
    pub source_state: SourceState,
    /// Last time a unit was emitted (or an emission slot consumed).
    pub last_source_time: Millis,
    /// When the source entered LOCKED.
    pub lock_start_time: Millis,
    /// When the source entered RESTART.
    pub restart_start_time: Millis,
    /// Current locked target under the Batch policy.
    pub active_target: Option<usize>,
    /// Last path fed, for Round-Robin rotation. `None` until the first
    /// unit has been distributed, so rotation starts at path 0.
    pub last_distributed_id: Option<usize>,
    /// Forced purge emissions still owed after a buffer stop.
    pub pending_after_stop: u32,
    /// Path that receives purge units.
    pub last_active_path_id: usize,
    /// Units emitted since the source last restarted; drives the
    /// periodic empty-nest skip.
    pub units_since_restart: u32,
    /// Whether a global outage is active.
    pub global_downtime: bool,
    /// Timestamp at which the current outage clears.
    pub global_downtime_until: Millis,
    /// Number of completed buffer stops.
    pub source_stops: u64,
    /// The conveyor lanes. Fixed cardinality, created at initialization,
    /// never destroyed.
    pub paths: Vec<Path>,
    /// Outage-draw generator, seeded for reproducibility.
    pub rng: SimRng,
}

impl SimState {
    /// A fresh line with `path_count` empty paths and the source idle.
    pub fn new(path_count: usize, seed: u64) -> Self {
        Self {
            elapsed: Fixed64::ZERO,
            source_state: SourceState::Idle,
            last_source_time: Fixed64::ZERO,
            lock_start_time: Fixed64::ZERO,
            restart_start_time: Fixed64::ZERO,
            active_target: None,
            last_distributed_id: None,
            pending_after_stop: 0,
            last_active_path_id: 0,
            units_since_restart: 0,
            global_downtime: false,
            global_downtime_until: Fixed64::ZERO,
            source_stops: 0,
            paths: (0..path_count).map(Path::new).collect(),
            rng: SimRng::new(seed),
        }
    }

    /// True while any path requests material (the aggregate signal the
    /// source state machine triggers on).
    pub fn any_request(&self) -> bool {
        self.paths.iter().any(|p| p.request_material)
    }

    /// Total units taken across all paths.
    pub fn total_processed(&self) -> u64 {
        self.paths.iter().map(|p| p.processed_units).sum()
    }

    /// Total missed take cycles across all paths.
    pub fn total_missed(&self) -> u64 {
        self.paths.iter().map(|p| p.missed_units).sum()
    }

    /// Deterministic FNV-1a hash over every mutable field, for desync
    /// and determinism checks.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_fixed64(self.elapsed);
        h.write_u32(self.source_state as u32);
        h.write_fixed64(self.last_source_time);
        h.write_fixed64(self.lock_start_time);
        h.write_fixed64(self.restart_start_time);
        h.write_u64(match self.active_target {
            Some(id) => id as u64,
            None => u64::MAX,
        });
        h.write_u64(match self.last_distributed_id {
            Some(id) => id as u64,
            None => u64::MAX,
        });
        h.write_u32(self.pending_after_stop);
        h.write_u64(self.last_active_path_id as u64);
        h.write_u32(self.units_since_restart);
        h.write_u32(self.global_downtime as u32);
        h.write_fixed64(self.global_downtime_until);
        h.write_u64(self.source_stops);
        h.write_u64(self.rng.state());

        for path in &self.paths {
            h.write_u64(path.id as u64);
            h.write_u32(path.is_down as u32);
            h.write_fixed64(path.starvation_until);
            h.write_fixed64(path.last_take_time);
            h.write_fixed64(path.min_sensor_since);
            h.write_fixed64(path.max_sensor_since);
            h.write_u32(path.min_active as u32);
            h.write_u32(path.max_active as u32);
            h.write_u32(path.request_material as u32);
            h.write_fixed64(path.request_start_time);
            h.write_u64(path.processed_units);
            h.write_u64(path.missed_units);
            h.write_fixed64(path.total_downtime);
            h.write_fixed64(path.downtime_start);
            for unit in &path.units {
                h.write_fixed64(unit.position);
                h.write_u32(unit.is_purge as u32);
                h.write_u32(unit.is_moving as u32);
            }
        }
        h.finish()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed a u64 into the hash.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a u32 into the hash.
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a Fixed64 into the hash.
    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

//! Statistics module for the feeding-line simulation.
//!
//! Two facilities:
//!
//! - [`BatchRun`] runs a fresh, headless line at the reference tick for a
//!   fixed duration and reduces it to a [`BatchReport`] (stops, processed
//!   and missed units, per-path downtime).
//! - [`ThroughputTracker`] observes a live line tick by tick and keeps
//!   rolling per-path take rates using [`Fixed64`] arithmetic.

use feedline_core::config::SimConfig;
use feedline_core::fixed::{Fixed64, Millis, REF_TICK_MS};
use feedline_core::state::{SimState, DEFAULT_PATH_COUNT};
use feedline_core::step::run_step;

// ---------------------------------------------------------------------------
// Batch runs
// ---------------------------------------------------------------------------

/// A headless fast-forward run over a fresh line.
///
/// Mirrors what an operator does at the console: snapshot the current
/// parameters, run them against an empty line for a chosen duration, and
/// tabulate the outcome. The run always ticks at the 16.67 ms reference
/// step, ignoring the config's display speed, so a given (config, seed,
/// duration) triple is reproducible.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub config: SimConfig,
    pub duration_ms: Millis,
    pub seed: u64,
    pub path_count: usize,
}

impl BatchRun {
    pub fn new(config: SimConfig, duration_ms: Millis, seed: u64) -> Self {
        Self {
            config,
            duration_ms,
            seed,
            path_count: DEFAULT_PATH_COUNT,
        }
    }

    /// Execute the run and reduce the final state to a report.
    pub fn run(&self) -> BatchReport {
        let mut config = self.config.clone();
        config.speed = Fixed64::ONE;

        let mut state = SimState::new(self.path_count, self.seed);
        let steps = (self.duration_ms / REF_TICK_MS).ceil().to_num::<i64>();
        for _ in 0..steps {
            run_step(&mut state, &config, REF_TICK_MS);
        }

        BatchReport::from_state(&state, self.duration_ms)
    }
}

/// Aggregated outcome of a [`BatchRun`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub duration_ms: Millis,
    /// Buffer stops of the source over the run.
    pub source_stops: u64,
    /// Units removed by completed take cycles, summed over paths.
    pub total_processed: u64,
    /// Take cycles that fired without a full set, summed over paths.
    pub total_missed: u64,
    pub per_path: Vec<PathReport>,
}

/// Per-path slice of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathReport {
    pub path_id: usize,
    pub processed_units: u64,
    pub missed_units: u64,
    /// Accumulated outage time attributed to this path.
    pub downtime_ms: Millis,
}

impl BatchReport {
    fn from_state(state: &SimState, duration_ms: Millis) -> Self {
        Self {
            duration_ms,
            source_stops: state.source_stops,
            total_processed: state.total_processed(),
            total_missed: state.total_missed(),
            per_path: state
                .paths
                .iter()
                .map(|p| PathReport {
                    path_id: p.id,
                    processed_units: p.processed_units,
                    missed_units: p.missed_units,
                    downtime_ms: p.total_downtime,
                })
                .collect(),
        }
    }

    /// Fraction of take cycles that completed, over all paths.
    /// `ONE` when no cycle has fired yet.
    pub fn completion_ratio(&self) -> Fixed64 {
        let attempts = self.total_processed + self.total_missed;
        if attempts == 0 {
            return Fixed64::ONE;
        }
        Fixed64::from_num(self.total_processed) / Fixed64::from_num(attempts)
    }

    /// Fraction of the run a path spent outside downtime.
    /// Returns `None` for an unknown path id.
    pub fn availability(&self, path_id: usize) -> Option<Fixed64> {
        let path = self.per_path.iter().find(|p| p.path_id == path_id)?;
        if self.duration_ms <= Millis::ZERO {
            return Some(Fixed64::ONE);
        }
        let up = (self.duration_ms - path.downtime_ms).max(Millis::ZERO);
        Some(up / self.duration_ms)
    }
}

// ---------------------------------------------------------------------------
// Rolling throughput
// ---------------------------------------------------------------------------

/// A rolling window counter over the most recent N ticks.
///
/// Per-tick counts live in a ring buffer; `total` is the sum of the
/// committed ticks.
#[derive(Debug, Clone)]
struct RollingWindow {
    tick_counts: Vec<u64>,
    /// Write position for the next commit.
    write_pos: usize,
    committed_total: u64,
    window_size: usize,
    /// Number of committed ticks stored (capped at window_size).
    committed_count: usize,
}

impl RollingWindow {
    fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "RollingWindow size must be > 0");
        Self {
            tick_counts: vec![0; window_size],
            write_pos: 0,
            committed_total: 0,
            window_size,
            committed_count: 0,
        }
    }

    /// Commit one tick's count, evicting the oldest if at capacity.
    fn commit(&mut self, count: u64) {
        if self.committed_count == self.window_size {
            self.committed_total -= self.tick_counts[self.write_pos];
        }
        self.tick_counts[self.write_pos] = count;
        self.committed_total += count;
        self.write_pos = (self.write_pos + 1) % self.window_size;
        if self.committed_count < self.window_size {
            self.committed_count += 1;
        }
    }

    fn total(&self) -> u64 {
        self.committed_total
    }

    /// Rolling average as counts per tick.
    fn rate(&self) -> Fixed64 {
        if self.committed_count == 0 {
            return Fixed64::ZERO;
        }
        Fixed64::from_num(self.committed_total) / Fixed64::from_num(self.committed_count)
    }
}

/// Rolling per-path take rates for a live line.
///
/// Call [`observe`](Self::observe) once after every simulation step; the
/// tracker diffs the path counters against the previous observation, so
/// it never needs hooks inside the engine.
#[derive(Debug, Clone)]
pub struct ThroughputTracker {
    processed: Vec<RollingWindow>,
    missed: Vec<RollingWindow>,
    last_processed: Vec<u64>,
    last_missed: Vec<u64>,
}

impl ThroughputTracker {
    /// Track `path_count` paths with a rolling window of `window_size` ticks.
    pub fn new(path_count: usize, window_size: usize) -> Self {
        Self {
            processed: (0..path_count).map(|_| RollingWindow::new(window_size)).collect(),
            missed: (0..path_count).map(|_| RollingWindow::new(window_size)).collect(),
            last_processed: vec![0; path_count],
            last_missed: vec![0; path_count],
        }
    }

    /// Fold one post-step state into the windows.
    ///
    /// # Panics
    ///
    /// Panics if the state has a different path count than the tracker.
    pub fn observe(&mut self, state: &SimState) {
        assert_eq!(state.paths.len(), self.processed.len());
        for (i, path) in state.paths.iter().enumerate() {
            self.processed[i].commit(path.processed_units - self.last_processed[i]);
            self.missed[i].commit(path.missed_units - self.last_missed[i]);
            self.last_processed[i] = path.processed_units;
            self.last_missed[i] = path.missed_units;
        }
    }

    /// Takes completed by `path_id` within the window.
    pub fn processed_in_window(&self, path_id: usize) -> u64 {
        self.processed[path_id].total()
    }

    /// Takes missed by `path_id` within the window.
    pub fn missed_in_window(&self, path_id: usize) -> u64 {
        self.missed[path_id].total()
    }

    /// Rolling take rate of `path_id` in units per tick.
    pub fn take_rate(&self, path_id: usize) -> Fixed64 {
        self.processed[path_id].rate()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! Top-level engine wrapping a [`SimState`] and its [`SimConfig`].
//!
//! The engine is the embedding surface: hosts construct one, drive it
//! with [`Engine::step`] (raw ticks) or [`Engine::advance`] (wall-clock
//! frames with time scaling), and read results back through the state
//! accessor and the aggregate counters.

use crate::config::{ConfigError, SimConfig};
use crate::fixed::{Millis, REF_TICK_MS};
use crate::state::{SimState, DEFAULT_PATH_COUNT};
use crate::step::run_step;

/// A configured feeding-line simulation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Engine {
    config: SimConfig,
    state: SimState,
}

impl Engine {
    /// Create an engine with `path_count` paths and a seeded RNG.
    ///
    /// Fails if the configuration does not validate; an engine never
    /// runs on an invalid config.
    pub fn new(config: SimConfig, path_count: usize, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: SimState::new(path_count, seed),
        })
    }

    /// Create an engine with the standard three-path layout.
    pub fn with_defaults(seed: u64) -> Self {
        Self {
            config: SimConfig::default(),
            state: SimState::new(DEFAULT_PATH_COUNT, seed),
        }
    }

    /// Advance the simulation by exactly `dt` milliseconds of simulated
    /// time. No scaling, no subdivision.
    pub fn step(&mut self, dt: Millis) {
        run_step(&mut self.state, &self.config, dt);
    }

    /// Advance by one wall-clock frame of `frame_ms`, applying the
    /// configured time scale.
    ///
    /// The scaled delta is subdivided into sub-steps no larger than the
    /// 16.67 ms reference tick, so sensor debounce and take timing stay
    /// accurate at high speed multipliers.
    pub fn advance(&mut self, frame_ms: Millis) {
        let mut remaining = frame_ms * self.config.speed;
        while remaining > Millis::ZERO {
            let dt = remaining.min(REF_TICK_MS);
            run_step(&mut self.state, &self.config, dt);
            remaining -= dt;
        }
    }

    /// Replace the configuration mid-run. The state is untouched, so
    /// the line reacts to the new parameters from the next tick on.
    pub fn set_config(&mut self, config: SimConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Discard all line state and restart from tick zero with a fresh
    /// seed. The configuration is kept.
    pub fn reset(&mut self, seed: u64) {
        let path_count = self.state.paths.len();
        self.state = SimState::new(path_count, seed);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Mutable state access for hosts that stage scenarios directly.
    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    /// Order-sensitive hash of the full simulation state. Two engines
    /// with equal hashes are bit-identical.
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

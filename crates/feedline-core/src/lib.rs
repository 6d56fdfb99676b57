//! Feedline Core -- a deterministic simulation of a material feeding line.
//!
//! One source feeds three parallel conveyor paths. Units travel toward a
//! shared take point where synchronized take cycles remove the lead unit
//! from every path at once. Each path carries a debounced MIN/MAX sensor
//! pair that drives its request-for-material flag, and the source runs a
//! five-state machine (idle, restart, active, buffer stop, locked) over
//! the aggregate request signal. Distribution is round-robin or batch,
//! and a stochastic global downtime models line outages.
//!
//! All arithmetic is Q32.32 fixed-point and all randomness flows through
//! a seeded generator carried inside the state, so a (seed, config, tick
//! sequence) triple always reproduces the same line bit for bit.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Embedding surface: config plus state, frame
//!   advancement with time scaling.
//! - [`step::run_step`] -- The tick pipeline: downtime, takes, paths,
//!   source state machine, emission.
//! - [`state::SimState`] -- Full line state, hashable for determinism
//!   checks.
//! - [`path::Path`] -- A conveyor lane: units, sensors, request flag,
//!   counters.
//! - [`config::SimConfig`] -- Validated operator parameters.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`snapshot`] -- Versioned serialization and snapshot support via
//!   bitcode.

pub mod config;
pub mod downtime;
pub mod engine;
pub mod fixed;
pub mod path;
pub mod rng;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod step;
pub mod take;
pub mod unit;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
